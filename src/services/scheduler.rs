use crate::models::{InvocationContext, RunResponse, TriggerEvent};
use crate::services::job::ExportJob;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Fires the export job on a fixed period, one run at a time.
#[derive(Clone)]
pub struct SyncScheduler {
    job: Arc<ExportJob>,
    period: Duration,
}

impl SyncScheduler {
    pub fn new(job: Arc<ExportJob>, period: Duration) -> Self {
        Self { job, period }
    }

    /// Runs until `shutdown` resolves. The first run starts immediately.
    pub async fn start<F>(&self, shutdown: F)
    where
        F: std::future::Future<Output = ()>,
    {
        let mut ticker = interval(self.period);
        // A slow run pushes the next one back instead of stacking runs.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Starting DB sync scheduler: every {:?}", self.period);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler");
                    break;
                }
                _ = ticker.tick() => {
                    let response = self.trigger().await;
                    if !response.is_success() {
                        warn!("Scheduled run returned status {}", response.status_code);
                    }
                }
            }
        }
    }

    /// Run a single invocation (for manual triggering)
    pub async fn trigger(&self) -> RunResponse {
        let ctx = InvocationContext::new();
        let event = TriggerEvent::scheduled(ctx.invoked_at);
        let response = self.job.handle(event, ctx).await;
        if response.status_code >= 500 {
            error!("DB sync run failed: {}", response.body);
        }
        response
    }
}
