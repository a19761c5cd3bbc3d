use crate::error::{AppError, AppResult};
use crate::models::manifest::manifest_key;
use crate::models::{InvocationContext, Manifest, RunResponse, TableName, TriggerEvent};
use crate::services::clock::Clock;
use crate::services::exporter::TableExporter;
use crate::services::source::SourceConnector;
use crate::services::storage::ObjectStore;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn, Instrument};

/// One scheduled backup: every configured table, then a manifest.
pub struct ExportJob {
    connector: Arc<dyn SourceConnector>,
    store: Arc<dyn ObjectStore>,
    clock: Arc<dyn Clock>,
    exporter: TableExporter,
    tables: Vec<TableName>,
}

impl ExportJob {
    pub fn new(
        connector: Arc<dyn SourceConnector>,
        store: Arc<dyn ObjectStore>,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            exporter: TableExporter::new(store.clone(), clock.clone(), window),
            connector,
            store,
            clock,
            tables: TableName::configured()?,
        })
    }

    /// Runs once and always produces a terminal response.
    pub async fn handle(&self, event: TriggerEvent, ctx: InvocationContext) -> RunResponse {
        let span = tracing::info_span!("db_sync_run", request_id = %ctx.request_id);

        async move {
            match self.run(&event, &ctx).await {
                Ok(manifest) => RunResponse::success(&manifest),
                Err(e) => {
                    error!("Backup failed: {}", e);
                    RunResponse::failure(&e)
                }
            }
        }
        .instrument(span)
        .await
    }

    pub async fn run(&self, event: &TriggerEvent, ctx: &InvocationContext) -> AppResult<Manifest> {
        let started = Instant::now();
        info!("Starting DB sync at {}", ctx.invoked_at);
        debug!("Trigger source: {}", event.source().unwrap_or("unknown"));

        let mut session = self.connector.connect().await?;

        let mut records = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            info!("Backing up table: {}", table);
            let record = self.exporter.export_table(session.as_mut(), table).await;
            debug!("Table {}: {}", table, record);
            records.push(record);
        }

        if let Err(e) = session.close().await {
            warn!("Failed to close source connection: {}", e);
        }

        let now = self.clock.now();
        let manifest = Manifest::from_records(now, &records);
        let body = serde_json::to_string_pretty(&manifest)
            .map_err(|e| AppError::Serialization(format!("Failed to encode manifest: {e}")))?;
        let key = manifest_key(now);

        self.store
            .put_object(&key, body.into_bytes(), mime::APPLICATION_JSON.as_ref())
            .await?;

        info!(
            "Backup completed in {:.2}s. Files: {} ({})",
            started.elapsed().as_secs_f64(),
            manifest.tables_count,
            self.store.location(&key)
        );
        Ok(manifest)
    }
}
