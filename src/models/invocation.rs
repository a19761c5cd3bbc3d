use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::manifest::Manifest;

/// Trigger payload. Carried for logging only; it never changes what a run does.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerEvent(pub Value);

impl TriggerEvent {
    pub fn scheduled(at: DateTime<Utc>) -> Self {
        Self(json!({
            "source": "db-sync.scheduler",
            "detail-type": "Scheduled Event",
            "time": at.to_rfc3339(),
        }))
    }

    pub fn source(&self) -> Option<&str> {
        self.0.get("source").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct InvocationContext {
    pub request_id: Uuid,
    pub invoked_at: DateTime<Utc>,
}

impl InvocationContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            invoked_at: Utc::now(),
        }
    }
}

impl Default for InvocationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal result of one invocation: a status code and a JSON-encoded body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub status_code: u16,
    pub body: String,
}

#[derive(Serialize)]
struct SuccessBody<'a> {
    message: &'static str,
    metadata: &'a Manifest,
}

impl RunResponse {
    pub fn success(manifest: &Manifest) -> Self {
        let body = SuccessBody {
            message: "Database backup successful",
            metadata: manifest,
        };
        Self {
            status_code: 200,
            // A struct of strings and numbers always serializes.
            body: serde_json::to_string(&body).unwrap_or_default(),
        }
    }

    pub fn failure(error: &AppError) -> Self {
        Self {
            status_code: 500,
            body: serde_json::to_string(&error.to_body()).unwrap_or_default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    #[cfg(test)]
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}
