//! The injected "do the work" capability invoked between the processing and
//! terminal transitions.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// A processing failure; the message becomes the row's failure reason.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProcessError(pub String);

impl ProcessError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Generates the report for one request. Implementations receive the current
/// parameters as read from the store, not from the queue payload.
#[async_trait]
pub trait ReportProcessor: Send + Sync {
    async fn generate(&self, id: Uuid, parameters: &Value) -> Result<String, ProcessError>;
}

/// Stand-in generator: sleeps for a bounded random interval and fails when
/// the request carries `{"fail": true}` in its parameters.
#[derive(Debug, Default, Clone)]
pub struct SimulatedReportGenerator;

#[async_trait]
impl ReportProcessor for SimulatedReportGenerator {
    async fn generate(&self, id: Uuid, parameters: &Value) -> Result<String, ProcessError> {
        let delay_ms = rand::rng().random_range(500..1500);
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        if parameters.get("fail").and_then(Value::as_bool) == Some(true) {
            return Err(ProcessError::new("Simulated processing failure"));
        }

        Ok(format!("https://example.com/reports/{id}.json"))
    }
}
