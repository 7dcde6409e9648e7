//! Consumer side of the queue handoff.
//!
//! Delivery is at-least-once: the loop claims each job by winning the
//! QUEUED -> PROCESSING status-CAS, so a redelivered or duplicated message
//! loses that race and is dropped without noise. Transition conflicts on the
//! terminal step mean another worker instance finished the item first and are
//! swallowed the same way.

mod processor;

pub use processor::{ProcessError, ReportProcessor, SimulatedReportGenerator};

use std::sync::Arc;

use serde_json::Value;

use reporthub_queue::{JobMessage, JobReceiver};
use reporthub_service::{ReportRequestService, ServiceError};

/// Drains the receiver until every dispatcher is gone, driving each job
/// through processing and into a terminal state.
pub async fn run_worker(
    service: ReportRequestService,
    mut receiver: JobReceiver,
    processor: Arc<dyn ReportProcessor>,
) {
    tracing::info!("report worker started");
    while let Some(message) = receiver.recv().await {
        handle_job(&service, processor.as_ref(), message).await;
    }
    tracing::info!("report worker stopped: queue closed");
}

async fn handle_job(
    service: &ReportRequestService,
    processor: &dyn ReportProcessor,
    message: JobMessage,
) {
    let id = message.id;
    tracing::info!(report_request_id = %id, "report job started");

    let row = match service.mark_processing(id).await {
        Ok(row) => row,
        Err(err) if err.is_conflict() => {
            // Redelivery after this item already advanced past QUEUED.
            tracing::debug!(report_request_id = %id, "duplicate delivery ignored");
            return;
        }
        Err(ServiceError::NotFound(_)) => {
            tracing::warn!(report_request_id = %id, "job references a missing report request");
            return;
        }
        Err(err) => {
            tracing::error!(report_request_id = %id, error = %err, "failed to start processing");
            return;
        }
    };

    let parameters: Value = serde_json::from_str(&row.parameters).unwrap_or(Value::Null);

    match processor.generate(id, &parameters).await {
        Ok(result_url) => match service.mark_completed(id, &result_url).await {
            Ok(_) => tracing::info!(report_request_id = %id, "report job completed"),
            Err(err) if err.is_conflict() => {
                tracing::debug!(report_request_id = %id, "completion lost a transition race")
            }
            Err(err) => {
                tracing::error!(report_request_id = %id, error = %err, "failed to record completion")
            }
        },
        Err(reason) => match service.mark_failed(id, &reason.to_string()).await {
            Ok(_) => {
                tracing::warn!(report_request_id = %id, %reason, "report job failed")
            }
            Err(err) if err.is_conflict() => {
                tracing::debug!(report_request_id = %id, "failure lost a transition race")
            }
            Err(err) => {
                tracing::error!(report_request_id = %id, error = %err, "failed to record failure")
            }
        },
    }
}
