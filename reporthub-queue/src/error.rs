use thiserror::Error;

/// Errors that may occur while publishing to the queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("job queue is closed")]
    Closed,

    #[error("failed to enqueue job: {0}")]
    Backend(String),
}
