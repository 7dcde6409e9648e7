//! Job queue handoff between the API and the report worker.
//!
//! The API side only ever sees [`QueueDispatcher::enqueue`]; what carries the
//! message is an implementation detail owned by whoever builds the service
//! graph. The in-memory implementation delivers at-least-once within a single
//! process; consumers must treat redelivered messages as duplicates.
//!
//! # Architecture
//!
//! - [`QueueDispatcher`] - publish side, injected into the lifecycle service
//! - [`JobReceiver`] - consume side, driven by the worker loop
//! - [`JobMessage`] - the minimal `{ id }` payload; workers re-read current
//!   state from the store rather than trusting the payload

mod error;
mod memory;
mod types;

pub use error::QueueError;
pub use memory::{InMemoryQueue, JobReceiver, NullDispatcher};
pub use types::JobMessage;

// Re-export async_trait for convenience when implementing QueueDispatcher
pub use async_trait::async_trait;

/// Publish interface for job messages.
///
/// `enqueue` must have durably accepted the message before returning `Ok`;
/// callers publish only after their state transition has committed.
#[async_trait]
pub trait QueueDispatcher: Send + Sync {
    async fn enqueue(&self, message: JobMessage) -> Result<(), QueueError>;
}
