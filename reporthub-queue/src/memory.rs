//! In-memory queue implementation backed by an unbounded channel.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::QueueError;
use crate::types::JobMessage;
use crate::QueueDispatcher;

/// Publish half of the in-memory queue. Cheap to clone; all clones feed the
/// same receiver.
#[derive(Debug, Clone)]
pub struct InMemoryQueue {
    tx: mpsc::UnboundedSender<JobMessage>,
}

/// Consume half of the in-memory queue, held by exactly one worker loop.
#[derive(Debug)]
pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<JobMessage>,
}

impl InMemoryQueue {
    /// Creates a connected dispatcher/receiver pair.
    pub fn channel() -> (InMemoryQueue, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (InMemoryQueue { tx }, JobReceiver { rx })
    }
}

#[async_trait]
impl QueueDispatcher for InMemoryQueue {
    async fn enqueue(&self, message: JobMessage) -> Result<(), QueueError> {
        self.tx.send(message).map_err(|_| QueueError::Closed)
    }
}

impl JobReceiver {
    /// Waits for the next message. `None` once every dispatcher is dropped
    /// and the channel has drained.
    pub async fn recv(&mut self) -> Option<JobMessage> {
        self.rx.recv().await
    }

    /// Non-blocking poll, mainly useful in tests.
    pub fn try_recv(&mut self) -> Option<JobMessage> {
        self.rx.try_recv().ok()
    }
}

/// Dispatcher that silently drops every message. Useful for tests and for
/// service graphs where publishing is handled elsewhere.
#[derive(Debug, Default, Clone)]
pub struct NullDispatcher;

#[async_trait]
impl QueueDispatcher for NullDispatcher {
    async fn enqueue(&self, message: JobMessage) -> Result<(), QueueError> {
        tracing::debug!(id = %message.id, "null dispatcher dropped job message");
        Ok(())
    }
}
