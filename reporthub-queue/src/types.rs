use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimal payload carried by the queue: just the row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMessage {
    pub id: Uuid,
}

impl JobMessage {
    #[inline]
    pub const fn new(id: Uuid) -> Self {
        Self { id }
    }
}
