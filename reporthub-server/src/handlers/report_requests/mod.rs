use std::collections::HashMap;

use uuid::Uuid;

use crate::error::ApiError;

pub mod cancel;
pub mod create;
pub mod delete;
pub mod dto;
pub mod get;
pub mod list;
pub mod queue;
pub mod retry;
pub mod update;

/// Ids are opaque to clients; anything that is not one of ours cannot name an
/// existing row.
pub(crate) fn parse_id(path: &HashMap<String, String>) -> Result<Uuid, ApiError> {
    let raw = path
        .get("id")
        .ok_or_else(|| ApiError::not_found("Report request not found"))?;
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Report request not found"))
}
