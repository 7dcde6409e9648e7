use serde::{Deserialize, Serialize};
use serde_json::Value;

use reporthub_db::reports::ReportRequestRow;

/// Response DTO for report requests - uses camelCase for JSON serialization.
/// This is also the shape recorded in the idempotency ledger, so replays are
/// byte-for-byte what the first call returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequestResponse {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub parameters: Value,
    pub status: String,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    pub version: i64,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl From<&ReportRequestRow> for ReportRequestResponse {
    fn from(row: &ReportRequestRow) -> Self {
        Self {
            id: row.id.to_string(),
            title: row.title.clone(),
            report_type: row.report_type.clone(),
            parameters: serde_json::from_str(&row.parameters).unwrap_or(Value::Null),
            status: row.status.clone(),
            created_by: row.created_by.clone(),
            idempotency_key: row.idempotency_key.clone(),
            version: row.version,
            created_at: row.created_at.to_rfc3339(),
            updated_at: row.updated_at.to_rfc3339(),
            deleted_at: row.deleted_at.map(|ts| ts.to_rfc3339()),
            completed_at: row.completed_at.map(|ts| ts.to_rfc3339()),
            failure_reason: row.failure_reason.clone(),
        }
    }
}
