//! Pure lifecycle rules: which status moves are legal, and when a retry is
//! allowed. No storage, no clocks, no shared state; safe to call anywhere.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Draft,
    Queued,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Error)]
#[error("unknown report status: {0}")]
pub struct ParseStatusError(String);

impl ReportStatus {
    pub const ALL: [ReportStatus; 6] = [
        Self::Draft,
        Self::Queued,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
    ];

    /// Fixed adjacency table of the lifecycle.
    pub const fn allowed_transitions(self) -> &'static [ReportStatus] {
        match self {
            Self::Draft => &[Self::Queued, Self::Cancelled],
            Self::Queued => &[Self::Processing, Self::Cancelled],
            Self::Processing => &[Self::Completed, Self::Failed, Self::Cancelled],
            Self::Completed | Self::Failed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition(self, to: ReportStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Retry is a distinguished client operation, not a row in the table:
    /// it escapes the otherwise-terminal FAILED state back to QUEUED.
    pub const fn can_retry(self) -> bool {
        matches!(self, Self::Failed)
    }

    /// Returns true if this status has no outgoing transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Queued => "QUEUED",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = ParseStatusError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "DRAFT" => Ok(Self::Draft),
            "QUEUED" => Ok(Self::Queued),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(ParseStatusError(other.to_owned())),
        }
    }
}

/// Closed set of report kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    SalesSummary,
    UserExport,
    InventorySnapshot,
}

#[derive(Debug, Error)]
#[error("unknown report type: {0}")]
pub struct ParseTypeError(String);

impl ReportType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SalesSummary => "SALES_SUMMARY",
            Self::UserExport => "USER_EXPORT",
            Self::InventorySnapshot => "INVENTORY_SNAPSHOT",
        }
    }
}

impl std::fmt::Display for ReportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReportType {
    type Err = ParseTypeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "SALES_SUMMARY" => Ok(Self::SalesSummary),
            "USER_EXPORT" => Ok(Self::UserExport),
            "INVENTORY_SNAPSHOT" => Ok(Self::InventorySnapshot),
            other => Err(ParseTypeError(other.to_owned())),
        }
    }
}

/// Rejects an illegal status move with a conflict naming both states.
pub fn assert_valid_transition(from: ReportStatus, to: ReportStatus) -> Result<(), ServiceError> {
    if from.can_transition(to) {
        Ok(())
    } else {
        Err(ServiceError::Conflict(format!(
            "Invalid status transition from {from} to {to}"
        )))
    }
}

pub fn assert_retry_allowed(from: ReportStatus) -> Result<(), ServiceError> {
    if from.can_retry() {
        Ok(())
    } else {
        Err(ServiceError::Conflict(
            "Retry is only allowed from FAILED".to_owned(),
        ))
    }
}
