//! Lifecycle orchestration for report requests.
//!
//! This crate owns every status transition: the HTTP layer and the worker
//! loop both go through [`ReportRequestService`], which validates transitions
//! against the pure state machine in [`domain`] and applies them through the
//! store's conditional updates. Nothing here holds a lock; the store's
//! single-row CAS is the only concurrency primitive.

pub mod domain;
pub mod error;
pub mod hash;
pub mod response;
pub mod service;

pub use domain::{ReportStatus, ReportType};
pub use error::ServiceError;
pub use response::ReportRequestResponse;
pub use service::{
    CreateOutcome, ListParams, NewReportRequest, ReportRequestService, UpdatePatch,
    DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

pub use reporthub_db::reports::{ListOptions, ReportRequestRow, SortField, SortOrder};
