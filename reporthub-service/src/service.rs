//! The lifecycle service: create, read, list, edit, soft-delete, and the
//! status transitions, all funnelled through the store's conditional updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use reporthub_db::error::is_unique_violation;
use reporthub_db::idempotency::{self, IdempotencyKeyRow};
use reporthub_db::reports::{self, FieldPatch, ListFilters, ListOptions, ReportRequestRow};
use reporthub_db::DbPool;
use reporthub_queue::{JobMessage, QueueDispatcher};

use crate::domain::{
    assert_retry_allowed, assert_valid_transition, ReportStatus, ReportType,
};
use crate::error::ServiceError;
use crate::hash;
use crate::response::ReportRequestResponse;

const IDEMPOTENCY_ROUTE: &str = "/report-requests";

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validated input for creating a report request.
#[derive(Debug, Clone)]
pub struct NewReportRequest {
    pub title: String,
    pub report_type: ReportType,
    pub parameters: Value,
    pub created_by: String,
}

/// Partial edit of the free-form fields; status, version, and timestamps are
/// never client-writable.
#[derive(Debug, Default, Clone)]
pub struct UpdatePatch {
    pub title: Option<String>,
    pub report_type: Option<ReportType>,
    pub parameters: Option<Value>,
    pub created_by: Option<String>,
}

/// Typed list filters, converted to store-level filters internally.
#[derive(Debug, Default, Clone)]
pub struct ListParams {
    pub status: Option<ReportStatus>,
    pub report_type: Option<ReportType>,
    pub created_by: Option<String>,
    pub created_at_from: Option<DateTime<Utc>>,
    pub created_at_to: Option<DateTime<Utc>>,
    pub include_deleted: bool,
}

/// Result of a create call: either a fresh row or a verbatim replay of the
/// response recorded for this idempotency key.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(ReportRequestResponse),
    Replayed {
        response_code: u16,
        response_body: Value,
    },
}

#[derive(Clone)]
pub struct ReportRequestService {
    pool: DbPool,
    dispatcher: Arc<dyn QueueDispatcher>,
}

impl ReportRequestService {
    pub fn new(pool: DbPool, dispatcher: Arc<dyn QueueDispatcher>) -> Self {
        Self { pool, dispatcher }
    }

    pub async fn create(
        &self,
        input: NewReportRequest,
        idempotency_key: Option<String>,
    ) -> Result<CreateOutcome, ServiceError> {
        match idempotency_key {
            Some(key) => self.create_with_key(input, key).await,
            None => {
                let row = build_row(&input, None);
                reports::insert(&self.pool, &row).await?;
                tracing::info!(id = %row.id, "report request created");
                Ok(CreateOutcome::Created(ReportRequestResponse::from(&row)))
            }
        }
    }

    async fn create_with_key(
        &self,
        input: NewReportRequest,
        key: String,
    ) -> Result<CreateOutcome, ServiceError> {
        let request_hash = hash::sha256_hex(&hash::stable_stringify(&canonical_payload(&input)));

        if let Some(outcome) = self.replay_or_conflict(&key, &request_hash).await? {
            return Ok(outcome);
        }

        let row = build_row(&input, Some(key.clone()));
        let response = ReportRequestResponse::from(&row);
        let body = serde_json::to_value(&response)
            .map_err(|e| ServiceError::Internal(e.into()))?;
        let record = IdempotencyKeyRow {
            key: key.clone(),
            route: IDEMPOTENCY_ROUTE.to_owned(),
            request_hash: request_hash.clone(),
            response_code: 201,
            response_body: body.to_string(),
            created_at: Utc::now(),
        };

        match idempotency::create_with_idempotency(&self.pool, &row, &record).await {
            Ok(()) => {
                tracing::info!(id = %row.id, "report request created with idempotency key");
                Ok(CreateOutcome::Created(response))
            }
            Err(err) if is_unique_violation(&err) => {
                // Lost a concurrent duplicate-create race; the winner's ledger
                // record is authoritative, so retry the lookup instead of
                // surfacing the constraint error.
                match self.replay_or_conflict(&key, &request_hash).await? {
                    Some(outcome) => Ok(outcome),
                    None => Err(ServiceError::Internal(anyhow::anyhow!(
                        "idempotency record missing after unique violation"
                    ))),
                }
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn replay_or_conflict(
        &self,
        key: &str,
        request_hash: &str,
    ) -> Result<Option<CreateOutcome>, ServiceError> {
        let existing =
            idempotency::find_by_key_and_route(&self.pool, key, IDEMPOTENCY_ROUTE).await?;
        match existing {
            None => Ok(None),
            Some(record) => {
                if record.request_hash != request_hash {
                    return Err(ServiceError::Conflict(
                        "Idempotency key reuse with different payload".to_owned(),
                    ));
                }
                tracing::info!(%key, "replaying recorded create response");
                let response_body =
                    serde_json::from_str(&record.response_body).unwrap_or(Value::Null);
                Ok(Some(CreateOutcome::Replayed {
                    response_code: u16::try_from(record.response_code).unwrap_or(201),
                    response_body,
                }))
            }
        }
    }

    pub async fn get(
        &self,
        id: Uuid,
        include_deleted: bool,
    ) -> Result<ReportRequestRow, ServiceError> {
        reports::find_by_id(&self.pool, &id, include_deleted)
            .await?
            .ok_or_else(ServiceError::not_found)
    }

    pub async fn list(
        &self,
        params: ListParams,
        options: ListOptions,
    ) -> Result<(Vec<ReportRequestRow>, i64), ServiceError> {
        let filters = ListFilters {
            status: params.status.map(|s| s.to_string()),
            report_type: params.report_type.map(|t| t.to_string()),
            created_by: params.created_by,
            created_at_from: params.created_at_from,
            created_at_to: params.created_at_to,
            include_deleted: params.include_deleted,
        };
        let options = ListOptions {
            page: options.page.max(1),
            page_size: options.page_size.clamp(1, MAX_PAGE_SIZE),
            ..options
        };
        reports::list(&self.pool, &filters, &options)
            .await
            .map_err(Into::into)
    }

    /// Version-CAS field edit. A stale `expected_version` loses with CONFLICT;
    /// a missing or soft-deleted row is NOT_FOUND.
    pub async fn update(
        &self,
        id: Uuid,
        expected_version: i64,
        patch: UpdatePatch,
    ) -> Result<ReportRequestRow, ServiceError> {
        let field_patch = FieldPatch {
            title: patch.title,
            report_type: patch.report_type.map(|t| t.to_string()),
            parameters: patch.parameters.map(|p| p.to_string()),
            created_by: patch.created_by,
        };
        match reports::update_with_version(&self.pool, &id, expected_version, &field_patch).await? {
            Some(row) => Ok(row),
            // Zero rows matched: re-read to tell a missing row from a stale version.
            None => match reports::find_by_id(&self.pool, &id, false).await? {
                None => Err(ServiceError::not_found()),
                Some(_) => Err(ServiceError::Conflict("Version mismatch".to_owned())),
            },
        }
    }

    pub async fn soft_delete(&self, id: Uuid) -> Result<ReportRequestRow, ServiceError> {
        reports::soft_delete(&self.pool, &id)
            .await?
            .ok_or_else(ServiceError::not_found)
    }

    /// Transition into QUEUED and publish the job message. Publishing happens
    /// strictly after the transition commits.
    pub async fn queue(&self, id: Uuid) -> Result<ReportRequestRow, ServiceError> {
        let existing = self.get(id, false).await?;
        let from = parse_status(&existing.status)?;
        assert_valid_transition(from, ReportStatus::Queued)?;
        let updated = reports::transition_status(
            &self.pool,
            &id,
            from.as_str(),
            ReportStatus::Queued.as_str(),
        )
        .await?
        .ok_or_else(transition_conflict)?;
        self.publish(id).await?;
        Ok(updated)
    }

    pub async fn cancel(&self, id: Uuid) -> Result<ReportRequestRow, ServiceError> {
        let existing = self.get(id, false).await?;
        let from = parse_status(&existing.status)?;
        assert_valid_transition(from, ReportStatus::Cancelled)?;
        reports::transition_status(
            &self.pool,
            &id,
            from.as_str(),
            ReportStatus::Cancelled.as_str(),
        )
        .await?
        .ok_or_else(transition_conflict)
    }

    /// FAILED -> QUEUED, clearing the failure reason, then publish.
    pub async fn retry(&self, id: Uuid) -> Result<ReportRequestRow, ServiceError> {
        let existing = self.get(id, false).await?;
        assert_retry_allowed(parse_status(&existing.status)?)?;
        let updated = reports::transition_retry(&self.pool, &id)
            .await?
            .ok_or_else(transition_conflict)?;
        self.publish(id).await?;
        Ok(updated)
    }

    /// Worker-only: QUEUED -> PROCESSING. Losing this CAS is the worker's
    /// duplicate-delivery signal.
    pub async fn mark_processing(&self, id: Uuid) -> Result<ReportRequestRow, ServiceError> {
        let existing = self.get(id, false).await?;
        let from = parse_status(&existing.status)?;
        assert_valid_transition(from, ReportStatus::Processing)?;
        reports::transition_status(
            &self.pool,
            &id,
            ReportStatus::Queued.as_str(),
            ReportStatus::Processing.as_str(),
        )
        .await?
        .ok_or_else(transition_conflict)
    }

    /// Worker-only: PROCESSING -> COMPLETED, merging the result location into
    /// the parameters document.
    pub async fn mark_completed(
        &self,
        id: Uuid,
        result_url: &str,
    ) -> Result<ReportRequestRow, ServiceError> {
        let existing = self.get(id, false).await?;
        let from = parse_status(&existing.status)?;
        assert_valid_transition(from, ReportStatus::Completed)?;

        let mut parameters: Value =
            serde_json::from_str(&existing.parameters).unwrap_or_else(|_| json!({}));
        if !parameters.is_object() {
            parameters = json!({});
        }
        if let Some(map) = parameters.as_object_mut() {
            map.insert("resultUrl".to_owned(), json!(result_url));
        }

        reports::transition_completed(&self.pool, &id, &parameters.to_string())
            .await?
            .ok_or_else(transition_conflict)
    }

    /// Worker-only: PROCESSING -> FAILED with the failure reason.
    pub async fn mark_failed(
        &self,
        id: Uuid,
        reason: &str,
    ) -> Result<ReportRequestRow, ServiceError> {
        let existing = self.get(id, false).await?;
        let from = parse_status(&existing.status)?;
        assert_valid_transition(from, ReportStatus::Failed)?;
        reports::transition_failed(&self.pool, &id, reason)
            .await?
            .ok_or_else(transition_conflict)
    }

    async fn publish(&self, id: Uuid) -> Result<(), ServiceError> {
        if let Err(err) = self.dispatcher.enqueue(JobMessage::new(id)).await {
            // The row is durably QUEUED but no worker will ever see it; this
            // must surface loudly rather than be swallowed.
            tracing::error!(%id, error = %err, "failed to enqueue job after committed transition");
            return Err(err.into());
        }
        tracing::debug!(%id, "job message published");
        Ok(())
    }
}

fn transition_conflict() -> ServiceError {
    ServiceError::Conflict("Status transition conflict".to_owned())
}

fn parse_status(raw: &str) -> Result<ReportStatus, ServiceError> {
    raw.parse::<ReportStatus>()
        .map_err(|err| ServiceError::Internal(anyhow::anyhow!("corrupt status column: {err}")))
}

/// The hash input mirrors the create payload with its API field names; key
/// order is normalized by `stable_stringify`.
fn canonical_payload(input: &NewReportRequest) -> Value {
    json!({
        "title": input.title,
        "type": input.report_type.as_str(),
        "parameters": input.parameters,
        "createdBy": input.created_by,
    })
}

fn build_row(input: &NewReportRequest, idempotency_key: Option<String>) -> ReportRequestRow {
    let now = Utc::now();
    ReportRequestRow {
        id: Uuid::new_v4(),
        title: input.title.clone(),
        report_type: input.report_type.to_string(),
        parameters: input.parameters.to_string(),
        status: ReportStatus::Draft.to_string(),
        created_by: input.created_by.clone(),
        idempotency_key,
        version: 0,
        created_at: now,
        updated_at: now,
        deleted_at: None,
        completed_at: None,
        failure_reason: None,
    }
}
