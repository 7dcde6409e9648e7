//! Persistence for report request rows.
//!
//! Every mutating operation here is a single conditional UPDATE guarded by
//! either the row version or the current status. Writers never read-modify-
//! write: the guard plus the atomic `version = version + 1` increment is what
//! makes concurrent HTTP handlers and worker instances safe against each
//! other. Zero affected rows means the guard no longer held; callers re-read
//! to distinguish a missing row from a lost race.

use chrono::{DateTime, Utc};
use sqlx::{Executor, QueryBuilder};
use uuid::Uuid;

use crate::{DbBackend, DbPool};

const COLUMNS: &str = "id, title, report_type, parameters, status, created_by, idempotency_key, \
     version, created_at, updated_at, deleted_at, completed_at, failure_reason";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct ReportRequestRow {
    pub id: Uuid,
    pub title: String,
    pub report_type: String,
    /// JSON document stored as text; parsed at the DTO boundary.
    pub parameters: String,
    pub status: String,
    pub created_by: String,
    pub idempotency_key: Option<String>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
}

/// Filters applied to a list scan. Absent fields do not constrain the query.
#[derive(Debug, Default, Clone)]
pub struct ListFilters {
    pub status: Option<String>,
    pub report_type: Option<String>,
    pub created_by: Option<String>,
    pub created_at_from: Option<DateTime<Utc>>,
    pub created_at_to: Option<DateTime<Utc>>,
    pub include_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub const fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "createdAt" => Ok(Self::CreatedAt),
            "updatedAt" => Ok(Self::UpdatedAt),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Asc => " ASC",
            Self::Desc => " DESC",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListOptions {
    pub page: u32,
    pub page_size: u32,
    pub sort: SortField,
    pub order: SortOrder,
}

/// Partial edit of the free-form fields. Never touches status, version, or
/// timestamps; those are owned by the lifecycle transitions.
#[derive(Debug, Default, Clone)]
pub struct FieldPatch {
    pub title: Option<String>,
    pub report_type: Option<String>,
    pub parameters: Option<String>,
    pub created_by: Option<String>,
}

pub async fn insert<'e, E>(executor: E, row: &ReportRequestRow) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = DbBackend>,
{
    sqlx::query(
        "INSERT INTO report_requests (id, title, report_type, parameters, status, created_by, \
         idempotency_key, version, created_at, updated_at, deleted_at, completed_at, failure_reason) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.id)
    .bind(&row.title)
    .bind(&row.report_type)
    .bind(&row.parameters)
    .bind(&row.status)
    .bind(&row.created_by)
    .bind(&row.idempotency_key)
    .bind(row.version)
    .bind(row.created_at)
    .bind(row.updated_at)
    .bind(row.deleted_at)
    .bind(row.completed_at)
    .bind(&row.failure_reason)
    .execute(executor)
    .await
    .map(|_| ())
}

pub async fn find_by_id<'e, E>(
    executor: E,
    id: &Uuid,
    include_deleted: bool,
) -> Result<Option<ReportRequestRow>, sqlx::Error>
where
    E: Executor<'e, Database = DbBackend>,
{
    let sql = if include_deleted {
        format!("SELECT {COLUMNS} FROM report_requests WHERE id = ?")
    } else {
        format!("SELECT {COLUMNS} FROM report_requests WHERE id = ? AND deleted_at IS NULL")
    };
    sqlx::query_as::<_, ReportRequestRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
}

fn push_filters(builder: &mut QueryBuilder<DbBackend>, filters: &ListFilters) {
    builder.push(" WHERE 1 = 1");
    if !filters.include_deleted {
        builder.push(" AND deleted_at IS NULL");
    }
    if let Some(status) = &filters.status {
        builder.push(" AND status = ").push_bind(status.clone());
    }
    if let Some(report_type) = &filters.report_type {
        builder
            .push(" AND report_type = ")
            .push_bind(report_type.clone());
    }
    if let Some(created_by) = &filters.created_by {
        builder
            .push(" AND created_by = ")
            .push_bind(created_by.clone());
    }
    if let Some(from) = filters.created_at_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filters.created_at_to {
        builder.push(" AND created_at <= ").push_bind(to);
    }
}

/// Filtered, paged scan. Returns the page of rows plus the total match count.
pub async fn list(
    pool: &DbPool,
    filters: &ListFilters,
    options: &ListOptions,
) -> Result<(Vec<ReportRequestRow>, i64), sqlx::Error> {
    let mut count_builder: QueryBuilder<DbBackend> =
        QueryBuilder::new("SELECT COUNT(*) FROM report_requests");
    push_filters(&mut count_builder, filters);
    let total_items: i64 = count_builder
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let mut builder: QueryBuilder<DbBackend> =
        QueryBuilder::new(format!("SELECT {COLUMNS} FROM report_requests"));
    push_filters(&mut builder, filters);
    builder
        .push(" ORDER BY ")
        .push(options.sort.column())
        .push(options.order.keyword());
    builder
        .push(" LIMIT ")
        .push_bind(i64::from(options.page_size));
    builder
        .push(" OFFSET ")
        .push_bind(i64::from(options.page.saturating_sub(1)) * i64::from(options.page_size));

    let rows = builder
        .build_query_as::<ReportRequestRow>()
        .fetch_all(pool)
        .await?;

    Ok((rows, total_items))
}

/// Version-CAS update of the free-form fields.
///
/// `None` means the guard did not hold: the row is missing, soft-deleted, or
/// was mutated since the caller observed `expected_version`.
pub async fn update_with_version(
    pool: &DbPool,
    id: &Uuid,
    expected_version: i64,
    patch: &FieldPatch,
) -> Result<Option<ReportRequestRow>, sqlx::Error> {
    let mut builder: QueryBuilder<DbBackend> =
        QueryBuilder::new("UPDATE report_requests SET version = version + 1, updated_at = ");
    builder.push_bind(Utc::now());
    if let Some(title) = &patch.title {
        builder.push(", title = ").push_bind(title.clone());
    }
    if let Some(report_type) = &patch.report_type {
        builder.push(", report_type = ").push_bind(report_type.clone());
    }
    if let Some(parameters) = &patch.parameters {
        builder.push(", parameters = ").push_bind(parameters.clone());
    }
    if let Some(created_by) = &patch.created_by {
        builder.push(", created_by = ").push_bind(created_by.clone());
    }
    builder.push(" WHERE id = ").push_bind(*id);
    builder.push(" AND version = ").push_bind(expected_version);
    builder.push(" AND deleted_at IS NULL");

    let result = builder.build().execute(pool).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id, false).await
}

/// Status-CAS transition used by queue, cancel, and processing-start.
pub async fn transition_status(
    pool: &DbPool,
    id: &Uuid,
    expected: &str,
    next: &str,
) -> Result<Option<ReportRequestRow>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE report_requests SET status = ?, version = version + 1, updated_at = ? \
         WHERE id = ? AND status = ? AND deleted_at IS NULL",
    )
    .bind(next)
    .bind(Utc::now())
    .bind(id)
    .bind(expected)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id, false).await
}

/// Status-CAS for retry: FAILED -> QUEUED, clearing the failure reason.
pub async fn transition_retry(
    pool: &DbPool,
    id: &Uuid,
) -> Result<Option<ReportRequestRow>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE report_requests SET status = 'QUEUED', failure_reason = NULL, \
         version = version + 1, updated_at = ? \
         WHERE id = ? AND status = 'FAILED' AND deleted_at IS NULL",
    )
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id, false).await
}

/// Status-CAS for completion: PROCESSING -> COMPLETED, stamping `completed_at`
/// and replacing `parameters` with the merged document.
pub async fn transition_completed(
    pool: &DbPool,
    id: &Uuid,
    parameters_json: &str,
) -> Result<Option<ReportRequestRow>, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "UPDATE report_requests SET status = 'COMPLETED', completed_at = ?, parameters = ?, \
         version = version + 1, updated_at = ? \
         WHERE id = ? AND status = 'PROCESSING' AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(parameters_json)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id, false).await
}

/// Status-CAS for failure: PROCESSING -> FAILED, recording the reason.
pub async fn transition_failed(
    pool: &DbPool,
    id: &Uuid,
    reason: &str,
) -> Result<Option<ReportRequestRow>, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE report_requests SET status = 'FAILED', failure_reason = ?, \
         version = version + 1, updated_at = ? \
         WHERE id = ? AND status = 'PROCESSING' AND deleted_at IS NULL",
    )
    .bind(reason)
    .bind(Utc::now())
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id, false).await
}

/// Marks the row deleted. Guarded only by "exists and not already deleted".
pub async fn soft_delete(
    pool: &DbPool,
    id: &Uuid,
) -> Result<Option<ReportRequestRow>, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "UPDATE report_requests SET deleted_at = ?, version = version + 1, updated_at = ? \
         WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(pool, id, true).await
}
