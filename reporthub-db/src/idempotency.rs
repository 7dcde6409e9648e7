//! Write-once idempotency ledger keyed by `(key, route)`.

use chrono::{DateTime, Utc};
use sqlx::Executor;

use crate::reports::{self, ReportRequestRow};
use crate::{DbBackend, DbPool};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdempotencyKeyRow {
    pub key: String,
    pub route: String,
    pub request_hash: String,
    pub response_code: i64,
    pub response_body: String,
    pub created_at: DateTime<Utc>,
}

pub async fn find_by_key_and_route<'e, E>(
    executor: E,
    key: &str,
    route: &str,
) -> Result<Option<IdempotencyKeyRow>, sqlx::Error>
where
    E: Executor<'e, Database = DbBackend>,
{
    sqlx::query_as::<_, IdempotencyKeyRow>(
        "SELECT key, route, request_hash, response_code, response_body, created_at \
         FROM idempotency_keys WHERE key = ? AND route = ?",
    )
    .bind(key)
    .bind(route)
    .fetch_optional(executor)
    .await
}

pub async fn insert<'e, E>(executor: E, row: &IdempotencyKeyRow) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = DbBackend>,
{
    sqlx::query(
        "INSERT INTO idempotency_keys (key, route, request_hash, response_code, response_body, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.key)
    .bind(&row.route)
    .bind(&row.request_hash)
    .bind(row.response_code)
    .bind(&row.response_body)
    .bind(row.created_at)
    .execute(executor)
    .await
    .map(|_| ())
}

/// Inserts the report row and its idempotency record as one transaction, so a
/// crash between the two writes can never leave an orphaned report or an
/// unreplayable key.
pub async fn create_with_idempotency(
    pool: &DbPool,
    report: &ReportRequestRow,
    record: &IdempotencyKeyRow,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    reports::insert(&mut *tx, report).await?;
    insert(&mut *tx, record).await?;
    tx.commit().await
}
