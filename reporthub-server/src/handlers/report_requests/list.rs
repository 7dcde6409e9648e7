use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Query};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use reporthub_service::{
    ListOptions, ListParams, ReportRequestResponse, ReportStatus, ReportType, SortField,
    SortOrder, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};

use crate::handlers::utils::parse_positive_u32;
use crate::{error::ApiError, state::AppState};

pub async fn list(
    Extension(state): Extension<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {

    let status = match params.get("status") {
        Some(raw) => Some(
            raw.parse::<ReportStatus>()
                .map_err(|_| ApiError::bad_request("status must be a valid report status"))?,
        ),
        None => None,
    };
    let report_type = match params.get("type") {
        Some(raw) => Some(
            raw.parse::<ReportType>()
                .map_err(|_| ApiError::bad_request("type must be a valid report type"))?,
        ),
        None => None,
    };
    let created_at_from = parse_datetime(params.get("createdAtFrom"), "createdAtFrom")?;
    let created_at_to = parse_datetime(params.get("createdAtTo"), "createdAtTo")?;

    let page = parse_positive_u32(params.get("page"), 1, "page")?;
    let page_size =
        parse_positive_u32(params.get("pageSize"), DEFAULT_PAGE_SIZE, "pageSize")?.min(MAX_PAGE_SIZE);
    let sort = match params.get("sort") {
        Some(raw) => raw
            .parse::<SortField>()
            .map_err(|_| ApiError::bad_request("sort must be createdAt or updatedAt"))?,
        None => SortField::CreatedAt,
    };
    let order = match params.get("order") {
        Some(raw) => raw
            .parse::<SortOrder>()
            .map_err(|_| ApiError::bad_request("order must be asc or desc"))?,
        None => SortOrder::Desc,
    };
    let include_deleted = params
        .get("includeDeleted")
        .map(|value| value == "true")
        .unwrap_or(false);

    let (rows, total_items) = state
        .service
        .list(
            ListParams {
                status,
                report_type,
                created_by: params.get("createdBy").cloned(),
                created_at_from,
                created_at_to,
                include_deleted,
            },
            ListOptions {
                page,
                page_size,
                sort,
                order,
            },
        )
        .await
        .map_err(ApiError::from)?;

    let data: Vec<Value> = rows
        .iter()
        .map(ReportRequestResponse::from)
        .map(|response| serde_json::to_value(&response))
        .collect::<Result<_, _>>()
        .map_err(ApiError::from)?;
    let total_pages = (total_items + i64::from(page_size) - 1) / i64::from(page_size);

    Ok(Json(json!({
        "data": data,
        "pageInfo": {
            "page": page,
            "pageSize": page_size,
            "totalItems": total_items,
            "totalPages": total_pages,
        }
    })))
}

fn parse_datetime(
    raw: Option<&String>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    match raw {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|parsed| Some(parsed.with_timezone(&Utc)))
            .map_err(|_| ApiError::bad_request(format!("{field} must be an RFC 3339 timestamp"))),
        None => Ok(None),
    }
}
