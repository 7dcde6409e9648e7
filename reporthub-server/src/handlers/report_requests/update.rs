use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use axum::http::HeaderMap;
use serde_json::Value;

use reporthub_service::ReportRequestResponse;

use crate::handlers::report_requests::dto::UpdateReportRequestDto;
use crate::handlers::report_requests::parse_id;
use crate::{error::ApiError, state::AppState, validation};

pub async fn update(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(path): Path<HashMap<String, String>>,
    body: Option<Json<Value>>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&path)?;

    // The If-Match version is the optimistic-concurrency precondition; the
    // request is meaningless without it.
    let expected_version: i64 = headers
        .get("if-match")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| {
            ApiError::bad_request("If-Match header with integer version is required")
        })?;

    let dto: UpdateReportRequestDto = match body {
        Some(payload) => serde_json::from_value(payload.0).map_err(ApiError::from)?,
        None => UpdateReportRequestDto::default(),
    };
    let patch = dto
        .try_into_patch()
        .map_err(|issues| ApiError::Validation(validation::to_payload(&issues)))?;

    let row = state
        .service
        .update(id, expected_version, patch)
        .await
        .map_err(ApiError::from)?;
    let response = ReportRequestResponse::from(&row);
    Ok(Json(serde_json::to_value(&response).map_err(ApiError::from)?))
}
