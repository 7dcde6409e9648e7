use std::sync::Arc;

use axum::extract::{Extension, Json};
use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;

use reporthub_service::CreateOutcome;

use crate::handlers::report_requests::dto::CreateReportRequestDto;
use crate::{error::ApiError, state::AppState, validation};

pub async fn create(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let payload = body
        .ok_or_else(|| ApiError::bad_request("missing request body"))?
        .0;
    let dto: CreateReportRequestDto = serde_json::from_value(payload).map_err(ApiError::from)?;
    let input = dto
        .try_into_new()
        .map_err(|issues| ApiError::Validation(validation::to_payload(&issues)))?;

    // An empty header is the same as no header at all.
    let idempotency_key = headers
        .get("idempotency-key")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned);

    match state
        .service
        .create(input, idempotency_key)
        .await
        .map_err(ApiError::from)?
    {
        CreateOutcome::Created(response) => Ok((
            StatusCode::CREATED,
            Json(serde_json::to_value(&response).map_err(ApiError::from)?),
        )),
        CreateOutcome::Replayed {
            response_code,
            response_body,
        } => {
            let status =
                StatusCode::from_u16(response_code).unwrap_or(StatusCode::CREATED);
            Ok((status, Json(response_body)))
        }
    }
}
