use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use serde_json::Value;

use reporthub_service::ReportRequestResponse;

use crate::handlers::report_requests::parse_id;
use crate::{error::ApiError, state::AppState};

pub async fn retry(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<HashMap<String, String>>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&path)?;
    let row = state.service.retry(id).await.map_err(ApiError::from)?;
    let response = ReportRequestResponse::from(&row);
    Ok(Json(serde_json::to_value(&response).map_err(ApiError::from)?))
}
