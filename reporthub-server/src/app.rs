use std::sync::Arc;

use axum::extract::Extension;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::report_requests;
use crate::state::AppState;

/// Build the primary axum router with the provided shared application state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/report-requests",
            post(report_requests::create::create).get(report_requests::list::list),
        )
        .route(
            "/report-requests/{id}",
            get(report_requests::get::get)
                .patch(report_requests::update::update)
                .delete(report_requests::delete::delete),
        )
        .route(
            "/report-requests/{id}/queue",
            post(report_requests::queue::queue),
        )
        .route(
            "/report-requests/{id}/cancel",
            post(report_requests::cancel::cancel),
        )
        .route(
            "/report-requests/{id}/retry",
            post(report_requests::retry::retry),
        )
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(Extension(state))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
