use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use reporthub_db::{create_pool, DbConnectionConfig};
use reporthub_queue::{InMemoryQueue, JobReceiver};
use reporthub_server::build_router;
use reporthub_server::state::AppState;
use reporthub_service::ReportRequestService;

async fn setup_router() -> (axum::Router, JobReceiver) {
    let mut config = DbConnectionConfig::new("sqlite::memory:");
    config.max_connections = 1;
    let pool = create_pool(&config).await.expect("create pool");
    reporthub_migrations::sqlite_migrator()
        .run(&pool)
        .await
        .expect("run migrations");
    let (queue, receiver) = InMemoryQueue::channel();
    let service = ReportRequestService::new(pool, Arc::new(queue));
    (build_router(Arc::new(AppState::new(service))), receiver)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (app, _receiver) = setup_router().await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn create_and_queue_over_http() {
    let (app, mut receiver) = setup_router().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/report-requests")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "title": "Monthly sales",
                        "type": "SALES_SUMMARY",
                        "parameters": {"month": "2025-12"},
                        "createdBy": "u1"
                    })
                    .to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["status"], "DRAFT");
    let id = created["id"].as_str().expect("id");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/report-requests/{id}/queue"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "QUEUED");
    assert_eq!(receiver.try_recv().expect("published").id.to_string(), id);
}

#[tokio::test]
async fn errors_use_the_structured_envelope() {
    let (app, _receiver) = setup_router().await;

    // Unknown row: 404 with a NOT_FOUND envelope.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/report-requests/7c9e6679-7425-40de-944b-e07fc1f90ae7")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert!(body["error"]["message"].is_string());

    // Missing If-Match: 400 with a VALIDATION_ERROR envelope.
    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/report-requests/7c9e6679-7425-40de-944b-e07fc1f90ae7")
                .header("content-type", "application/json")
                .body(Body::from(json!({"title": "x"}).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
