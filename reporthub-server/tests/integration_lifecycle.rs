use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Path};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;
use uuid::Uuid;

use reporthub_db::{create_pool, DbConnectionConfig};
use reporthub_queue::{InMemoryQueue, JobReceiver};
use reporthub_server::handlers::report_requests::{cancel, create, queue, retry};
use reporthub_server::state::AppState;
use reporthub_service::ReportRequestService;

async fn setup_state() -> (Arc<AppState>, JobReceiver) {
    let mut config = DbConnectionConfig::new("sqlite::memory:");
    config.max_connections = 1;
    let pool = create_pool(&config).await.expect("create pool");
    reporthub_migrations::sqlite_migrator()
        .run(&pool)
        .await
        .expect("run migrations");
    let (queue, receiver) = InMemoryQueue::channel();
    let service = ReportRequestService::new(pool, Arc::new(queue));
    (Arc::new(AppState::new(service)), receiver)
}

fn id_path(id: &str) -> Path<HashMap<String, String>> {
    let mut path = HashMap::new();
    path.insert("id".to_string(), id.to_string());
    Path(path)
}

async fn create_draft(state: &Arc<AppState>) -> String {
    let (status, Json(created)) = create::create(
        Extension(state.clone()),
        HeaderMap::new(),
        Some(Json(json!({
            "title": "Monthly sales",
            "type": "SALES_SUMMARY",
            "parameters": {"month": "2025-12"},
            "createdBy": "u1"
        }))),
    )
    .await
    .expect("create");
    assert_eq!(status, StatusCode::CREATED);
    created["id"].as_str().expect("id").to_string()
}

#[tokio::test]
async fn queue_transitions_and_publishes_a_job() {
    let (state, mut receiver) = setup_state().await;
    let id = create_draft(&state).await;

    let Json(queued) = queue::queue(Extension(state.clone()), id_path(&id))
        .await
        .expect("queue");
    assert_eq!(queued["status"], "QUEUED");
    assert_eq!(queued["version"], 1);

    let message = receiver.try_recv().expect("job message published");
    assert_eq!(message.id.to_string(), id);
}

#[tokio::test]
async fn full_lifecycle_reaches_completed_with_result_reference() {
    let (state, mut receiver) = setup_state().await;
    let id = create_draft(&state).await;

    queue::queue(Extension(state.clone()), id_path(&id))
        .await
        .expect("queue");
    let job = receiver.try_recv().expect("published job");

    // Worker side: the same transitions the loop performs for each delivery.
    let processing = state
        .service
        .mark_processing(job.id)
        .await
        .expect("mark processing");
    assert_eq!(processing.status, "PROCESSING");
    assert_eq!(processing.version, 2);

    let url = format!("https://example.com/reports/{id}.json");
    let completed = state
        .service
        .mark_completed(job.id, &url)
        .await
        .expect("mark completed");
    assert_eq!(completed.status, "COMPLETED");
    assert_eq!(completed.version, 3);
    assert!(completed.completed_at.is_some());

    let parameters: serde_json::Value =
        serde_json::from_str(&completed.parameters).expect("parameters json");
    assert_eq!(parameters["month"], "2025-12");
    assert_eq!(parameters["resultUrl"], url.as_str());
}

#[tokio::test]
async fn queue_from_a_terminal_state_conflicts() {
    let (state, mut receiver) = setup_state().await;
    let id = create_draft(&state).await;
    let uuid: Uuid = id.parse().expect("uuid");

    queue::queue(Extension(state.clone()), id_path(&id))
        .await
        .expect("queue");
    receiver.try_recv().expect("published job");
    state.service.mark_processing(uuid).await.expect("processing");
    state
        .service
        .mark_completed(uuid, "https://example.com/reports/done.json")
        .await
        .expect("completed");

    let err = queue::queue(Extension(state.clone()), id_path(&id))
        .await
        .expect_err("terminal state");
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn cancel_is_rejected_once_processing_finished() {
    let (state, mut receiver) = setup_state().await;
    let id = create_draft(&state).await;

    // Cancel from DRAFT works.
    let Json(cancelled) = cancel::cancel(Extension(state.clone()), id_path(&id))
        .await
        .expect("cancel draft");
    assert_eq!(cancelled["status"], "CANCELLED");

    // A finished item can no longer be cancelled.
    let id2 = create_draft(&state).await;
    let uuid2: Uuid = id2.parse().expect("uuid");
    queue::queue(Extension(state.clone()), id_path(&id2))
        .await
        .expect("queue");
    receiver.try_recv().expect("published job");
    state.service.mark_processing(uuid2).await.expect("processing");
    state
        .service
        .mark_failed(uuid2, "boom")
        .await
        .expect("failed");

    let err = cancel::cancel(Extension(state.clone()), id_path(&id2))
        .await
        .expect_err("failed is terminal for cancel");
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn retry_requeues_a_failed_request_and_publishes_again() {
    let (state, mut receiver) = setup_state().await;
    let id = create_draft(&state).await;
    let uuid: Uuid = id.parse().expect("uuid");

    queue::queue(Extension(state.clone()), id_path(&id))
        .await
        .expect("queue");
    receiver.try_recv().expect("first publish");
    state.service.mark_processing(uuid).await.expect("processing");
    state
        .service
        .mark_failed(uuid, "Simulated processing failure")
        .await
        .expect("failed");

    let Json(retried) = retry::retry(Extension(state.clone()), id_path(&id))
        .await
        .expect("retry");
    assert_eq!(retried["status"], "QUEUED");
    assert!(retried.get("failureReason").is_none());

    let message = receiver.try_recv().expect("retry publish");
    assert_eq!(message.id, uuid);
}

#[tokio::test]
async fn retry_from_non_failed_state_conflicts() {
    let (state, _receiver) = setup_state().await;
    let id = create_draft(&state).await;

    let err = retry::retry(Extension(state.clone()), id_path(&id))
        .await
        .expect_err("draft cannot retry");
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
}
