use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Extension, Json, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

use reporthub_db::{create_pool, DbConnectionConfig};
use reporthub_queue::{InMemoryQueue, JobReceiver};
use reporthub_server::handlers::report_requests::{create, list};
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

async fn seed(state: &Arc<AppState>, title: &str, report_type: &str, created_by: &str) {
    let (status, _) = create::create(
        Extension(state.clone()),
        HeaderMap::new(),
        Some(Json(json!({
            "title": title,
            "type": report_type,
            "createdBy": created_by
        }))),
    )
    .await
    .expect("create");
    assert_eq!(status, StatusCode::CREATED);
}

async fn list_with(
    state: &Arc<AppState>,
    query: &[(&str, &str)],
) -> serde_json::Value {
    let params: HashMap<String, String> = query
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let Json(listed) = list::list(Extension(state.clone()), Query(params))
        .await
        .expect("list");
    listed
}

#[tokio::test]
async fn three_rows_paginate_across_two_pages() {
    let (state, _receiver) = setup_state().await;
    seed(&state, "first", "SALES_SUMMARY", "u1").await;
    seed(&state, "second", "SALES_SUMMARY", "u1").await;
    seed(&state, "third", "SALES_SUMMARY", "u1").await;

    let page1 = list_with(
        &state,
        &[("pageSize", "2"), ("sort", "createdAt"), ("order", "asc")],
    )
    .await;
    assert_eq!(page1["data"].as_array().expect("data").len(), 2);
    assert_eq!(page1["data"][0]["title"], "first");
    assert_eq!(page1["data"][1]["title"], "second");
    assert_eq!(page1["pageInfo"]["page"], 1);
    assert_eq!(page1["pageInfo"]["pageSize"], 2);
    assert_eq!(page1["pageInfo"]["totalItems"], 3);
    assert_eq!(page1["pageInfo"]["totalPages"], 2);

    let page2 = list_with(
        &state,
        &[
            ("page", "2"),
            ("pageSize", "2"),
            ("sort", "createdAt"),
            ("order", "asc"),
        ],
    )
    .await;
    assert_eq!(page2["data"].as_array().expect("data").len(), 1);
    assert_eq!(page2["data"][0]["title"], "third");
}

#[tokio::test]
async fn default_order_is_newest_first() {
    let (state, _receiver) = setup_state().await;
    seed(&state, "older", "USER_EXPORT", "u1").await;
    seed(&state, "newer", "USER_EXPORT", "u1").await;

    let listed = list_with(&state, &[]).await;
    assert_eq!(listed["data"][0]["title"], "newer");
    assert_eq!(listed["data"][1]["title"], "older");
}

#[tokio::test]
async fn filters_constrain_the_scan() {
    let (state, _receiver) = setup_state().await;
    seed(&state, "sales", "SALES_SUMMARY", "alice").await;
    seed(&state, "export", "USER_EXPORT", "bob").await;
    seed(&state, "snapshot", "INVENTORY_SNAPSHOT", "alice").await;

    let by_type = list_with(&state, &[("type", "USER_EXPORT")]).await;
    assert_eq!(by_type["pageInfo"]["totalItems"], 1);
    assert_eq!(by_type["data"][0]["title"], "export");

    let by_creator = list_with(&state, &[("createdBy", "alice")]).await;
    assert_eq!(by_creator["pageInfo"]["totalItems"], 2);

    let by_status = list_with(&state, &[("status", "DRAFT")]).await;
    assert_eq!(by_status["pageInfo"]["totalItems"], 3);

    let none = list_with(&state, &[("status", "COMPLETED")]).await;
    assert_eq!(none["pageInfo"]["totalItems"], 0);
    assert_eq!(none["pageInfo"]["totalPages"], 0);
}

#[tokio::test]
async fn page_size_is_clamped_to_the_maximum() {
    let (state, _receiver) = setup_state().await;
    seed(&state, "only", "SALES_SUMMARY", "u1").await;

    let listed = list_with(&state, &[("pageSize", "1000")]).await;
    assert_eq!(listed["pageInfo"]["pageSize"], 100);
}

#[tokio::test]
async fn invalid_query_values_are_rejected() {
    let (state, _receiver) = setup_state().await;

    let params: HashMap<String, String> =
        [("status".to_string(), "DONE".to_string())].into_iter().collect();
    let err = list::list(Extension(state.clone()), Query(params))
        .await
        .expect_err("unknown status");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

    let params: HashMap<String, String> =
        [("page".to_string(), "0".to_string())].into_iter().collect();
    let err = list::list(Extension(state.clone()), Query(params))
        .await
        .expect_err("page must be at least 1");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);

    let params: HashMap<String, String> =
        [("sort".to_string(), "title".to_string())].into_iter().collect();
    let err = list::list(Extension(state.clone()), Query(params))
        .await
        .expect_err("sort key restricted");
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_rows_are_excluded_from_default_lists() {
    let (state, _receiver) = setup_state().await;
    seed(&state, "keep", "SALES_SUMMARY", "u1").await;
    seed(&state, "drop", "SALES_SUMMARY", "u1").await;

    let listed = list_with(&state, &[("order", "asc")]).await;
    let id = listed["data"][1]["id"].as_str().expect("id").to_string();
    let uuid: uuid::Uuid = id.parse().expect("uuid");
    state.service.soft_delete(uuid).await.expect("soft delete");

    let after = list_with(&state, &[]).await;
    assert_eq!(after["pageInfo"]["totalItems"], 1);
    assert_eq!(after["data"][0]["title"], "keep");

    let with_deleted = list_with(&state, &[("includeDeleted", "true")]).await;
    assert_eq!(with_deleted["pageInfo"]["totalItems"], 2);
}
