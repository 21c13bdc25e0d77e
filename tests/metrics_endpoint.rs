mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{app_and_lib, build_app};
use tower::ServiceExt;

async fn get(app: &Router, path: &str) -> (StatusCode, Option<String>, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(path)
                .body(Body::empty())
                .expect("failed to build request"),
        )
        .await
        .expect("request failed");

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    (status, content_type, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn metrics_expose_repository_samples() {
    let (app, _metrics) = build_app(&app_and_lib());
    let (status, content_type, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        content_type.as_deref(),
        Some("text/plain; version=0.0.4; charset=utf-8")
    );
    assert!(body.contains("dronedb_repo_last_build_id{repo=\"app\"} 6"));
    assert!(body.contains("dronedb_repo_last_successful_build_id{repo=\"app\"} 5"));
    assert!(body.contains("dronedb_repo_last_build_time{repo=\"app\"} 5"));
    assert!(body.contains("dronedb_repo_last_successful_build_time{repo=\"app\"} 10"));
    assert!(!body.contains("repo=\"lib\""));
    assert!(body.contains("dronedb_up 1"));
    assert!(body.contains("dronedb_active_repositories 1"));
}

#[tokio::test]
async fn each_family_has_a_single_header() {
    let db = app_and_lib()
        .repo("web", 5, true)
        .build(common::build(5, 2, "success", 0, Some(7)));
    let (app, _metrics) = build_app(&db);
    let (_, _, body) = get(&app, "/metrics").await;

    assert_eq!(
        body.matches("# TYPE dronedb_repo_last_build_id counter").count(),
        1
    );
    assert_eq!(
        body.matches("# TYPE dronedb_repo_last_build_time gauge").count(),
        1
    );
    assert!(body.contains("dronedb_repo_last_build_id{repo=\"web\"} 2"));
}

#[tokio::test]
async fn connection_failure_reports_down_without_repository_metrics() {
    let (app, _metrics) = build_app(&app_and_lib().refuse_connections());
    let (status, _, body) = get(&app, "/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("dronedb_up 0"));
    assert!(body.contains("dronedb_scrape_errors_total 1"));
    assert!(!body.contains("dronedb_repo_"));
}

#[tokio::test]
async fn active_repositories_reset_when_the_database_goes_away() {
    let db = app_and_lib();
    let (app, _metrics) = build_app(&db);
    let (_, _, body) = get(&app, "/metrics").await;
    assert!(body.contains("dronedb_active_repositories 1"));

    db.go_down();
    let (status, _, body) = get(&app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("dronedb_up 0"));
    assert!(body.contains("dronedb_active_repositories 0"));
    assert!(!body.contains("dronedb_repo_"));
}

#[tokio::test]
async fn failed_queries_are_counted() {
    let db = app_and_lib().fail_queries(1, "SELECT build_number");
    let (app, _metrics) = build_app(&db);
    let (_, _, body) = get(&app, "/metrics").await;

    assert!(body.contains("dronedb_query_failures_total{query=\"last_build_id\"} 1"));
    assert!(body.contains("dronedb_query_failures_total{query=\"last_successful_build_id\"} 1"));
    assert!(!body.contains("dronedb_repo_last_build_id"));
    assert!(body.contains("dronedb_repo_last_build_time{repo=\"app\"} 5"));
    assert!(body.contains("dronedb_up 1"));
}

#[tokio::test]
async fn health_does_not_touch_the_database() {
    let db = app_and_lib().refuse_connections();
    let (app, _metrics) = build_app(&db);
    let (status, _, body) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}
