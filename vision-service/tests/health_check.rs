mod common;

use axum::http::StatusCode;
use common::{json_body, text_body, TestApp};

#[tokio::test]
async fn health_check_is_stable() {
    let app = TestApp::without_store();

    let first = app.get("/health").await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = json_body(first).await;
    assert_eq!(first["status"], "healthy");

    let second = json_body(app.get("/health").await).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn inference_check_reports_success() {
    let app = TestApp::without_store();

    let response = app.get("/test-gemini").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "success");
    assert!(body["response"].as_str().unwrap().contains("Hello! Gemini is working correctly."));
    assert_eq!(app.vision.calls(), 1);
}

#[tokio::test]
async fn inference_check_reports_failure() {
    let app = TestApp::with_failing_vision("invalid api key");

    let response = app.get("/test-gemini").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert!(body["message"].as_str().unwrap().contains("invalid api key"));
    assert!(body.get("response").is_none());
}

#[tokio::test]
async fn metrics_endpoint_answers_text() {
    let app = TestApp::without_store();

    let response = app.get("/metrics").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!text_body(response).await.is_empty());
}
