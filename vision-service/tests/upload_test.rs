mod common;

use axum::http::{header, Method, StatusCode};
use base64::{engine::general_purpose::STANDARD, Engine};
use common::{json_body, TestApp, PNG_DATA_URL};
use serde_json::json;
use vision_service::models::ImageStatus;

#[tokio::test]
async fn upload_returns_completed_analysis() {
    let app = TestApp::with_store();

    let response = app
        .post_json("/upload-image", json!({ "image": PNG_DATA_URL, "user_id": "u1" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "completed");
    assert!(!body["analysis"].as_str().unwrap().is_empty());
    assert!(body["analysis_id"].is_i64());

    let image_id = body["image_id"].as_i64().unwrap();
    let stored = app.store().image(image_id).await.unwrap();
    assert_eq!(stored.status, ImageStatus::Completed);
    assert_eq!(stored.image_data, PNG_DATA_URL);
}

#[tokio::test]
async fn custom_prompt_reaches_the_model() {
    let app = TestApp::with_store();

    let body = json_body(
        app.post_json(
            "/upload-image",
            json!({ "image": PNG_DATA_URL, "user_id": "u1", "custom_prompt": "Count the dots" }),
        )
        .await,
    )
    .await;

    assert!(body["analysis"].as_str().unwrap().ends_with("Count the dots"));
}

#[tokio::test]
async fn missing_user_id_is_rejected_without_side_effects() {
    let app = TestApp::with_store();

    let response = app
        .post_json("/upload-image", json!({ "image": PNG_DATA_URL }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Missing image or user_id");

    assert_eq!(app.vision.calls(), 0);
    assert_eq!(app.store().image_count().await, 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::with_store();

    let response = app
        .request(Method::POST, "/upload-image", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn undecodable_image_fails_analysis() {
    let app = TestApp::with_store();

    let response = app
        .post_json(
            "/upload-image",
            json!({ "image": "data:image/png;base64,!!!", "user_id": "u1" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("AI analysis failed: "), "{}", error);
    assert_eq!(app.vision.calls(), 0);

    let image = app.store().image(1).await.unwrap();
    assert_eq!(image.status, ImageStatus::Failed);
}

#[tokio::test]
async fn photo_sized_upload_is_accepted() {
    let app = TestApp::with_store();

    let (_, payload) = PNG_DATA_URL.split_once(',').unwrap();
    let mut bytes = STANDARD.decode(payload).unwrap();
    bytes.resize(bytes.len() + 3 * 1024 * 1024, 0);
    let image = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));
    assert!(image.len() > 4 * 1024 * 1024);

    let response = app
        .post_json("/upload-image", json!({ "image": image, "user_id": "u1" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["status"], "completed");
    assert_eq!(app.vision.calls(), 1);
}

#[tokio::test]
async fn numeric_user_id_is_accepted() {
    let app = TestApp::with_store();

    let response = app
        .post_json("/upload-image", json!({ "image": PNG_DATA_URL, "user_id": 42 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let image = app.store().image(1).await.unwrap();
    assert_eq!(image.user_id, "42");
}

#[tokio::test]
async fn inference_failure_marks_image_failed() {
    let app = TestApp::with_failing_vision("model overloaded");

    let response = app
        .post_json("/upload-image", json!({ "image": PNG_DATA_URL, "user_id": "u1" }))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("AI analysis failed: "), "{}", error);
    assert!(error.contains("model overloaded"), "{}", error);

    let image = app.store().image(1).await.unwrap();
    assert_eq!(image.status, ImageStatus::Failed);
    assert!(!image.error_message.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn degraded_mode_still_analyzes() {
    let app = TestApp::without_store();

    let body = app.upload("u1").await;
    assert_eq!(body["image_id"], 1);
    assert!(body["analysis_id"].is_null());
    assert_eq!(body["status"], "completed");
}

#[tokio::test]
async fn wrong_method_is_not_allowed() {
    let app = TestApp::with_store();

    let response = app.get("/upload-image").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
