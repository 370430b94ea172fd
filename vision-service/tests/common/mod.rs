#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use std::sync::Arc;
use tower::util::ServiceExt;
use vision_service::services::providers::MockVisionProvider;
use vision_service::services::store::MemoryStore;
use vision_service::services::{AnalysisGateway, Persistence};
use vision_service::startup::{build_router, AppState};

/// Smallest valid PNG as a data URL.
pub const PNG_DATA_URL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub struct TestApp {
    pub router: Router,
    pub store: Option<Arc<MemoryStore>>,
    pub vision: Arc<MockVisionProvider>,
}

impl TestApp {
    pub fn with_store() -> Self {
        Self::build(Some(Arc::new(MemoryStore::new())), MockVisionProvider::new())
    }

    pub fn without_store() -> Self {
        Self::build(None, MockVisionProvider::new())
    }

    pub fn with_failing_vision(message: &str) -> Self {
        Self::build(
            Some(Arc::new(MemoryStore::new())),
            MockVisionProvider::failing(message),
        )
    }

    fn build(store: Option<Arc<MemoryStore>>, vision: MockVisionProvider) -> Self {
        let vision = Arc::new(vision);
        let persistence = match &store {
            Some(store) => Persistence::configured(store.clone()),
            None => Persistence::disabled(),
        };
        let gateway = AnalysisGateway::new(persistence, vision.clone());

        Self {
            router: build_router(AppState { gateway }),
            store,
            vision,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        self.store.as_deref().expect("test app has no store")
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.request(Method::PUT, uri, Some(body)).await
    }

    /// Upload the test PNG for `user_id` and return the response body.
    pub async fn upload(&self, user_id: &str) -> serde_json::Value {
        let response = self
            .post_json(
                "/upload-image",
                serde_json::json!({ "image": PNG_DATA_URL, "user_id": user_id }),
            )
            .await;
        assert_eq!(response.status(), 200);
        json_body(response).await
    }
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text_body(response: Response<Body>) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
