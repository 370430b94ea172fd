use crate::dtos::{HealthResponse, InferenceCheckResponse};
use crate::services::metrics::get_metrics;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy("Vision API is running"))
}

/// Round-trips a canned prompt through the vision provider.
pub async fn test_inference(State(state): State<AppState>) -> impl IntoResponse {
    match state.gateway.check_inference().await {
        Ok(reply) => (StatusCode::OK, Json(InferenceCheckResponse::success(reply))),
        Err(e) => {
            tracing::error!(error = %e, "Inference check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InferenceCheckResponse::failure(e)),
            )
        }
    }
}

pub async fn metrics_endpoint() -> String {
    get_metrics()
}
