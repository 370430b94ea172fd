use crate::event::{FunctionEvent, FunctionResponse};
use service_core::error::AppError;
use std::future::Future;
use vision_service::dtos::{HealthResponse, UploadImageRequest};
use vision_service::error::GatewayError;
use vision_service::services::AnalysisGateway;

pub fn health(event: &FunctionEvent) -> FunctionResponse {
    if event.is_method("OPTIONS") {
        return FunctionResponse::preflight();
    }
    if !event.is_method("GET") {
        return FunctionResponse::method_not_allowed();
    }

    FunctionResponse::json(200, &HealthResponse::healthy("Function is running"))
}

/// Upload-and-analyze for one invocation.
///
/// `connect` builds the gateway; it only runs once the request has passed
/// validation, so malformed requests never need configuration.
pub async fn upload_image<F, Fut>(event: &FunctionEvent, connect: F) -> FunctionResponse
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<AnalysisGateway, AppError>>,
{
    if event.is_method("OPTIONS") {
        return FunctionResponse::preflight();
    }
    if !event.is_method("POST") {
        return FunctionResponse::method_not_allowed();
    }

    let upload = match parse_upload(event) {
        Ok(upload) => upload,
        Err(e) => return e.into(),
    };

    let gateway = match connect().await {
        Ok(gateway) => gateway,
        Err(e) => {
            tracing::error!(error = %e, "Failed to initialize gateway");
            return FunctionResponse::error(500, startup_message(&e));
        }
    };

    match gateway.analyze_upload(upload).await {
        Ok(response) => FunctionResponse::json(200, &response),
        Err(e) => e.into(),
    }
}

fn parse_upload(event: &FunctionEvent) -> Result<vision_service::dtos::ImageUpload, GatewayError> {
    let body = event.body_text()?;
    let request: UploadImageRequest = serde_json::from_str(&body)
        .map_err(|e| GatewayError::Validation(format!("Invalid request body: {}", e)))?;
    request.into_upload()
}

/// Configuration failures surface with their bare message, e.g. `GEMINI_API_KEY not configured`.
fn startup_message(err: &AppError) -> String {
    match err {
        AppError::ConfigError(inner) => inner.to_string(),
        other => other.to_string(),
    }
}
