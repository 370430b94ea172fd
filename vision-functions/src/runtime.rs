//! Stdin/stdout driver: one event in, one response out.

use crate::event::{FunctionEvent, FunctionResponse};
use service_core::error::AppError;
use std::future::Future;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use vision_service::config::VisionConfig;
use vision_service::services::AnalysisGateway;

/// Parse `input` as an event and run `handler` on it.
pub async fn invoke<F, Fut>(input: &str, handler: F) -> FunctionResponse
where
    F: FnOnce(FunctionEvent) -> Fut,
    Fut: Future<Output = FunctionResponse>,
{
    match serde_json::from_str::<FunctionEvent>(input) {
        Ok(event) => {
            tracing::info!(method = %event.http_method, path = %event.path, "Invocation received");
            handler(event).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Malformed invocation event");
            FunctionResponse::error(400, format!("Invalid event: {}", e))
        }
    }
}

/// Read one event from stdin, handle it, and write the response to stdout.
pub async fn serve_once<F, Fut>(handler: F) -> anyhow::Result<()>
where
    F: FnOnce(FunctionEvent) -> Fut,
    Fut: Future<Output = FunctionResponse>,
{
    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;

    let response = invoke(&input, handler).await;
    tracing::info!(status = response.status_code, "Invocation completed");

    let mut stdout = tokio::io::stdout();
    stdout.write_all(serde_json::to_string(&response)?.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}

/// Builds the production gateway from the process environment.
pub async fn connect_from_env() -> Result<AnalysisGateway, AppError> {
    let config = VisionConfig::load_from_env()?;
    AnalysisGateway::connect(&config).await
}
