use service_core::observability::init_tracing;
use vision_service::config::VisionConfig;
use vision_service::services::metrics::init_metrics;
use vision_service::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_metrics();

    let otlp_endpoint = std::env::var("OTLP_ENDPOINT").ok();
    init_tracing("vision-service", "info", otlp_endpoint.as_deref());

    let config = VisionConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    tracing::info!(
        store = config.store.backend_name(),
        model = %config.gemini.model,
        "Configuration loaded"
    );

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
