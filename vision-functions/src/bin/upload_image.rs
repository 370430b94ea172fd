use service_core::observability::init_stderr_tracing;
use vision_functions::handlers;
use vision_functions::runtime::{connect_from_env, serve_once};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_stderr_tracing("info");
    serve_once(|event| async move { handlers::upload_image(&event, connect_from_env).await }).await
}
