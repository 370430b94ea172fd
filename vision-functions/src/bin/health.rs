use service_core::observability::init_stderr_tracing;
use vision_functions::handlers;
use vision_functions::runtime::serve_once;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_stderr_tracing("info");
    serve_once(|event| async move { handlers::health(&event) }).await
}
