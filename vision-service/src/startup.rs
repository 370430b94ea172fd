//! Application startup and lifecycle management.

use crate::config::VisionConfig;
use crate::handlers;
use crate::services::AnalysisGateway;
use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{metrics_middleware, request_id_middleware, RequestId};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Ceiling for request bodies. Uploads arrive as base64 JSON, so a few
/// phone photos' worth of headroom is needed over the raw image size.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub gateway: AnalysisGateway,
}

/// Every route, wrapped in request-id, tracing, metrics and CORS layers.
///
/// CORS is outermost so that preflight requests are answered before routing
/// and error responses still carry `Access-Control-Allow-Origin`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    let trace = TraceLayer::new_for_http().make_span_with(|req: &Request| {
        let request_id = req
            .extensions()
            .get::<RequestId>()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default();
        tracing::info_span!(
            "http_request",
            method = %req.method(),
            uri = %req.uri(),
            request_id = %request_id,
        )
    });

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/test-gemini", get(handlers::test_inference))
        .route("/metrics", get(handlers::metrics_endpoint))
        .route("/upload-image", post(handlers::upload_image))
        .route("/analysis/:image_id", get(handlers::get_analysis))
        .route("/user-images/:user_id", get(handlers::user_images))
        .route("/update-analysis/:analysis_id", put(handlers::update_analysis))
        .layer(from_fn(metrics_middleware))
        .layer(trace)
        .layer(from_fn(request_id_middleware))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    pub async fn build(config: VisionConfig) -> Result<Self, AppError> {
        let gateway = AnalysisGateway::connect(&config).await?;

        // An unreachable store is not fatal; each request reports its own failure.
        let persistence = gateway.persistence();
        match persistence.check_health().await {
            Ok(()) => tracing::info!(store = persistence.backend(), "Storage backend reachable"),
            Err(e) => tracing::warn!(
                store = persistence.backend(),
                error = %e,
                "Storage backend health check failed"
            ),
        }

        Self::build_with_gateway(config.common.port, gateway).await
    }

    /// Bind `port` (0 picks a free one) and serve the given gateway.
    pub async fn build_with_gateway(port: u16, gateway: AnalysisGateway) -> Result<Self, AppError> {
        let router = build_router(AppState { gateway });

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
