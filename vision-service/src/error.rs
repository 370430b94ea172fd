//! Request-boundary error taxonomy.
//!
//! Every gateway operation fails with a [`GatewayError`]; both the HTTP server
//! and the per-invocation handlers render it as `{"error": message}` with the
//! status from [`GatewayError::status_code`].

use crate::services::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// The image could not be analyzed, either because it failed to decode or
    /// because the inference collaborator failed. The payload is the raw reason.
    #[error("AI analysis failed: {0}")]
    Inference(String),

    #[error("{0}")]
    Persistence(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Authorization(String),

    /// The operation needs a store and the gateway runs without one.
    #[error("Storage backend not configured")]
    NotConfigured,
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Validation(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Authorization(_) => StatusCode::FORBIDDEN,
            GatewayError::Inference(_)
            | GatewayError::Persistence(_)
            | GatewayError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Store failures surface with their context, e.g. `Failed to store image: ...`.
    pub fn persistence(context: &str, err: StoreError) -> Self {
        GatewayError::Persistence(format!("{}: {}", context, err))
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
        }
    }

    /// Server errors at `error`, rejections at `warn`.
    pub fn log(&self) {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), error = %self, "Request rejected");
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        self.log();
        (self.status_code(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (GatewayError::Validation("x".into()), 400),
            (GatewayError::Inference("boom".into()), 500),
            (GatewayError::Persistence("x".into()), 500),
            (GatewayError::NotFound("x".into()), 404),
            (GatewayError::Authorization("x".into()), 403),
            (GatewayError::NotConfigured, 500),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status_code().as_u16(), expected, "{:?}", err);
        }
    }

    #[test]
    fn inference_message_is_prefixed() {
        let err = GatewayError::Inference("quota exceeded".into());
        assert_eq!(err.body().error, "AI analysis failed: quota exceeded");
    }
}
