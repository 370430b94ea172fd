pub mod analysis;
pub mod health;
pub mod images;

pub use analysis::{get_analysis, update_analysis};
pub use health::{health_check, metrics_endpoint, test_inference};
pub use images::{upload_image, user_images};

use crate::error::GatewayError;
use axum::extract::rejection::{JsonRejection, PathRejection};

/// Malformed or non-JSON bodies are reported like missing fields.
pub(crate) fn invalid_body(rejection: JsonRejection) -> GatewayError {
    GatewayError::Validation(format!("Invalid request body: {}", rejection.body_text()))
}

/// A path id that is not an integer cannot name a row.
pub(crate) fn unknown_id(resource: &str) -> impl FnOnce(PathRejection) -> GatewayError + '_ {
    move |_| GatewayError::NotFound(format!("{} not found", resource))
}
