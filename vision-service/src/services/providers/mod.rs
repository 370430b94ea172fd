//! Inference provider abstraction and implementations.
//!
//! The gateway only depends on [`VisionProvider`], so Gemini can be swapped
//! for the mock in tests or local runs.

pub mod gemini;
pub mod mock;

use crate::services::image_payload::ImagePayload;
use async_trait::async_trait;
use thiserror::Error;

pub use gemini::{GeminiConfig, GeminiVisionProvider};
pub use mock::MockVisionProvider;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered: {0}")]
    ContentFiltered(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// A multimodal model that turns a prompt (and optionally an image) into text.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Describe `image` following `prompt`.
    async fn describe_image(
        &self,
        prompt: &str,
        image: &ImagePayload,
    ) -> Result<String, ProviderError>;

    /// Text-only generation; used by the inference liveness check.
    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Model identifier, for logs and metrics.
    fn model(&self) -> &str;
}
