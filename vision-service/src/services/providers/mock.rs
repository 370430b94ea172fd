//! Mock provider implementation for testing and offline runs.

use super::{ProviderError, VisionProvider};
use crate::services::image_payload::ImagePayload;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic provider: echoes the prompt and image shape, or always fails.
pub struct MockVisionProvider {
    failure: Option<String>,
    calls: AtomicUsize,
}

impl MockVisionProvider {
    pub fn new() -> Self {
        Self {
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call fails with `ProviderError::ApiError(message)`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of generation calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin(&self) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(ProviderError::ApiError(message.clone())),
            None => Ok(()),
        }
    }
}

impl Default for MockVisionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn describe_image(
        &self,
        prompt: &str,
        image: &ImagePayload,
    ) -> Result<String, ProviderError> {
        self.begin()?;
        Ok(format!(
            "Mock analysis of a {} byte {} image for: {}",
            image.len(),
            image.mime_type(),
            prompt
        ))
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, ProviderError> {
        self.begin()?;
        Ok(format!("Mock response for: {}", prompt))
    }

    fn model(&self) -> &str {
        "mock"
    }
}
