use crate::error::GatewayError;
use crate::models::ImageStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_PROMPT: &str = "Describe the contents of this image in detail. Be specific about objects, people, colors, and activities you see.";

/// Body of `POST /upload-image`. Fields are optional so that a missing field
/// is reported as a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UploadImageRequest {
    /// Base64 image, usually a data URL.
    #[validate(required)]
    pub image: Option<String>,
    #[validate(required)]
    #[serde(default, deserialize_with = "super::string_or_number")]
    pub user_id: Option<String>,
    pub custom_prompt: Option<String>,
}

impl UploadImageRequest {
    pub fn into_upload(self) -> Result<ImageUpload, GatewayError> {
        self.validate()
            .map_err(|_| GatewayError::Validation("Missing image or user_id".to_string()))?;

        let custom_prompt = self
            .custom_prompt
            .filter(|p| !p.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());

        Ok(ImageUpload {
            image: self.image.unwrap_or_default(),
            user_id: self.user_id.unwrap_or_default(),
            custom_prompt,
        })
    }
}

/// A validated upload with the prompt resolved.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub image: String,
    pub user_id: String,
    pub custom_prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadImageResponse {
    pub image_id: i64,
    pub analysis: String,
    /// `null` when running without a store or when the insert returned no row.
    pub analysis_id: Option<i64>,
    pub status: ImageStatus,
}
