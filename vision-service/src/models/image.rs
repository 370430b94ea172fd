use super::AnalysisRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ImageStatus {
    Processing,
    Completed,
    Failed,
}

impl ImageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageStatus::Processing => "processing",
            ImageStatus::Completed => "completed",
            ImageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One submitted image, as stored in the `images` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageRecord {
    pub id: i64,
    pub user_id: String,
    /// The base64 payload exactly as the caller sent it.
    pub image_data: String,
    pub status: ImageStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload; new images always start out `processing`.
#[derive(Debug, Clone, Serialize)]
pub struct NewImage {
    pub user_id: String,
    pub image_data: String,
    pub status: ImageStatus,
}

impl NewImage {
    pub fn processing(user_id: impl Into<String>, image_data: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            image_data: image_data.into(),
            status: ImageStatus::Processing,
        }
    }
}

/// An image row with its analyses embedded, as returned by the user listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageWithAnalysis {
    #[serde(flatten)]
    pub image: ImageRecord,
    #[serde(default)]
    pub analysis: Vec<AnalysisRecord>,
}
