use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ANALYSIS_STATUS_COMPLETED: &str = "completed";

/// One inference result, as stored in the `analysis` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRecord {
    pub id: i64,
    pub image_id: i64,
    /// Owner; edits are only accepted from this user.
    pub user_id: String,
    pub analysis_text: String,
    pub custom_prompt: String,
    pub status: String,
    pub is_edited: bool,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAnalysis {
    pub image_id: i64,
    pub user_id: String,
    pub analysis_text: String,
    pub custom_prompt: String,
    pub status: String,
    pub is_edited: bool,
}

impl NewAnalysis {
    pub fn completed(
        image_id: i64,
        user_id: impl Into<String>,
        analysis_text: impl Into<String>,
        custom_prompt: impl Into<String>,
    ) -> Self {
        Self {
            image_id,
            user_id: user_id.into(),
            analysis_text: analysis_text.into(),
            custom_prompt: custom_prompt.into(),
            status: ANALYSIS_STATUS_COMPLETED.to_string(),
            is_edited: false,
        }
    }
}
