use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAnalysisRequest {
    #[validate(required)]
    pub analysis_text: Option<String>,
    /// Claimed editor; must match the analysis owner.
    #[validate(required)]
    #[serde(default, deserialize_with = "super::string_or_number")]
    pub user_id: Option<String>,
}

impl UpdateAnalysisRequest {
    pub fn into_edit(self) -> Result<AnalysisEdit, GatewayError> {
        self.validate().map_err(|_| {
            GatewayError::Validation("Missing analysis_text or user_id".to_string())
        })?;

        Ok(AnalysisEdit {
            analysis_text: self.analysis_text.unwrap_or_default(),
            user_id: self.user_id.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisEdit {
    pub analysis_text: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateAnalysisResponse {
    pub message: String,
    pub analysis_id: i64,
}

impl UpdateAnalysisResponse {
    pub fn updated(analysis_id: i64) -> Self {
        Self {
            message: "Analysis updated successfully".to_string(),
            analysis_id,
        }
    }
}
