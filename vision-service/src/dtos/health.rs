use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

impl HealthResponse {
    pub fn healthy(message: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            message: message.into(),
        }
    }
}

/// Body of `GET /test-gemini`; `response` is only present on success.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InferenceCheckResponse {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
}

impl InferenceCheckResponse {
    pub fn success(response: String) -> Self {
        Self {
            status: "success".to_string(),
            message: "Gemini integration working".to_string(),
            response: Some(response),
        }
    }

    pub fn failure(reason: impl std::fmt::Display) -> Self {
        Self {
            status: "error".to_string(),
            message: format!("Gemini integration failed: {}", reason),
            response: None,
        }
    }
}
