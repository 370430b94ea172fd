//! Event and response shapes exchanged with the function host.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vision_service::error::GatewayError;

const ALLOW_ORIGIN: &str = "Access-Control-Allow-Origin";
const ALLOW_HEADERS: &str = "Access-Control-Allow-Headers";
const ALLOW_METHODS: &str = "Access-Control-Allow-Methods";
const CONTENT_TYPE: &str = "Content-Type";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionEvent {
    pub http_method: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl FunctionEvent {
    pub fn new(http_method: &str, body: Option<String>) -> Self {
        Self {
            http_method: http_method.to_string(),
            body,
            ..Default::default()
        }
    }

    pub fn is_method(&self, method: &str) -> bool {
        self.http_method.eq_ignore_ascii_case(method)
    }

    /// Request body as text, undoing the host's base64 transport encoding.
    pub fn body_text(&self) -> Result<String, GatewayError> {
        let body = self.body.clone().unwrap_or_default();
        if !self.is_base64_encoded {
            return Ok(body);
        }

        let bytes = STANDARD
            .decode(body.trim())
            .map_err(|e| GatewayError::Validation(format!("Invalid request body: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| GatewayError::Validation(format!("Invalid request body: {}", e)))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl FunctionResponse {
    /// Answer to a CORS preflight.
    pub fn preflight() -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(ALLOW_ORIGIN.to_string(), "*".to_string());
        headers.insert(
            ALLOW_HEADERS.to_string(),
            "Content-Type, Authorization".to_string(),
        );
        headers.insert(
            ALLOW_METHODS.to_string(),
            "GET, POST, PUT, DELETE, OPTIONS".to_string(),
        );

        Self {
            status_code: 200,
            headers,
            body: String::new(),
        }
    }

    pub fn json<T: Serialize>(status_code: u16, value: &T) -> Self {
        let mut headers = BTreeMap::new();
        headers.insert(ALLOW_ORIGIN.to_string(), "*".to_string());
        headers.insert(CONTENT_TYPE.to_string(), "application/json".to_string());

        match serde_json::to_string(value) {
            Ok(body) => Self {
                status_code,
                headers,
                body,
            },
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize response body");
                Self {
                    status_code: 500,
                    headers,
                    body: error_body("Failed to serialize response"),
                }
            }
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self::json(status_code, &serde_json::json!({ "error": message.into() }))
    }

    pub fn method_not_allowed() -> Self {
        Self::error(405, "Method not allowed")
    }
}

impl From<GatewayError> for FunctionResponse {
    fn from(err: GatewayError) -> Self {
        err.log();
        FunctionResponse::json(err.status_code().as_u16(), &err.body())
    }
}

fn error_body(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
