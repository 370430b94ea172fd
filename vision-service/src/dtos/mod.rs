pub mod analysis;
pub mod health;
pub mod images;

pub use analysis::{AnalysisEdit, UpdateAnalysisRequest, UpdateAnalysisResponse};
pub use health::{HealthResponse, InferenceCheckResponse};
pub use images::{ImageUpload, UploadImageRequest, UploadImageResponse, DEFAULT_PROMPT};

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Number(serde_json::Number),
}

/// Accepts a user id sent as either a JSON string or a JSON number.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(|id| match id {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    }))
}
