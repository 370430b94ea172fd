use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MONGODB_DATABASE: &str = "vision_db";

/// Value shipped in `.env.example`; treated the same as an unset URL.
const SUPABASE_URL_PLACEHOLDER: &str = "your_supabase_url_here";

#[derive(Debug, Clone)]
pub struct VisionConfig {
    pub common: core_config::Config,
    pub gemini: GeminiSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Secret<String>,
    pub model: String,
    pub api_base: String,
}

/// Which persistence collaborator, if any, backs the gateway.
#[derive(Debug, Clone)]
pub enum StoreSettings {
    Supabase { url: String, api_key: Secret<String> },
    Mongo { uri: String, database: String },
    Disabled,
}

impl VisionConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::resolve(common, |key| env::var(key).ok())
    }

    /// Load without the `APP__*` layer, for per-invocation handlers that never bind a port.
    pub fn load_from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::resolve(core_config::Config::default(), |key| env::var(key).ok())
    }

    pub fn resolve<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = lookup("GEMINI_API_KEY")
            .ok_or_else(|| AppError::config("GEMINI_API_KEY not configured"))?;

        Ok(VisionConfig {
            common,
            gemini: GeminiSettings {
                api_key: Secret::new(api_key),
                model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
                api_base: lookup("GEMINI_API_BASE")
                    .unwrap_or_else(|| DEFAULT_GEMINI_API_BASE.to_string()),
            },
            store: StoreSettings::resolve(&lookup),
        })
    }
}

impl StoreSettings {
    fn resolve(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        let supabase_url = lookup("SUPABASE_URL").filter(|url| url != SUPABASE_URL_PLACEHOLDER);

        if let (Some(url), Some(api_key)) = (supabase_url, lookup("SUPABASE_ANON_KEY")) {
            return StoreSettings::Supabase {
                url,
                api_key: Secret::new(api_key),
            };
        }

        if let Some(uri) = lookup("MONGODB_URI") {
            return StoreSettings::Mongo {
                uri,
                database: lookup("MONGODB_DATABASE")
                    .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
            };
        }

        StoreSettings::Disabled
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            StoreSettings::Supabase { .. } => "supabase",
            StoreSettings::Mongo { .. } => "mongodb",
            StoreSettings::Disabled => "disabled",
        }
    }
}
