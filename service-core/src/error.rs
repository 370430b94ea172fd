use thiserror::Error;

/// Startup and infrastructure failures.
///
/// Request-level failures have their own taxonomy in each service; this type
/// covers what happens before a router exists (configuration, binding
/// listeners, connecting to backing stores).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Database error: {0}")]
    DatabaseError(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn config(message: impl std::fmt::Display) -> Self {
        AppError::ConfigError(anyhow::anyhow!("{}", message))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_keep_their_message() {
        let err = AppError::config("GEMINI_API_KEY not configured");
        assert_eq!(
            err.to_string(),
            "Configuration error: GEMINI_API_KEY not configured"
        );
    }

    #[test]
    fn io_errors_become_internal() {
        let err: AppError = std::io::Error::other("bind failed").into();
        assert!(matches!(err, AppError::InternalError(_)));
    }
}
