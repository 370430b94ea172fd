//! Persistence collaborator: the `images` and `analysis` tables.
//!
//! The gateway talks to an [`AnalysisStore`] through [`Persistence`], which is
//! either configured or explicitly absent (degraded mode).

pub mod memory;
pub mod mongo;
pub mod supabase;

use crate::config::StoreSettings;
use crate::error::GatewayError;
use crate::models::{AnalysisRecord, ImageRecord, ImageStatus, ImageWithAnalysis, NewAnalysis, NewImage};
use async_trait::async_trait;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use supabase::SupabaseStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("store returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Insert an image row. `Ok(None)` means the store accepted the write but
    /// returned no row.
    async fn insert_image(&self, image: &NewImage) -> Result<Option<ImageRecord>, StoreError>;

    /// Set the status of an image; `error_message` is written alongside
    /// `failed`.
    async fn set_image_status(
        &self,
        image_id: i64,
        status: ImageStatus,
        error_message: Option<&str>,
    ) -> Result<(), StoreError>;

    async fn insert_analysis(
        &self,
        analysis: &NewAnalysis,
    ) -> Result<Option<AnalysisRecord>, StoreError>;

    async fn analyses_for_image(&self, image_id: i64) -> Result<Vec<AnalysisRecord>, StoreError>;

    /// All images for a user with nested analyses, newest first.
    async fn images_for_user(&self, user_id: &str) -> Result<Vec<ImageWithAnalysis>, StoreError>;

    async fn find_analysis(&self, analysis_id: i64) -> Result<Option<AnalysisRecord>, StoreError>;

    /// Overwrite the text and mark the analysis edited. Returns affected rows.
    async fn update_analysis_text(&self, analysis_id: i64, text: &str) -> Result<u64, StoreError>;

    /// Cheap round trip proving the backend is reachable.
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Optional store capability.
///
/// Operations that need a store call [`Persistence::require`]; the upload flow
/// checks [`Persistence::store`] and falls back to degraded mode.
#[derive(Clone, Default)]
pub struct Persistence(Option<Arc<dyn AnalysisStore>>);

impl Persistence {
    pub fn configured(store: Arc<dyn AnalysisStore>) -> Self {
        Persistence(Some(store))
    }

    pub fn disabled() -> Self {
        Persistence(None)
    }

    pub fn store(&self) -> Option<&dyn AnalysisStore> {
        self.0.as_deref()
    }

    pub fn require(&self) -> Result<&dyn AnalysisStore, GatewayError> {
        self.store().ok_or(GatewayError::NotConfigured)
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    pub fn backend(&self) -> &'static str {
        self.store().map(|s| s.backend()).unwrap_or("disabled")
    }

    /// Checks the configured backend is reachable. Degraded mode has nothing
    /// to check and always passes.
    pub async fn check_health(&self) -> Result<(), StoreError> {
        match self.store() {
            Some(store) => store.health_check().await,
            None => Ok(()),
        }
    }

    /// Build the store described by `settings`.
    pub async fn connect(settings: &StoreSettings) -> Result<Self, AppError> {
        match settings {
            StoreSettings::Supabase { url, api_key } => {
                let store = SupabaseStore::new(url, api_key.clone());
                Ok(Persistence::configured(Arc::new(store)))
            }
            StoreSettings::Mongo { uri, database } => {
                let store = MongoStore::connect(uri, database).await.map_err(|e| {
                    tracing::error!("Failed to connect to MongoDB: {}", e);
                    AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
                })?;
                store.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    AppError::DatabaseError(anyhow::anyhow!(e.to_string()))
                })?;
                Ok(Persistence::configured(Arc::new(store)))
            }
            StoreSettings::Disabled => {
                tracing::warn!("No storage backend configured; running in degraded mode");
                Ok(Persistence::disabled())
            }
        }
    }
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Persistence").field(&self.backend()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_persistence_requires_fail_with_not_configured() {
        let persistence = Persistence::disabled();
        assert!(!persistence.is_configured());
        assert!(matches!(
            persistence.require(),
            Err(GatewayError::NotConfigured)
        ));
        assert_eq!(persistence.backend(), "disabled");
    }

    #[test]
    fn configured_persistence_exposes_store() {
        let persistence = Persistence::configured(Arc::new(MemoryStore::new()));
        assert!(persistence.is_configured());
        assert_eq!(persistence.require().unwrap().backend(), "memory");
    }

    #[tokio::test]
    async fn health_follows_the_backend() {
        assert!(Persistence::disabled().check_health().await.is_ok());
        assert!(Persistence::configured(Arc::new(MemoryStore::new()))
            .check_health()
            .await
            .is_ok());
    }
}
