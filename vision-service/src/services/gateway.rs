//! The shared request logic behind both adapters.
//!
//! [`AnalysisGateway`] owns the two collaborators: the vision provider and the
//! (optional) analysis store. Every HTTP route and every function handler is a
//! thin wrapper over one of its methods.

use crate::config::VisionConfig;
use crate::dtos::{
    ImageUpload, UpdateAnalysisRequest, UpdateAnalysisResponse, UploadImageRequest,
    UploadImageResponse,
};
use crate::error::GatewayError;
use crate::models::{AnalysisRecord, ImageStatus, ImageWithAnalysis, NewAnalysis, NewImage};
use crate::services::image_payload::ImagePayload;
use crate::services::metrics;
use crate::services::providers::{GeminiConfig, GeminiVisionProvider, VisionProvider};
use crate::services::store::{AnalysisStore, Persistence};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Instant;

/// Image id reported when no store is configured.
pub const PLACEHOLDER_IMAGE_ID: i64 = 1;

pub const INFERENCE_CHECK_PROMPT: &str = "Say 'Hello! Gemini is working correctly.'";

#[derive(Clone)]
pub struct AnalysisGateway {
    persistence: Persistence,
    vision: Arc<dyn VisionProvider>,
}

impl AnalysisGateway {
    pub fn new(persistence: Persistence, vision: Arc<dyn VisionProvider>) -> Self {
        Self {
            persistence,
            vision,
        }
    }

    /// Build the production collaborators described by `config`.
    pub async fn connect(config: &VisionConfig) -> Result<Self, AppError> {
        let persistence = Persistence::connect(&config.store).await?;
        let vision = GeminiVisionProvider::new(GeminiConfig {
            api_key: config.gemini.api_key.clone(),
            model: config.gemini.model.clone(),
            api_base: config.gemini.api_base.clone(),
        });

        tracing::info!(
            store = persistence.backend(),
            model = %config.gemini.model,
            "Analysis gateway initialized"
        );

        Ok(Self::new(persistence, Arc::new(vision)))
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    pub fn model(&self) -> &str {
        self.vision.model()
    }

    pub async fn upload_and_analyze(
        &self,
        request: UploadImageRequest,
    ) -> Result<UploadImageResponse, GatewayError> {
        let upload = request.into_upload().inspect_err(|_| {
            metrics::record_upload("invalid");
        })?;
        self.analyze_upload(upload).await
    }

    /// Runs the upload flow for an already validated request.
    pub async fn analyze_upload(
        &self,
        upload: ImageUpload,
    ) -> Result<UploadImageResponse, GatewayError> {
        let result = self.run_upload(&upload).await;
        metrics::record_upload(match &result {
            Ok(_) => "completed",
            Err(GatewayError::Inference(_)) => "inference_failed",
            Err(_) => "persistence_failed",
        });
        result
    }

    async fn run_upload(&self, upload: &ImageUpload) -> Result<UploadImageResponse, GatewayError> {
        let store = self.persistence.store();

        let image_id = match store {
            Some(store) => {
                store
                    .insert_image(&NewImage::processing(&upload.user_id, &upload.image))
                    .await
                    .map_err(|e| GatewayError::persistence("Failed to store image", e))?
                    .ok_or_else(|| GatewayError::Persistence("Failed to store image".to_string()))?
                    .id
            }
            None => {
                tracing::warn!(user_id = %upload.user_id, "No store configured, analysis will not be persisted");
                PLACEHOLDER_IMAGE_ID
            }
        };

        tracing::info!(image_id, user_id = %upload.user_id, "Image accepted for analysis");

        let analysis_text = match self.describe(upload).await {
            Ok(text) => text,
            Err(err) => {
                if let Some(store) = store {
                    let reason = match &err {
                        GatewayError::Inference(reason) => reason.clone(),
                        other => other.to_string(),
                    };
                    mark_failed(store, image_id, &reason).await;
                }
                return Err(err);
            }
        };

        let analysis_id = match store {
            Some(store) => self.persist_analysis(store, image_id, upload, &analysis_text).await?,
            None => None,
        };

        tracing::info!(image_id, analysis_id = ?analysis_id, "Image analysis completed");

        Ok(UploadImageResponse {
            image_id,
            analysis: analysis_text,
            analysis_id,
            status: ImageStatus::Completed,
        })
    }

    /// Decoding counts as part of analysis: a payload the model could never
    /// read fails the same way a model error does.
    async fn describe(&self, upload: &ImageUpload) -> Result<String, GatewayError> {
        let image = ImagePayload::from_data_url(&upload.image)
            .map_err(|e| GatewayError::Inference(format!("Invalid image data: {}", e)))?;

        let started = Instant::now();
        let result = self
            .vision
            .describe_image(&upload.custom_prompt, &image)
            .await;
        metrics::record_inference(self.vision.model(), started.elapsed(), result.is_ok());

        result.map_err(|e| GatewayError::Inference(e.to_string()))
    }

    /// Inserts the analysis row, then flips the image to `completed`.
    /// The two writes are not atomic.
    async fn persist_analysis(
        &self,
        store: &dyn AnalysisStore,
        image_id: i64,
        upload: &ImageUpload,
        analysis_text: &str,
    ) -> Result<Option<i64>, GatewayError> {
        let analysis = NewAnalysis::completed(
            image_id,
            &upload.user_id,
            analysis_text,
            &upload.custom_prompt,
        );

        let record = match store.insert_analysis(&analysis).await {
            Ok(record) => record,
            Err(e) => {
                let err = GatewayError::persistence("Failed to store analysis", e);
                mark_failed(store, image_id, &err.to_string()).await;
                return Err(err);
            }
        };

        if let Err(e) = store
            .set_image_status(image_id, ImageStatus::Completed, None)
            .await
        {
            tracing::warn!(image_id, error = %e, "Analysis stored but image status update failed");
        }

        Ok(record.map(|r| r.id))
    }

    pub async fn analysis_for_image(&self, image_id: i64) -> Result<AnalysisRecord, GatewayError> {
        let store = self.persistence.require()?;

        store
            .analyses_for_image(image_id)
            .await
            .map_err(|e| GatewayError::persistence("Failed to fetch analysis", e))?
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::NotFound("Analysis not found".to_string()))
    }

    pub async fn images_for_user(&self, user_id: &str) -> Result<Vec<ImageWithAnalysis>, GatewayError> {
        let store = self.persistence.require()?;

        store
            .images_for_user(user_id)
            .await
            .map_err(|e| GatewayError::persistence("Failed to fetch images", e))
    }

    pub async fn edit_analysis(
        &self,
        analysis_id: i64,
        request: UpdateAnalysisRequest,
    ) -> Result<UpdateAnalysisResponse, GatewayError> {
        let result = self.run_edit(analysis_id, request).await;
        metrics::record_edit(match &result {
            Ok(_) => "updated",
            Err(GatewayError::Validation(_)) => "invalid",
            Err(GatewayError::NotFound(_)) => "not_found",
            Err(GatewayError::Authorization(_)) => "unauthorized",
            Err(_) => "error",
        });
        result
    }

    async fn run_edit(
        &self,
        analysis_id: i64,
        request: UpdateAnalysisRequest,
    ) -> Result<UpdateAnalysisResponse, GatewayError> {
        let store = self.persistence.require()?;
        let edit = request.into_edit()?;

        let existing = store
            .find_analysis(analysis_id)
            .await
            .map_err(|e| GatewayError::persistence("Failed to fetch analysis", e))?
            .ok_or_else(|| GatewayError::NotFound("Analysis not found".to_string()))?;

        if !existing.is_owned_by(&edit.user_id) {
            tracing::warn!(analysis_id, user_id = %edit.user_id, "Edit rejected: caller does not own analysis");
            return Err(GatewayError::Authorization("Unauthorized".to_string()));
        }

        let updated = store
            .update_analysis_text(analysis_id, &edit.analysis_text)
            .await
            .map_err(|e| GatewayError::persistence("Failed to update analysis", e))?;

        if updated == 0 {
            return Err(GatewayError::Persistence(
                "Failed to update analysis".to_string(),
            ));
        }

        tracing::info!(analysis_id, "Analysis edited");
        Ok(UpdateAnalysisResponse::updated(analysis_id))
    }

    /// Sends a canned text-only prompt and returns the model's reply.
    pub async fn check_inference(&self) -> Result<String, GatewayError> {
        let started = Instant::now();
        let result = self.vision.generate_text(INFERENCE_CHECK_PROMPT).await;
        metrics::record_inference(self.vision.model(), started.elapsed(), result.is_ok());

        result.map_err(|e| GatewayError::Inference(e.to_string()))
    }
}

/// Best effort: the caller already has an error to report.
async fn mark_failed(store: &dyn AnalysisStore, image_id: i64, reason: &str) {
    if let Err(e) = store
        .set_image_status(image_id, ImageStatus::Failed, Some(reason))
        .await
    {
        tracing::error!(image_id, error = %e, "Failed to mark image as failed");
    }
}
