//! In-process store, for tests and local runs without a database.

use super::{AnalysisStore, StoreError};
use crate::models::{AnalysisRecord, ImageRecord, ImageStatus, ImageWithAnalysis, NewAnalysis, NewImage};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    images: Vec<ImageRecord>,
    analyses: Vec<AnalysisRecord>,
    next_image_id: i64,
    next_analysis_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one image row.
    pub async fn image(&self, image_id: i64) -> Option<ImageRecord> {
        let tables = self.tables.lock().await;
        tables.images.iter().find(|i| i.id == image_id).cloned()
    }

    pub async fn image_count(&self) -> usize {
        self.tables.lock().await.images.len()
    }

    pub async fn analysis_count(&self) -> usize {
        self.tables.lock().await.analyses.len()
    }
}

#[async_trait]
impl AnalysisStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert_image(&self, image: &NewImage) -> Result<Option<ImageRecord>, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.next_image_id += 1;

        let record = ImageRecord {
            id: tables.next_image_id,
            user_id: image.user_id.clone(),
            image_data: image.image_data.clone(),
            status: image.status,
            error_message: None,
            created_at: Utc::now(),
        };
        tables.images.push(record.clone());

        Ok(Some(record))
    }

    async fn set_image_status(
        &self,
        image_id: i64,
        status: ImageStatus,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        if let Some(image) = tables.images.iter_mut().find(|i| i.id == image_id) {
            image.status = status;
            if let Some(message) = error_message {
                image.error_message = Some(message.to_string());
            }
        }
        Ok(())
    }

    async fn insert_analysis(
        &self,
        analysis: &NewAnalysis,
    ) -> Result<Option<AnalysisRecord>, StoreError> {
        let mut tables = self.tables.lock().await;
        tables.next_analysis_id += 1;

        let record = AnalysisRecord {
            id: tables.next_analysis_id,
            image_id: analysis.image_id,
            user_id: analysis.user_id.clone(),
            analysis_text: analysis.analysis_text.clone(),
            custom_prompt: analysis.custom_prompt.clone(),
            status: analysis.status.clone(),
            is_edited: analysis.is_edited,
            created_at: Utc::now(),
        };
        tables.analyses.push(record.clone());

        Ok(Some(record))
    }

    async fn analyses_for_image(&self, image_id: i64) -> Result<Vec<AnalysisRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .analyses
            .iter()
            .filter(|a| a.image_id == image_id)
            .cloned()
            .collect())
    }

    async fn images_for_user(&self, user_id: &str) -> Result<Vec<ImageWithAnalysis>, StoreError> {
        let tables = self.tables.lock().await;

        let mut images: Vec<ImageWithAnalysis> = tables
            .images
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|image| ImageWithAnalysis {
                image: image.clone(),
                analysis: tables
                    .analyses
                    .iter()
                    .filter(|a| a.image_id == image.id)
                    .cloned()
                    .collect(),
            })
            .collect();

        // Ids break ties between rows created within the same clock tick.
        images.sort_by(|a, b| {
            b.image
                .created_at
                .cmp(&a.image.created_at)
                .then(b.image.id.cmp(&a.image.id))
        });

        Ok(images)
    }

    async fn find_analysis(&self, analysis_id: i64) -> Result<Option<AnalysisRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.analyses.iter().find(|a| a.id == analysis_id).cloned())
    }

    async fn update_analysis_text(&self, analysis_id: i64, text: &str) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().await;
        match tables.analyses.iter_mut().find(|a| a.id == analysis_id) {
            Some(analysis) => {
                analysis.analysis_text = text.to_string();
                analysis.is_edited = true;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listing_is_newest_first_with_nested_analyses() {
        let store = MemoryStore::new();
        let first = store
            .insert_image(&NewImage::processing("u1", "a"))
            .await
            .unwrap()
            .unwrap();
        let second = store
            .insert_image(&NewImage::processing("u1", "b"))
            .await
            .unwrap()
            .unwrap();
        store
            .insert_image(&NewImage::processing("someone-else", "c"))
            .await
            .unwrap();
        store
            .insert_analysis(&NewAnalysis::completed(first.id, "u1", "text", "prompt"))
            .await
            .unwrap();

        let images = store.images_for_user("u1").await.unwrap();
        let ids: Vec<i64> = images.iter().map(|i| i.image.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert_eq!(images[1].analysis.len(), 1);
        assert!(images[0].analysis.is_empty());
    }

    #[tokio::test]
    async fn updating_unknown_analysis_touches_nothing() {
        let store = MemoryStore::new();
        assert_eq!(store.update_analysis_text(42, "x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_status_keeps_error_message() {
        let store = MemoryStore::new();
        let image = store
            .insert_image(&NewImage::processing("u1", "a"))
            .await
            .unwrap()
            .unwrap();

        store
            .set_image_status(image.id, ImageStatus::Failed, Some("boom"))
            .await
            .unwrap();

        let stored = store.image(image.id).await.unwrap();
        assert_eq!(stored.status, ImageStatus::Failed);
        assert_eq!(stored.error_message.as_deref(), Some("boom"));
    }
}
