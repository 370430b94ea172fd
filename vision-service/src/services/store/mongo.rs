//! MongoDB store.
//!
//! Mirrors the relational layout: `images` and `analysis` collections keyed by
//! integer ids, which are issued from a `counters` collection so records keep
//! the same shape as the Supabase rows.

use super::{AnalysisStore, StoreError};
use crate::models::{AnalysisRecord, ImageRecord, ImageStatus, ImageWithAnalysis, NewAnalysis, NewImage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, serde_helpers::chrono_datetime_as_bson_datetime},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const IMAGES: &str = "images";
const ANALYSIS: &str = "analysis";
const COUNTERS: &str = "counters";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ImageDocument {
    #[serde(rename = "_id")]
    id: i64,
    user_id: String,
    image_data: String,
    status: ImageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<ImageDocument> for ImageRecord {
    fn from(doc: ImageDocument) -> Self {
        ImageRecord {
            id: doc.id,
            user_id: doc.user_id,
            image_data: doc.image_data,
            status: doc.status,
            error_message: doc.error_message,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnalysisDocument {
    #[serde(rename = "_id")]
    id: i64,
    image_id: i64,
    user_id: String,
    analysis_text: String,
    custom_prompt: String,
    status: String,
    is_edited: bool,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
}

impl From<AnalysisDocument> for AnalysisRecord {
    fn from(doc: AnalysisDocument) -> Self {
        AnalysisRecord {
            id: doc.id,
            image_id: doc.image_id,
            user_id: doc.user_id,
            analysis_text: doc.analysis_text,
            custom_prompt: doc.custom_prompt,
            status: doc.status,
            is_edited: doc.is_edited,
            created_at: doc.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Counter {
    seq: i64,
}

fn db_error(context: &str, e: mongodb::error::Error) -> StoreError {
    tracing::error!("{}: {}", context, e);
    StoreError::Database(format!("{}: {}", context, e))
}

#[derive(Clone)]
pub struct MongoStore {
    client: MongoClient,
    db: Database,
}

impl MongoStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri)
            .await
            .map_err(|e| db_error("Failed to connect to MongoDB", e))?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        tracing::info!("Creating MongoDB indexes for vision-service");

        let user_time_index = IndexModel::builder()
            .keys(doc! { "user_id": 1, "created_at": -1 })
            .options(
                IndexOptions::builder()
                    .name("user_time_idx".to_string())
                    .build(),
            )
            .build();
        self.images()
            .create_index(user_time_index, None)
            .await
            .map_err(|e| db_error("Failed to create user_time index", e))?;

        let image_id_index = IndexModel::builder()
            .keys(doc! { "image_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("image_id_idx".to_string())
                    .build(),
            )
            .build();
        self.analyses()
            .create_index(image_id_index, None)
            .await
            .map_err(|e| db_error("Failed to create image_id index", e))?;

        tracing::info!("Successfully created all MongoDB indexes");
        Ok(())
    }

    fn images(&self) -> Collection<ImageDocument> {
        self.db.collection(IMAGES)
    }

    fn analyses(&self) -> Collection<AnalysisDocument> {
        self.db.collection(ANALYSIS)
    }

    fn counters(&self) -> Collection<Counter> {
        self.db.collection(COUNTERS)
    }

    /// Next id in the named sequence, starting at 1.
    async fn next_id(&self, sequence: &str) -> Result<i64, StoreError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();

        let counter = self
            .counters()
            .find_one_and_update(
                doc! { "_id": sequence },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await
            .map_err(|e| db_error("Failed to allocate id", e))?;

        counter
            .map(|c| c.seq)
            .ok_or_else(|| StoreError::Database(format!("counter {} missing after upsert", sequence)))
    }
}

#[async_trait]
impl AnalysisStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn insert_image(&self, image: &NewImage) -> Result<Option<ImageRecord>, StoreError> {
        let document = ImageDocument {
            id: self.next_id(IMAGES).await?,
            user_id: image.user_id.clone(),
            image_data: image.image_data.clone(),
            status: image.status,
            error_message: None,
            created_at: Utc::now(),
        };

        self.images()
            .insert_one(&document, None)
            .await
            .map_err(|e| db_error("Failed to insert image", e))?;

        Ok(Some(document.into()))
    }

    async fn set_image_status(
        &self,
        image_id: i64,
        status: ImageStatus,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut set = doc! { "status": status.as_str() };
        if let Some(message) = error_message {
            set.insert("error_message", message);
        }

        self.images()
            .update_one(doc! { "_id": image_id }, doc! { "$set": set }, None)
            .await
            .map_err(|e| db_error("Failed to update image status", e))?;
        Ok(())
    }

    async fn insert_analysis(
        &self,
        analysis: &NewAnalysis,
    ) -> Result<Option<AnalysisRecord>, StoreError> {
        let document = AnalysisDocument {
            id: self.next_id(ANALYSIS).await?,
            image_id: analysis.image_id,
            user_id: analysis.user_id.clone(),
            analysis_text: analysis.analysis_text.clone(),
            custom_prompt: analysis.custom_prompt.clone(),
            status: analysis.status.clone(),
            is_edited: analysis.is_edited,
            created_at: Utc::now(),
        };

        self.analyses()
            .insert_one(&document, None)
            .await
            .map_err(|e| db_error("Failed to insert analysis", e))?;

        Ok(Some(document.into()))
    }

    async fn analyses_for_image(&self, image_id: i64) -> Result<Vec<AnalysisRecord>, StoreError> {
        let cursor = self
            .analyses()
            .find(doc! { "image_id": image_id }, None)
            .await
            .map_err(|e| db_error("Failed to query analyses", e))?;

        let documents: Vec<AnalysisDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| db_error("Failed to collect analyses", e))?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn images_for_user(&self, user_id: &str) -> Result<Vec<ImageWithAnalysis>, StoreError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1, "_id": -1 })
            .build();

        let images: Vec<ImageDocument> = self
            .images()
            .find(doc! { "user_id": user_id }, options)
            .await
            .map_err(|e| db_error("Failed to query images", e))?
            .try_collect()
            .await
            .map_err(|e| db_error("Failed to collect images", e))?;

        if images.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = images.iter().map(|i| i.id).collect();
        let analyses: Vec<AnalysisDocument> = self
            .analyses()
            .find(doc! { "image_id": { "$in": ids } }, None)
            .await
            .map_err(|e| db_error("Failed to query analyses", e))?
            .try_collect()
            .await
            .map_err(|e| db_error("Failed to collect analyses", e))?;

        let mut by_image: HashMap<i64, Vec<AnalysisRecord>> = HashMap::new();
        for analysis in analyses {
            by_image
                .entry(analysis.image_id)
                .or_default()
                .push(analysis.into());
        }

        Ok(images
            .into_iter()
            .map(|image| ImageWithAnalysis {
                analysis: by_image.remove(&image.id).unwrap_or_default(),
                image: image.into(),
            })
            .collect())
    }

    async fn find_analysis(&self, analysis_id: i64) -> Result<Option<AnalysisRecord>, StoreError> {
        let document = self
            .analyses()
            .find_one(doc! { "_id": analysis_id }, None)
            .await
            .map_err(|e| db_error("Failed to find analysis", e))?;
        Ok(document.map(Into::into))
    }

    async fn update_analysis_text(&self, analysis_id: i64, text: &str) -> Result<u64, StoreError> {
        let result = self
            .analyses()
            .update_one(
                doc! { "_id": analysis_id },
                doc! { "$set": { "analysis_text": text, "is_edited": true } },
                None,
            )
            .await
            .map_err(|e| db_error("Failed to update analysis", e))?;
        Ok(result.matched_count)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| db_error("MongoDB health check failed", e))?;
        Ok(())
    }
}
