//! Supabase store, spoken to over its PostgREST interface (`/rest/v1`).

use super::{AnalysisStore, StoreError};
use crate::models::{AnalysisRecord, ImageRecord, ImageStatus, ImageWithAnalysis, NewAnalysis, NewImage};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

const IMAGES_TABLE: &str = "images";
const ANALYSIS_TABLE: &str = "analysis";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SupabaseStore {
    rest_url: String,
    api_key: Secret<String>,
    client: Client,
}

impl SupabaseStore {
    pub fn new(project_url: &str, api_key: Secret<String>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Failed to build Supabase HTTP client, using default client");
                Client::default()
            });

        Self {
            rest_url: format!("{}/rest/v1", project_url.trim_end_matches('/')),
            api_key,
            client,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.rest_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.api_key.expose_secret();
        request
            .header("apikey", key)
            .bearer_auth(key)
    }

    fn select(&self, table: &str) -> RequestBuilder {
        self.authorize(self.client.get(self.table_url(table)))
    }

    fn insert(&self, table: &str) -> RequestBuilder {
        self.authorize(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
    }

    fn update(&self, table: &str) -> RequestBuilder {
        self.authorize(self.client.patch(self.table_url(table)))
            .header("Prefer", "return=representation")
    }

    async fn send(request: RequestBuilder) -> Result<Response, StoreError> {
        let response = request
            .send()
            .await
            .map_err(|e| StoreError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn rows<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>, StoreError> {
        Self::send(request)
            .await?
            .json::<Vec<T>>()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{}", value)
}

#[async_trait]
impl AnalysisStore for SupabaseStore {
    fn backend(&self) -> &'static str {
        "supabase"
    }

    async fn insert_image(&self, image: &NewImage) -> Result<Option<ImageRecord>, StoreError> {
        let rows: Vec<ImageRecord> = Self::rows(self.insert(IMAGES_TABLE).json(image)).await?;
        Ok(rows.into_iter().next())
    }

    async fn set_image_status(
        &self,
        image_id: i64,
        status: ImageStatus,
        error_message: Option<&str>,
    ) -> Result<(), StoreError> {
        let body = match error_message {
            Some(message) => json!({ "status": status, "error_message": message }),
            None => json!({ "status": status }),
        };

        Self::send(
            self.update(IMAGES_TABLE)
                .query(&[("id", eq(image_id))])
                .json(&body),
        )
        .await?;
        Ok(())
    }

    async fn insert_analysis(
        &self,
        analysis: &NewAnalysis,
    ) -> Result<Option<AnalysisRecord>, StoreError> {
        let rows: Vec<AnalysisRecord> =
            Self::rows(self.insert(ANALYSIS_TABLE).json(analysis)).await?;
        Ok(rows.into_iter().next())
    }

    async fn analyses_for_image(&self, image_id: i64) -> Result<Vec<AnalysisRecord>, StoreError> {
        Self::rows(
            self.select(ANALYSIS_TABLE)
                .query(&[("select", "*".to_string()), ("image_id", eq(image_id))]),
        )
        .await
    }

    async fn images_for_user(&self, user_id: &str) -> Result<Vec<ImageWithAnalysis>, StoreError> {
        Self::rows(self.select(IMAGES_TABLE).query(&[
            ("select", "*,analysis(*)".to_string()),
            ("user_id", eq(user_id)),
            ("order", "created_at.desc".to_string()),
        ]))
        .await
    }

    async fn find_analysis(&self, analysis_id: i64) -> Result<Option<AnalysisRecord>, StoreError> {
        let rows: Vec<AnalysisRecord> = Self::rows(
            self.select(ANALYSIS_TABLE)
                .query(&[("select", "*".to_string()), ("id", eq(analysis_id))]),
        )
        .await?;
        Ok(rows.into_iter().next())
    }

    async fn update_analysis_text(&self, analysis_id: i64, text: &str) -> Result<u64, StoreError> {
        let rows: Vec<serde_json::Value> = Self::rows(
            self.update(ANALYSIS_TABLE)
                .query(&[("id", eq(analysis_id))])
                .json(&json!({ "analysis_text": text, "is_edited": true })),
        )
        .await?;
        Ok(rows.len() as u64)
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Self::send(
            self.select(IMAGES_TABLE)
                .query(&[("select", "id"), ("limit", "1")]),
        )
        .await?;
        Ok(())
    }
}
