use super::{invalid_body, unknown_id};
use crate::dtos::{UploadImageRequest, UploadImageResponse};
use crate::error::GatewayError;
use crate::models::ImageWithAnalysis;
use crate::startup::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};

pub async fn upload_image(
    State(state): State<AppState>,
    payload: Result<Json<UploadImageRequest>, JsonRejection>,
) -> Result<Json<UploadImageResponse>, GatewayError> {
    let Json(request) = payload.map_err(invalid_body)?;
    let response = state.gateway.upload_and_analyze(request).await?;
    Ok(Json(response))
}

pub async fn user_images(
    State(state): State<AppState>,
    user_id: Result<Path<String>, PathRejection>,
) -> Result<Json<Vec<ImageWithAnalysis>>, GatewayError> {
    let Path(user_id) = user_id.map_err(unknown_id("User"))?;
    let images = state.gateway.images_for_user(&user_id).await?;
    Ok(Json(images))
}
