use super::{invalid_body, unknown_id};
use crate::dtos::{UpdateAnalysisRequest, UpdateAnalysisResponse};
use crate::error::GatewayError;
use crate::models::AnalysisRecord;
use crate::startup::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};

pub async fn get_analysis(
    State(state): State<AppState>,
    image_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<AnalysisRecord>, GatewayError> {
    let Path(image_id) = image_id.map_err(unknown_id("Analysis"))?;
    let analysis = state.gateway.analysis_for_image(image_id).await?;
    Ok(Json(analysis))
}

pub async fn update_analysis(
    State(state): State<AppState>,
    analysis_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateAnalysisRequest>, JsonRejection>,
) -> Result<Json<UpdateAnalysisResponse>, GatewayError> {
    let Path(analysis_id) = analysis_id.map_err(unknown_id("Analysis"))?;
    let Json(request) = payload.map_err(invalid_body)?;
    let response = state.gateway.edit_analysis(analysis_id, request).await?;
    Ok(Json(response))
}
