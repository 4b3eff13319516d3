use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::dto::ats_dto::CreateIntegrationPayload;
use crate::models::response::CandidateStatus;
use crate::utils::validation::validate;
use crate::{error::Result, AppState};

#[derive(Debug, Deserialize)]
pub struct SyncStatusRequest {
    pub status: CandidateStatus,
}

pub async fn create_integration(
    State(state): State<AppState>,
    Json(payload): Json<CreateIntegrationPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let integration = state.ats_service.create_integration(payload).await?;
    Ok((StatusCode::CREATED, Json(integration)))
}

pub async fn list_integrations(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let integrations = state.ats_service.list_integrations().await?;
    Ok(Json(integrations))
}

pub async fn validate_integration(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let outcome = state.ats_service.validate(id).await?;
    Ok(Json(outcome))
}

pub async fn sync_candidate(
    State(state): State<AppState>,
    Path((integration_id, response_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .ats_service
        .sync_candidate(integration_id, response_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn sync_status(
    State(state): State<AppState>,
    Path((integration_id, response_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SyncStatusRequest>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .ats_service
        .sync_status(integration_id, response_id, payload.status)
        .await?;
    Ok(Json(outcome))
}

pub async fn sync_assessments(
    State(state): State<AppState>,
    Path((integration_id, response_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    let outcome = state
        .ats_service
        .sync_assessments(integration_id, response_id)
        .await?;
    Ok(Json(outcome))
}

pub async fn list_sync_logs(
    State(state): State<AppState>,
    Path(response_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let logs = state.ats_service.sync_logs(response_id).await?;
    Ok(Json(logs))
}
