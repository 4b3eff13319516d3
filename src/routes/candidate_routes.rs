use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use uuid::Uuid;

use crate::dto::workflow_dto::{ReviewRequestPayload, UpdateStatusPayload, UpsertProfilePayload};
use crate::middleware::auth::Claims;
use crate::utils::validation::validate;
use crate::{error::Result, AppState};

pub async fn list_responses(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let responses = state.workflow_service.list_responses().await?;
    Ok(Json(responses))
}

pub async fn get_response(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let response = state.workflow_service.get_response(id).await?;
    match response {
        Some(r) => Ok(Json(r)),
        None => Err(crate::error::Error::NotFound("Candidate response not found".into())),
    }
}

pub async fn get_status_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let history = state.workflow_service.history(id).await?;
    Ok(Json(history))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let outcome = state
        .workflow_service
        .update_status(id, payload.new_status, payload.reason, &claims.sub, false)
        .await?;
    Ok(Json(outcome))
}

pub async fn list_pending_requests(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let requests = state.workflow_service.pending_requests().await?;
    Ok(Json(requests))
}

pub async fn approve_status_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ReviewRequestPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let outcome = state
        .workflow_service
        .approve_request(request_id, &claims.sub, payload.comments)
        .await?;
    Ok(Json(outcome))
}

pub async fn reject_status_request(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(request_id): Path<Uuid>,
    Json(payload): Json<ReviewRequestPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let outcome = state
        .workflow_service
        .reject_request(request_id, &claims.sub, payload.comments)
        .await?;
    Ok(Json(outcome))
}

pub async fn get_dashboard_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let by_status = state.workflow_service.status_counts().await?;
    let total: i64 = by_status.values().sum();
    let pending_approvals = state.workflow_service.pending_requests().await?.len();

    Ok(Json(serde_json::json!({
        "total_candidates": total,
        "by_status": by_status,
        "pending_approvals": pending_approvals,
    })))
}

pub async fn upsert_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpsertProfilePayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;

    // Reject profiles for responses that do not exist.
    state
        .workflow_service
        .get_response(id)
        .await?
        .ok_or_else(|| crate::error::Error::NotFound("Candidate response not found".into()))?;

    let profile = state.profile_service.upsert(id, payload).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let profile = state.profile_service.get(id).await?;
    match profile {
        Some(p) => Ok(Json(p)),
        None => Err(crate::error::Error::NotFound("Candidate profile not found".into())),
    }
}
