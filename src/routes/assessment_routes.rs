use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::dto::assessment_dto::{
    CreateSkillAssessmentPayload, SubmitAssessmentPayload, UpdateSkillAssessmentPayload,
};
use crate::utils::validation::validate;
use crate::{error::Result, AppState};

pub async fn create_template(
    State(state): State<AppState>,
    Json(payload): Json<CreateSkillAssessmentPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let template = state.scoring_service.create_template(payload).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn list_templates(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let templates = state.scoring_service.list_templates().await?;
    Ok(Json(templates))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let template = state.scoring_service.get_template(id).await?;
    match template {
        Some(t) => Ok(Json(t)),
        None => Err(crate::error::Error::NotFound("Skill assessment not found".into())),
    }
}

pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSkillAssessmentPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let template = state.scoring_service.update_template(id, payload).await?;
    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.scoring_service.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn submit_assessment(
    State(state): State<AppState>,
    Json(payload): Json<SubmitAssessmentPayload>,
) -> Result<impl IntoResponse> {
    validate(&payload)?;
    let assessment = state.scoring_service.submit_assessment(payload).await?;
    Ok((StatusCode::CREATED, Json(assessment)))
}

pub async fn list_response_assessments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let assessments = state.scoring_service.assessments_for_response(id).await?;
    Ok(Json(assessments))
}
