use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::dto::filter_dto::{EnhancedCandidate, FilterRequest};
use crate::dto::insight_dto::CandidateInsights;
use crate::services::export_service::ExportService;
use crate::services::filter_service::FilterService;
use crate::{error::Result, AppState};

const DEFAULT_PAGE_SIZE: u32 = 20;

/// Join every response with its profile and cached insight. The filter
/// engine itself is pure; all IO happens here.
async fn assemble_candidates(state: &AppState) -> Result<Vec<EnhancedCandidate>> {
    let responses = state.workflow_service.list_responses().await?;
    let mut profiles = state.profile_service.by_response().await?;

    let candidates = responses
        .into_iter()
        .map(|response| {
            let profile = profiles.remove(&response.id);
            let insights = response
                .insights
                .clone()
                .and_then(|raw| serde_json::from_value::<CandidateInsights>(raw).ok());
            EnhancedCandidate {
                response,
                profile,
                insights,
            }
        })
        .collect();

    Ok(candidates)
}

pub async fn filter_candidates(
    State(state): State<AppState>,
    Json(payload): Json<FilterRequest>,
) -> Result<impl IntoResponse> {
    let candidates = assemble_candidates(&state).await?;
    let page = payload.page.unwrap_or(1);
    let limit = payload.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let result = FilterService::filter(candidates, &payload.criteria, page, limit);
    Ok(Json(result))
}

/// Export every candidate matching the criteria as XLSX, ignoring
/// pagination.
pub async fn export_filtered_candidates(
    State(state): State<AppState>,
    Json(payload): Json<FilterRequest>,
) -> Result<impl IntoResponse> {
    let candidates = assemble_candidates(&state).await?;
    let result = FilterService::filter(candidates, &payload.criteria, 1, u32::MAX);

    let buffer = ExportService::generate_candidates_xlsx(&result.candidates)?;
    let filename = format!("candidates_{}.xlsx", chrono::Utc::now().format("%Y%m%d_%H%M"));
    let disposition = format!("attachment; filename=\"{}\"", filename);

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        buffer,
    ))
}
