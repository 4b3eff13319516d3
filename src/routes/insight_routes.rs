use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{error::Result, AppState};

pub async fn generate_insights(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    tracing::info!("Generating insights for response {}", id);
    let insights = state.insight_service.generate_for_response(id).await?;
    Ok(Json(insights))
}
