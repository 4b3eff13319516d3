use crate::models::response::CandidateStatus;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateStatusPayload {
    pub new_status: CandidateStatus,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

/// Outcome of a status-change request. An approval-pending transition is a
/// success with `requires_approval: true`, distinct from a rejection, so
/// callers can route it to a review queue.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_approval: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<uuid::Uuid>,
}

impl StatusChangeOutcome {
    pub fn applied(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            requires_approval: None,
            request_id: None,
        }
    }

    pub fn pending_approval(request_id: uuid::Uuid) -> Self {
        Self {
            success: true,
            message: Some("Status change requires approval".to_string()),
            requires_approval: Some(true),
            request_id: Some(request_id),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReviewRequestPayload {
    #[validate(length(max = 2000))]
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpsertProfilePayload {
    pub skills: Vec<String>,
    #[validate(range(min = 0, max = 80))]
    pub experience_years: Option<i32>,
    pub location: Option<String>,
    pub education: Option<serde_json::Value>,
    pub work_history: Option<serde_json::Value>,
    pub summary: Option<String>,
}
