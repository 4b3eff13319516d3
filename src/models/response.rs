use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle states of a candidate response. `Pending` is the only initial
/// state; the default transition table defines no outgoing rules from
/// `Withdrawn` or `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "candidate_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CandidateStatus {
    Pending,
    InReview,
    Selected,
    Rejected,
    OnHold,
    Withdrawn,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Pending => "pending",
            CandidateStatus::InReview => "in_review",
            CandidateStatus::Selected => "selected",
            CandidateStatus::Rejected => "rejected",
            CandidateStatus::OnHold => "on_hold",
            CandidateStatus::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per candidate per interview. Mutated on view, status change and
/// analysis completion; never hard-deleted in the normal flow.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateResponse {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub name: String,
    pub email: String,
    pub status: CandidateStatus,
    pub overall_score: Option<i32>,
    pub duration_seconds: Option<i32>,
    pub tab_switches: i32,
    pub analytics: Option<JsonValue>,
    pub insights: Option<JsonValue>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusHistoryRecord {
    pub id: Uuid,
    pub response_id: Uuid,
    pub from_status: CandidateStatus,
    pub to_status: CandidateStatus,
    pub changed_by: String,
    pub reason: Option<String>,
    pub is_automatic: bool,
    pub changed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "request_state", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    Pending,
    Approved,
    Rejected,
}

/// An approval-gated transition waiting for a human reviewer. The candidate's
/// status is untouched until the request is approved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusChangeRequest {
    pub id: Uuid,
    pub response_id: Uuid,
    pub from_status: CandidateStatus,
    pub to_status: CandidateStatus,
    pub reason: Option<String>,
    pub requested_by: String,
    pub state: RequestState,
    pub reviewed_by: Option<String>,
    pub review_comments: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
}
