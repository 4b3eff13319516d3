use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Optional enrichment, one-to-one with a candidate response. Upserted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateProfile {
    pub id: Uuid,
    pub response_id: Uuid,
    pub skills: Vec<String>,
    pub experience_years: Option<i32>,
    pub location: Option<String>,
    pub education: Option<JsonValue>,
    pub work_history: Option<JsonValue>,
    pub summary: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
