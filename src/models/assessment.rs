use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// Reusable assessment template. Many candidate assessments reference one
/// template; its lifecycle is independent of any candidate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillAssessment {
    pub id: Uuid,
    pub title: String,
    pub assessment_type: String,
    pub difficulty: String,
    pub time_limit_minutes: i32,
    pub passing_score: Decimal,
    pub criteria_weights: Option<JsonValue>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One completed run of a template by a candidate. The (assessment_id,
/// response_id) pair is unique, so there is no re-attempt path.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateAssessment {
    pub id: Uuid,
    pub assessment_id: Uuid,
    pub response_id: Uuid,
    pub score: Decimal,
    pub max_score: Decimal,
    pub passed: bool,
    pub time_spent_seconds: Option<i32>,
    pub evaluation: Option<JsonValue>,
    pub completed_at: Option<DateTime<Utc>>,
}
