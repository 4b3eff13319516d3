use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSkillAssessmentPayload {
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub assessment_type: String,
    pub difficulty: Option<String>,
    #[validate(range(min = 1, max = 480))]
    pub time_limit_minutes: Option<i32>,
    pub passing_score: Option<Decimal>,
    pub criteria_weights: Option<JsonValue>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateSkillAssessmentPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub assessment_type: Option<String>,
    pub difficulty: Option<String>,
    #[validate(range(min = 1, max = 480))]
    pub time_limit_minutes: Option<i32>,
    pub passing_score: Option<Decimal>,
    pub criteria_weights: Option<JsonValue>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitAssessmentPayload {
    pub assessment_id: Uuid,
    pub response_id: Uuid,
    pub score: Decimal,
    pub max_score: Decimal,
    #[validate(range(min = 0))]
    pub time_spent_seconds: Option<i32>,
    pub evaluation: Option<JsonValue>,
}
