use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateIntegrationPayload {
    pub organization_id: Uuid,
    #[validate(length(min = 1))]
    pub provider: String,
    #[validate(length(min = 1))]
    pub api_key: String,
    pub settings: Option<JsonValue>,
}

/// Structured result of one provider call. Sync failures never raise; the
/// caller always receives this shape and proceeds.
#[derive(Debug, Clone, Serialize)]
pub struct AtsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_candidate_id: Option<String>,
}

impl AtsResponse {
    pub fn ok(data: JsonValue, provider_candidate_id: Option<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            provider_candidate_id,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            provider_candidate_id: None,
        }
    }
}
