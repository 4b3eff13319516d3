use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AtsIntegration {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub provider: String,
    pub api_key: String,
    pub settings: Option<JsonValue>,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// Append-only record of one sync attempt. Rows are inserted for successes
/// and failures alike, and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AtsSyncLog {
    pub id: Uuid,
    pub integration_id: Uuid,
    pub response_id: Uuid,
    pub sync_type: String,
    pub request: Option<JsonValue>,
    pub response: Option<JsonValue>,
    pub status: String,
    pub error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}
