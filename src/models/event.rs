use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;
use uuid::Uuid;

/// One committed status change fans out as two rows, one per consumer, so
/// the webhook notifier and the ATS sync carry independent retry state.
pub const EVENT_NOTIFY_STATUS_CHANGED: &str = "status.changed.notify";
pub const EVENT_ATS_STATUS_CHANGED: &str = "status.changed.ats_sync";

/// Outbox row emitted in the same transaction as the state change it
/// describes. Worker loops claim rows independently; a consumer failure
/// never touches the transition that produced the event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkflowEvent {
    pub id: Uuid,
    pub event_type: String,
    pub payload: JsonValue,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub last_error: Option<String>,
    pub next_retry_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}
