use crate::error::Result;
use crate::models::event::{WorkflowEvent, EVENT_ATS_STATUS_CHANGED, EVENT_NOTIFY_STATUS_CHANGED};
use crate::services::ats_service::AtsSyncService;
use crate::services::notification_service::NotificationService;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Post-commit event outbox. Producers insert rows in the same transaction
/// that commits the state change; worker loops claim rows with
/// FOR UPDATE SKIP LOCKED and retry failures with bounded backoff.
#[derive(Clone)]
pub struct OutboxService {
    pool: PgPool,
}

impl OutboxService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert an event row on the caller's executor, so producers can emit
    /// inside the transaction that commits the state change the event
    /// describes.
    pub async fn emit<'e>(
        &self,
        executor: impl sqlx::PgExecutor<'e>,
        event_type: &str,
        payload: JsonValue,
    ) -> Result<Uuid> {
        let row = sqlx::query(
            r#"
            INSERT INTO workflow_events (event_type, payload)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(event_type)
        .bind(payload)
        .fetch_one(executor)
        .await?;
        let id: Uuid = row.try_get("id")?;
        Ok(id)
    }

    /// Claim and process one due event. Returns false when the queue is
    /// drained so the worker loop can sleep.
    pub async fn run_once(
        &self,
        notifier: &NotificationService,
        ats: &AtsSyncService,
    ) -> Result<bool> {
        let claimed = sqlx::query(
            r#"
            UPDATE workflow_events SET status = 'processing', updated_at = NOW()
            WHERE id = (
                SELECT id FROM workflow_events
                WHERE status = 'pending' AND (next_retry_at IS NULL OR next_retry_at <= NOW())
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING id, event_type, payload
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = claimed else { return Ok(false) };
        let id: Uuid = row.try_get("id")?;
        let event_type: String = row.try_get("event_type")?;
        let payload: JsonValue = row.try_get("payload")?;

        let outcome = self.dispatch(&event_type, &payload, notifier, ats).await;

        match outcome {
            Ok(()) => self.complete(id).await?,
            Err(e) => {
                tracing::error!(event = %id, error = ?e, "Workflow event processing failed");
                self.record_failure(id, &e.to_string()).await?;
            }
        }

        Ok(true)
    }

    async fn dispatch(
        &self,
        event_type: &str,
        payload: &JsonValue,
        notifier: &NotificationService,
        ats: &AtsSyncService,
    ) -> Result<()> {
        // One consumer per event type: a notification failure reschedules
        // only the notify row, never a sync that already went through.
        match event_type {
            EVENT_NOTIFY_STATUS_CHANGED => notifier.handle_status_changed(payload).await,
            EVENT_ATS_STATUS_CHANGED => ats.handle_status_changed(payload).await,
            other => {
                tracing::warn!(event_type = other, "Unknown workflow event type, dropping");
                Ok(())
            }
        }
    }

    async fn complete(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"UPDATE workflow_events SET status = 'done', updated_at = NOW() WHERE id = $1"#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn record_failure(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE workflow_events
            SET attempts = attempts + 1,
                last_error = $2,
                status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'pending' END,
                next_retry_at = NOW() + make_interval(secs => LEAST(3600, 30 * power(2::float, GREATEST(0, attempts))::int)),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<WorkflowEvent>> {
        let event = sqlx::query_as::<_, WorkflowEvent>(
            r#"
            SELECT id, event_type, payload, status, attempts, max_attempts, last_error,
                   next_retry_at, created_at, updated_at
            FROM workflow_events
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(event)
    }
}
