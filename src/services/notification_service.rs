use crate::error::Result;
use crate::utils::signature::sign_payload;
use reqwest::Client;
use serde_json::Value as JsonValue;

/// Outbox consumer that delivers signed status-change webhooks. Whether a
/// transition notifies anyone at all is decided by the transition rule's
/// notification settings, carried in the event payload.
#[derive(Clone)]
pub struct NotificationService {
    client: Client,
    target_url: Option<String>,
    secret: String,
}

impl NotificationService {
    pub fn new(client: Client, target_url: Option<String>, secret: String) -> Self {
        Self {
            client,
            target_url,
            secret,
        }
    }

    pub async fn handle_status_changed(&self, payload: &JsonValue) -> Result<()> {
        let settings = payload.get("notifications");
        let notify_candidate = settings
            .and_then(|s| s.get("notify_candidate"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let notify_recruiter = settings
            .and_then(|s| s.get("notify_recruiter"))
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        if !notify_candidate && !notify_recruiter {
            return Ok(());
        }

        let Some(target_url) = &self.target_url else {
            tracing::debug!("No status webhook configured, skipping notification");
            return Ok(());
        };

        let body = serde_json::json!({
            "event": "candidate.status_changed",
            "notify_candidate": notify_candidate,
            "notify_recruiter": notify_recruiter,
            "data": payload,
        });
        let raw = serde_json::to_vec(&body)?;
        let signature = sign_payload(&self.secret, &raw);

        let res = self
            .client
            .post(target_url)
            .header("X-Webhook-Signature", signature)
            .header("Content-Type", "application/json")
            .body(raw)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(crate::error::Error::ExternalService(format!(
                "Status webhook returned {}",
                res.status()
            )));
        }

        Ok(())
    }
}
