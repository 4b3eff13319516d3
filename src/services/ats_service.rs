use crate::dto::ats_dto::{AtsResponse, CreateIntegrationPayload};
use crate::error::{Error, Result};
use crate::models::ats::{AtsIntegration, AtsSyncLog};
use crate::models::assessment::CandidateAssessment;
use crate::models::profile::CandidateProfile;
use crate::models::response::{CandidateResponse, CandidateStatus};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

pub const SYNC_CANDIDATE: &str = "candidate";
pub const SYNC_STATUS: &str = "status_update";
pub const SYNC_ASSESSMENTS: &str = "assessment_results";

/// Common capability set every recruiting-system provider implements. Each
/// variant does its own authentication and field mapping; the dispatcher
/// picks an implementation from the integration's configured provider key,
/// never from runtime type inspection.
// Reference arguments carry named lifetimes so the trait stays mockable.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AtsProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Provider-shaped candidate payload, also captured in the sync log.
    fn map_candidate<'a>(
        &self,
        response: &'a CandidateResponse,
        profile: Option<&'a CandidateProfile>,
    ) -> JsonValue;

    async fn create_candidate<'a>(
        &self,
        response: &'a CandidateResponse,
        profile: Option<&'a CandidateProfile>,
    ) -> Result<AtsResponse>;

    async fn update_candidate_status(
        &self,
        response_id: Uuid,
        status: CandidateStatus,
    ) -> Result<AtsResponse>;

    async fn sync_assessment_results<'a>(
        &self,
        response_id: Uuid,
        assessments: &'a [CandidateAssessment],
    ) -> Result<AtsResponse>;

    async fn validate_connection(&self) -> Result<AtsResponse>;
}

pub struct GreenhouseProvider {
    client: Client,
    api_key: String,
}

impl GreenhouseProvider {
    const BASE_URL: &'static str = "https://harvest.greenhouse.io/v1";

    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    fn stage_for(status: CandidateStatus) -> &'static str {
        match status {
            CandidateStatus::Pending => "application_review",
            CandidateStatus::InReview => "assessment",
            CandidateStatus::Selected => "offer",
            CandidateStatus::Rejected => "rejected",
            CandidateStatus::OnHold => "on_hold",
            CandidateStatus::Withdrawn => "withdrawn",
        }
    }

    async fn post(&self, path: &str, body: &JsonValue) -> Result<JsonValue> {
        let res = self
            .client
            .post(format!("{}{}", Self::BASE_URL, path))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .json(body)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Greenhouse API error {}: {}",
                status, text
            )));
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl AtsProvider for GreenhouseProvider {
    fn name(&self) -> &'static str {
        "greenhouse"
    }

    fn map_candidate<'a>(
        &self,
        response: &'a CandidateResponse,
        profile: Option<&'a CandidateProfile>,
    ) -> JsonValue {
        // Greenhouse wants split names; everything after the first token is
        // the last name.
        let mut parts = response.name.splitn(2, ' ');
        let first_name = parts.next().unwrap_or_default();
        let last_name = parts.next().unwrap_or_default();

        serde_json::json!({
            "first_name": first_name,
            "last_name": last_name,
            "email_addresses": [{"value": response.email, "type": "personal"}],
            "tags": profile.map(|p| p.skills.clone()).unwrap_or_default(),
            "custom_fields": {
                "overall_score": response.overall_score,
                "location": profile.and_then(|p| p.location.clone()),
                "experience_years": profile.and_then(|p| p.experience_years),
            },
        })
    }

    async fn create_candidate<'a>(
        &self,
        response: &'a CandidateResponse,
        profile: Option<&'a CandidateProfile>,
    ) -> Result<AtsResponse> {
        let body = self.map_candidate(response, profile);
        let data = self.post("/candidates", &body).await?;
        let provider_id = data.get("id").map(|v| v.to_string());
        Ok(AtsResponse::ok(data, provider_id))
    }

    async fn update_candidate_status(
        &self,
        response_id: Uuid,
        status: CandidateStatus,
    ) -> Result<AtsResponse> {
        let body = serde_json::json!({
            "external_id": response_id,
            "stage": Self::stage_for(status),
        });
        let data = self.post("/applications/moves", &body).await?;
        Ok(AtsResponse::ok(data, None))
    }

    async fn sync_assessment_results<'a>(
        &self,
        response_id: Uuid,
        assessments: &'a [CandidateAssessment],
    ) -> Result<AtsResponse> {
        let body = serde_json::json!({
            "external_id": response_id,
            "test_results": assessments.iter().map(|a| serde_json::json!({
                "assessment_id": a.assessment_id,
                "score": a.score,
                "max_score": a.max_score,
                "passed": a.passed,
            })).collect::<Vec<_>>(),
        });
        let data = self.post("/candidates/test_results", &body).await?;
        Ok(AtsResponse::ok(data, None))
    }

    async fn validate_connection(&self) -> Result<AtsResponse> {
        let res = self
            .client
            .get(format!("{}/users", Self::BASE_URL))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;
        if res.status().is_success() {
            Ok(AtsResponse::ok(serde_json::json!({"connected": true}), None))
        } else {
            Ok(AtsResponse::failed(format!(
                "Greenhouse rejected credentials: {}",
                res.status()
            )))
        }
    }
}

pub struct LeverProvider {
    client: Client,
    api_key: String,
}

impl LeverProvider {
    const BASE_URL: &'static str = "https://api.lever.co/v1";

    pub fn new(client: Client, api_key: String) -> Self {
        Self { client, api_key }
    }

    fn tag_for(status: CandidateStatus) -> &'static str {
        match status {
            CandidateStatus::Pending => "new-applicant",
            CandidateStatus::InReview => "in-review",
            CandidateStatus::Selected => "hired",
            CandidateStatus::Rejected => "archived",
            CandidateStatus::OnHold => "snoozed",
            CandidateStatus::Withdrawn => "withdrew",
        }
    }

    async fn post(&self, path: &str, body: &JsonValue) -> Result<JsonValue> {
        let res = self
            .client
            .post(format!("{}{}", Self::BASE_URL, path))
            .bearer_auth(&self.api_key)
            .json(body)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(Error::ExternalService(format!(
                "Lever API error {}: {}",
                status, text
            )));
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl AtsProvider for LeverProvider {
    fn name(&self) -> &'static str {
        "lever"
    }

    fn map_candidate<'a>(
        &self,
        response: &'a CandidateResponse,
        profile: Option<&'a CandidateProfile>,
    ) -> JsonValue {
        serde_json::json!({
            "name": response.name,
            "emails": [response.email],
            "tags": profile.map(|p| p.skills.clone()).unwrap_or_default(),
            "location": profile.and_then(|p| p.location.clone()),
            "headline": profile.and_then(|p| p.summary.clone()),
        })
    }

    async fn create_candidate<'a>(
        &self,
        response: &'a CandidateResponse,
        profile: Option<&'a CandidateProfile>,
    ) -> Result<AtsResponse> {
        let body = self.map_candidate(response, profile);
        let data = self.post("/opportunities", &body).await?;
        let provider_id = data
            .get("data")
            .and_then(|d| d.get("id"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        Ok(AtsResponse::ok(data, provider_id))
    }

    async fn update_candidate_status(
        &self,
        response_id: Uuid,
        status: CandidateStatus,
    ) -> Result<AtsResponse> {
        let body = serde_json::json!({
            "external_id": response_id,
            "tags": [Self::tag_for(status)],
        });
        let data = self.post("/opportunities/addTags", &body).await?;
        Ok(AtsResponse::ok(data, None))
    }

    async fn sync_assessment_results<'a>(
        &self,
        response_id: Uuid,
        assessments: &'a [CandidateAssessment],
    ) -> Result<AtsResponse> {
        let body = serde_json::json!({
            "external_id": response_id,
            "notes": assessments.iter().map(|a| format!(
                "Assessment {}: {}/{} ({})",
                a.assessment_id,
                a.score,
                a.max_score,
                if a.passed { "passed" } else { "failed" }
            )).collect::<Vec<_>>(),
        });
        let data = self.post("/opportunities/notes", &body).await?;
        Ok(AtsResponse::ok(data, None))
    }

    async fn validate_connection(&self) -> Result<AtsResponse> {
        let res = self
            .client
            .get(format!("{}/users/me", Self::BASE_URL))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(15))
            .send()
            .await?;
        if res.status().is_success() {
            Ok(AtsResponse::ok(serde_json::json!({"connected": true}), None))
        } else {
            Ok(AtsResponse::failed(format!(
                "Lever rejected credentials: {}",
                res.status()
            )))
        }
    }
}

/// Enterprise-only stub: configurable, but every operation reports
/// unsupported until the integration is commercially enabled.
pub struct WorkdayProvider;

const WORKDAY_UNSUPPORTED: &str = "Workday integration requires an enterprise agreement";

#[async_trait]
impl AtsProvider for WorkdayProvider {
    fn name(&self) -> &'static str {
        "workday"
    }

    fn map_candidate<'a>(
        &self,
        _response: &'a CandidateResponse,
        _profile: Option<&'a CandidateProfile>,
    ) -> JsonValue {
        serde_json::json!({"unsupported": true})
    }

    async fn create_candidate<'a>(
        &self,
        _response: &'a CandidateResponse,
        _profile: Option<&'a CandidateProfile>,
    ) -> Result<AtsResponse> {
        Ok(AtsResponse::failed(WORKDAY_UNSUPPORTED))
    }

    async fn update_candidate_status(
        &self,
        _response_id: Uuid,
        _status: CandidateStatus,
    ) -> Result<AtsResponse> {
        Ok(AtsResponse::failed(WORKDAY_UNSUPPORTED))
    }

    async fn sync_assessment_results<'a>(
        &self,
        _response_id: Uuid,
        _assessments: &'a [CandidateAssessment],
    ) -> Result<AtsResponse> {
        Ok(AtsResponse::failed(WORKDAY_UNSUPPORTED))
    }

    async fn validate_connection(&self) -> Result<AtsResponse> {
        Ok(AtsResponse::failed(WORKDAY_UNSUPPORTED))
    }
}

#[derive(Clone)]
pub struct AtsSyncService {
    pool: PgPool,
    client: Client,
}

impl AtsSyncService {
    pub fn new(pool: PgPool, client: Client) -> Self {
        Self { pool, client }
    }

    /// Select the provider implementation from configuration alone.
    pub fn provider_for(&self, integration: &AtsIntegration) -> Result<Box<dyn AtsProvider>> {
        match integration.provider.as_str() {
            "greenhouse" => Ok(Box::new(GreenhouseProvider::new(
                self.client.clone(),
                integration.api_key.clone(),
            ))),
            "lever" => Ok(Box::new(LeverProvider::new(
                self.client.clone(),
                integration.api_key.clone(),
            ))),
            "workday" => Ok(Box::new(WorkdayProvider)),
            other => Err(Error::BadRequest(format!(
                "Unknown ATS provider '{}'",
                other
            ))),
        }
    }

    pub async fn create_integration(
        &self,
        payload: CreateIntegrationPayload,
    ) -> Result<AtsIntegration> {
        // Reject unknown providers before persisting the config.
        match payload.provider.as_str() {
            "greenhouse" | "lever" | "workday" => {}
            other => {
                return Err(Error::BadRequest(format!("Unknown ATS provider '{}'", other)));
            }
        }

        let integration = sqlx::query_as::<_, AtsIntegration>(
            r#"
            INSERT INTO ats_integrations (organization_id, provider, api_key, settings)
            VALUES ($1, $2, $3, $4)
            RETURNING id, organization_id, provider, api_key, settings, is_active, created_at
            "#,
        )
        .bind(payload.organization_id)
        .bind(payload.provider)
        .bind(payload.api_key)
        .bind(payload.settings)
        .fetch_one(&self.pool)
        .await?;
        Ok(integration)
    }

    pub async fn list_integrations(&self) -> Result<Vec<AtsIntegration>> {
        let integrations = sqlx::query_as::<_, AtsIntegration>(
            r#"
            SELECT id, organization_id, provider, api_key, settings, is_active, created_at
            FROM ats_integrations
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(integrations)
    }

    pub async fn get_integration(&self, id: Uuid) -> Result<AtsIntegration> {
        let integration = sqlx::query_as::<_, AtsIntegration>(
            r#"
            SELECT id, organization_id, provider, api_key, settings, is_active, created_at
            FROM ats_integrations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("ATS integration {} not found", id)))?;
        Ok(integration)
    }

    pub async fn validate(&self, integration_id: Uuid) -> Result<AtsResponse> {
        let integration = self.get_integration(integration_id).await?;
        let provider = self.provider_for(&integration)?;
        Ok(Self::absorb(provider.validate_connection().await))
    }

    /// Push one candidate to the configured provider. The remote outcome,
    /// success or failure, always lands in the append-only sync log, and the
    /// caller always gets a structured response back.
    pub async fn sync_candidate(
        &self,
        integration_id: Uuid,
        response_id: Uuid,
    ) -> Result<AtsResponse> {
        let integration = self.get_integration(integration_id).await?;
        let response = self.fetch_response(response_id).await?;
        let profile = self.fetch_profile(response_id).await?;
        let provider = self.provider_for(&integration)?;

        let request = provider.map_candidate(&response, profile.as_ref());
        let outcome = Self::absorb(provider.create_candidate(&response, profile.as_ref()).await);

        self.record_sync(integration_id, response_id, SYNC_CANDIDATE, Some(request), &outcome)
            .await?;
        Ok(outcome)
    }

    pub async fn sync_status(
        &self,
        integration_id: Uuid,
        response_id: Uuid,
        status: CandidateStatus,
    ) -> Result<AtsResponse> {
        let integration = self.get_integration(integration_id).await?;
        let provider = self.provider_for(&integration)?;

        let request = serde_json::json!({"response_id": response_id, "status": status});
        let outcome = Self::absorb(provider.update_candidate_status(response_id, status).await);

        self.record_sync(integration_id, response_id, SYNC_STATUS, Some(request), &outcome)
            .await?;
        Ok(outcome)
    }

    pub async fn sync_assessments(
        &self,
        integration_id: Uuid,
        response_id: Uuid,
    ) -> Result<AtsResponse> {
        let integration = self.get_integration(integration_id).await?;
        let provider = self.provider_for(&integration)?;

        let assessments = sqlx::query_as::<_, CandidateAssessment>(
            r#"
            SELECT id, assessment_id, response_id, score, max_score, passed,
                   time_spent_seconds, evaluation, completed_at
            FROM candidate_assessments
            WHERE response_id = $1
            ORDER BY completed_at ASC
            "#,
        )
        .bind(response_id)
        .fetch_all(&self.pool)
        .await?;

        let request = serde_json::json!({
            "response_id": response_id,
            "assessment_count": assessments.len(),
        });
        let outcome =
            Self::absorb(provider.sync_assessment_results(response_id, &assessments).await);

        self.record_sync(integration_id, response_id, SYNC_ASSESSMENTS, Some(request), &outcome)
            .await?;
        Ok(outcome)
    }

    /// Outbox consumer: push a committed status change to every active
    /// integration. Per-integration failures are logged and absorbed.
    pub async fn handle_status_changed(&self, payload: &JsonValue) -> Result<()> {
        let response_id = payload
            .get("response_id")
            .and_then(|v| v.as_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| Error::Internal("status.changed event missing response_id".into()))?;
        let status: CandidateStatus = serde_json::from_value(
            payload
                .get("to_status")
                .cloned()
                .ok_or_else(|| Error::Internal("status.changed event missing to_status".into()))?,
        )?;

        let integrations = sqlx::query_as::<_, AtsIntegration>(
            r#"
            SELECT id, organization_id, provider, api_key, settings, is_active, created_at
            FROM ats_integrations
            WHERE is_active = TRUE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        for integration in integrations {
            match self.sync_status(integration.id, response_id, status).await {
                Ok(outcome) if !outcome.success => {
                    tracing::warn!(
                        integration = %integration.id,
                        provider = %integration.provider,
                        error = ?outcome.error,
                        "ATS status sync reported failure"
                    );
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(
                        integration = %integration.id,
                        error = ?e,
                        "ATS status sync errored"
                    );
                }
            }
        }

        Ok(())
    }

    pub async fn sync_logs(&self, response_id: Uuid) -> Result<Vec<AtsSyncLog>> {
        let logs = sqlx::query_as::<_, AtsSyncLog>(
            r#"
            SELECT id, integration_id, response_id, sync_type, request, response, status, error, created_at
            FROM ats_sync_logs
            WHERE response_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(response_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(logs)
    }

    /// Collapse provider errors into a structured failure so a sync can
    /// never raise past this service.
    pub fn absorb(outcome: Result<AtsResponse>) -> AtsResponse {
        match outcome {
            Ok(response) => response,
            Err(e) => AtsResponse::failed(e.to_string()),
        }
    }

    async fn record_sync(
        &self,
        integration_id: Uuid,
        response_id: Uuid,
        sync_type: &str,
        request: Option<JsonValue>,
        outcome: &AtsResponse,
    ) -> Result<()> {
        let status = if outcome.success { "success" } else { "failed" };
        sqlx::query(
            r#"
            INSERT INTO ats_sync_logs (integration_id, response_id, sync_type, request, response, status, error)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(integration_id)
        .bind(response_id)
        .bind(sync_type)
        .bind(request)
        .bind(&outcome.data)
        .bind(status)
        .bind(&outcome.error)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_response(&self, id: Uuid) -> Result<CandidateResponse> {
        let response = sqlx::query_as::<_, CandidateResponse>(
            r#"
            SELECT id, interview_id, name, email, status, overall_score, duration_seconds,
                   tab_switches, analytics, insights, created_at, updated_at
            FROM candidate_responses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Candidate response {} not found", id)))?;
        Ok(response)
    }

    async fn fetch_profile(&self, response_id: Uuid) -> Result<Option<CandidateProfile>> {
        let profile = sqlx::query_as::<_, CandidateProfile>(
            r#"
            SELECT id, response_id, skills, experience_years, location, education,
                   work_history, summary, created_at, updated_at
            FROM candidate_profiles
            WHERE response_id = $1
            "#,
        )
        .bind(response_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_response() -> CandidateResponse {
        CandidateResponse {
            id: Uuid::new_v4(),
            interview_id: Uuid::nil(),
            name: "Grace Hopper".to_string(),
            email: "grace@example.com".to_string(),
            status: CandidateStatus::InReview,
            overall_score: Some(91),
            duration_seconds: None,
            tab_switches: 0,
            analytics: None,
            insights: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn greenhouse_splits_names_and_maps_skills() {
        let provider = GreenhouseProvider::new(Client::new(), "key".to_string());
        let response = sample_response();
        let profile = CandidateProfile {
            id: Uuid::nil(),
            response_id: response.id,
            skills: vec!["cobol".to_string()],
            experience_years: Some(40),
            location: Some("Arlington".to_string()),
            education: None,
            work_history: None,
            summary: None,
            created_at: None,
            updated_at: None,
        };

        let mapped = provider.map_candidate(&response, Some(&profile));
        assert_eq!(mapped["first_name"], "Grace");
        assert_eq!(mapped["last_name"], "Hopper");
        assert_eq!(mapped["tags"][0], "cobol");
        assert_eq!(mapped["custom_fields"]["experience_years"], 40);
    }

    #[test]
    fn lever_maps_flat_candidate() {
        let provider = LeverProvider::new(Client::new(), "key".to_string());
        let response = sample_response();
        let mapped = provider.map_candidate(&response, None);
        assert_eq!(mapped["name"], "Grace Hopper");
        assert_eq!(mapped["emails"][0], "grace@example.com");
    }

    #[tokio::test]
    async fn workday_stub_reports_unsupported_everywhere() {
        let provider = WorkdayProvider;
        let response = sample_response();

        let create = provider.create_candidate(&response, None).await.unwrap();
        assert!(!create.success);
        let status = provider
            .update_candidate_status(response.id, CandidateStatus::Selected)
            .await
            .unwrap();
        assert!(!status.success);
        let validate = provider.validate_connection().await.unwrap();
        assert!(!validate.success);
        assert!(validate.error.unwrap().contains("enterprise"));
    }

    #[test]
    fn provider_errors_become_structured_failures() {
        let outcome = AtsSyncService::absorb(Err(Error::ExternalService(
            "connection refused".to_string(),
        )));
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn mocked_provider_accepts_borrowed_candidate_data() {
        let mut provider = MockAtsProvider::new();
        provider.expect_create_candidate().returning(|_, _| {
            Ok(AtsResponse::ok(
                serde_json::json!({"id": "c-1"}),
                Some("c-1".to_string()),
            ))
        });
        provider
            .expect_sync_assessment_results()
            .returning(|_, _| Ok(AtsResponse::ok(serde_json::json!({}), None)));

        let response = sample_response();
        let created = provider.create_candidate(&response, None).await.unwrap();
        assert!(created.success);
        assert_eq!(created.provider_candidate_id.as_deref(), Some("c-1"));

        let synced = provider
            .sync_assessment_results(response.id, &[])
            .await
            .unwrap();
        assert!(synced.success);
    }

    #[tokio::test]
    async fn mocked_provider_failure_is_absorbed() {
        let mut provider = MockAtsProvider::new();
        provider
            .expect_update_candidate_status()
            .returning(|_, _| Err(Error::ExternalService("boom".to_string())));

        let outcome = AtsSyncService::absorb(
            provider
                .update_candidate_status(Uuid::new_v4(), CandidateStatus::Selected)
                .await,
        );
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("External service error: boom"));
    }
}
