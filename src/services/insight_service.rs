use crate::dto::insight_dto::CandidateInsights;
use crate::error::{Error, Result};
use crate::models::assessment::CandidateAssessment;
use crate::models::profile::CandidateProfile;
use crate::models::response::CandidateResponse;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct InsightService {
    pool: PgPool,
    client: Client,
    api_key: String,
}

impl InsightService {
    pub fn new(pool: PgPool, api_key: String, client: Client) -> Self {
        Self {
            pool,
            client,
            api_key,
        }
    }

    /// Generate and cache insights for one candidate. The AI judgment is
    /// advisory: any service error degrades to an empty insight object and is
    /// logged, it never propagates to the caller's workflow.
    pub async fn generate_for_response(&self, response_id: Uuid) -> Result<CandidateInsights> {
        let response = self.fetch_response(response_id).await?.ok_or_else(|| {
            Error::NotFound(format!("Candidate response {} not found", response_id))
        })?;
        let profile = self.fetch_profile(response_id).await?;
        let assessments = self.fetch_assessments(response_id).await?;

        let context = Self::build_context(&response, profile.as_ref(), &assessments);
        let insights = self.generate(&context).await;

        sqlx::query(
            r#"UPDATE candidate_responses SET insights = $1, updated_at = NOW() WHERE id = $2"#,
        )
        .bind(serde_json::to_value(&insights)?)
        .bind(response_id)
        .execute(&self.pool)
        .await?;

        Ok(insights)
    }

    /// Assemble the model input deterministically: fixed section order,
    /// sorted skills, assessments in completion order. Identical candidate
    /// state must always produce the identical prompt.
    pub fn build_context(
        response: &CandidateResponse,
        profile: Option<&CandidateProfile>,
        assessments: &[CandidateAssessment],
    ) -> String {
        let mut out = String::new();
        out.push_str(&format!("Candidate: {} ({})\n", response.name, response.email));
        out.push_str(&format!("Status: {}\n", response.status));
        out.push_str(&format!(
            "Overall score: {}\n",
            response
                .overall_score
                .map(|s| s.to_string())
                .unwrap_or_else(|| "not scored".to_string())
        ));
        out.push_str(&format!("Tab switches: {}\n", response.tab_switches));
        if let Some(duration) = response.duration_seconds {
            out.push_str(&format!("Interview duration: {}s\n", duration));
        }

        if let Some(profile) = profile {
            let mut skills = profile.skills.clone();
            skills.sort();
            out.push_str(&format!("Skills: {}\n", skills.join(", ")));
            if let Some(years) = profile.experience_years {
                out.push_str(&format!("Experience: {} years\n", years));
            }
            if let Some(location) = &profile.location {
                out.push_str(&format!("Location: {}\n", location));
            }
            if let Some(summary) = &profile.summary {
                out.push_str(&format!("Summary: {}\n", summary));
            }
        }

        out.push_str(&format!("Assessments completed: {}\n", assessments.len()));
        for a in assessments {
            out.push_str(&format!(
                "- assessment {}: {}/{} (passed: {})\n",
                a.assessment_id, a.score, a.max_score, a.passed
            ));
        }

        out
    }

    /// Call the text-generation service and parse defensively. Returns the
    /// zeroed insight object on any failure so ranking keeps working.
    pub async fn generate(&self, context: &str) -> CandidateInsights {
        let system_prompt = r#"You are a Senior Technical Recruiter evaluating interview candidates.
Judge the candidate described by the user strictly on the evidence given.

Return a JSON object with exactly these fields:
{
  "match_score": <0-100>,
  "strengths": ["..."],
  "weaknesses": ["..."],
  "recommendations": ["..."],
  "risk_factors": ["..."],
  "potential_role_fit": ["..."]
}
Keep each list short and concrete. Do not invent facts not present in the input."#;

        let payload = serde_json::json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": context}
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.2
        });

        match self.chat_completion(payload).await {
            Ok(raw) => Self::parse_insights(&raw),
            Err(e) => {
                tracing::error!(error = ?e, "Insight generation failed, returning empty insights");
                CandidateInsights::default()
            }
        }
    }

    /// Bounded retry applies only to rate-limit responses; every other
    /// failure surfaces immediately.
    async fn chat_completion(&self, payload: JsonValue) -> Result<JsonValue> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post("https://api.openai.com/v1/chat/completions")
                .bearer_auth(&self.api_key)
                .json(&payload)
                .timeout(Duration::from_secs(120))
                .send()
                .await?;

            if res.status() == StatusCode::TOO_MANY_REQUESTS && attempt < MAX_ATTEMPTS {
                let jitter = rand::thread_rng().gen_range(0..250);
                let delay = Duration::from_millis(500 * 2u64.pow(attempt - 1) + jitter);
                tracing::warn!(attempt, "Rate limited by completion API, backing off");
                tokio::time::sleep(delay).await;
                continue;
            }

            if !res.status().is_success() {
                let status = res.status();
                let text = res.text().await.unwrap_or_default();
                return Err(Error::ExternalService(format!(
                    "Completion API error {}: {}",
                    status, text
                )));
            }

            let body: JsonValue = res.json().await?;
            return body
                .get("choices")
                .and_then(|c| c.get(0))
                .and_then(|c| c.get("message"))
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str())
                .and_then(|s| serde_json::from_str(s).ok())
                .ok_or_else(|| {
                    Error::ExternalService("Invalid completion response format".to_string())
                });
        }
    }

    pub fn parse_insights(raw: &JsonValue) -> CandidateInsights {
        match serde_json::from_value::<CandidateInsights>(raw.clone()) {
            Ok(mut insights) => {
                insights.match_score = insights.match_score.clamp(0, 100);
                insights
            }
            Err(e) => {
                tracing::warn!(error = ?e, "Unparseable insight payload, returning empty insights");
                CandidateInsights::default()
            }
        }
    }

    async fn fetch_response(&self, id: Uuid) -> Result<Option<CandidateResponse>> {
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
        .await?;
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

    async fn fetch_assessments(&self, response_id: Uuid) -> Result<Vec<CandidateAssessment>> {
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
        Ok(assessments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::response::CandidateStatus;

    fn sample_response() -> CandidateResponse {
        CandidateResponse {
            id: Uuid::nil(),
            interview_id: Uuid::nil(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            status: CandidateStatus::InReview,
            overall_score: Some(82),
            duration_seconds: Some(1800),
            tab_switches: 2,
            analytics: None,
            insights: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn sample_profile(skills: &[&str]) -> CandidateProfile {
        CandidateProfile {
            id: Uuid::nil(),
            response_id: Uuid::nil(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: Some(5),
            location: Some("Berlin".to_string()),
            education: None,
            work_history: None,
            summary: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn context_is_deterministic() {
        let response = sample_response();
        let profile = sample_profile(&["rust", "sql"]);
        let a = InsightService::build_context(&response, Some(&profile), &[]);
        let b = InsightService::build_context(&response, Some(&profile), &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn context_sorts_skills() {
        let response = sample_response();
        let shuffled = sample_profile(&["zig", "ada", "rust"]);
        let sorted = sample_profile(&["ada", "rust", "zig"]);
        assert_eq!(
            InsightService::build_context(&response, Some(&shuffled), &[]),
            InsightService::build_context(&response, Some(&sorted), &[])
        );
    }

    #[test]
    fn parse_accepts_well_formed_payload() {
        let raw = serde_json::json!({
            "match_score": 77,
            "strengths": ["clear communicator"],
            "weaknesses": [],
            "recommendations": ["advance to onsite"],
            "risk_factors": [],
            "potential_role_fit": ["backend engineer"]
        });
        let insights = InsightService::parse_insights(&raw);
        assert_eq!(insights.match_score, 77);
        assert_eq!(insights.strengths, vec!["clear communicator"]);
    }

    #[test]
    fn parse_clamps_out_of_range_scores() {
        let raw = serde_json::json!({ "match_score": 250 });
        assert_eq!(InsightService::parse_insights(&raw).match_score, 100);

        let raw = serde_json::json!({ "match_score": -5 });
        assert_eq!(InsightService::parse_insights(&raw).match_score, 0);
    }

    #[test]
    fn parse_degrades_to_empty_on_garbage() {
        let raw = serde_json::json!(["not", "an", "object"]);
        let insights = InsightService::parse_insights(&raw);
        assert_eq!(insights.match_score, 0);
        assert!(insights.strengths.is_empty());
        assert!(insights.risk_factors.is_empty());
    }
}
