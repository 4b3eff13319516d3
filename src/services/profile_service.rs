use crate::dto::workflow_dto::UpsertProfilePayload;
use crate::error::Result;
use crate::models::profile::CandidateProfile;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Clone)]
pub struct ProfileService {
    pool: PgPool,
}

impl ProfileService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn upsert(
        &self,
        response_id: Uuid,
        payload: UpsertProfilePayload,
    ) -> Result<CandidateProfile> {
        let profile = sqlx::query_as::<_, CandidateProfile>(
            r#"
            INSERT INTO candidate_profiles (response_id, skills, experience_years, location, education, work_history, summary)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (response_id) DO UPDATE SET
                skills = EXCLUDED.skills,
                experience_years = EXCLUDED.experience_years,
                location = EXCLUDED.location,
                education = EXCLUDED.education,
                work_history = EXCLUDED.work_history,
                summary = EXCLUDED.summary,
                updated_at = NOW()
            RETURNING id, response_id, skills, experience_years, location, education,
                      work_history, summary, created_at, updated_at
            "#,
        )
        .bind(response_id)
        .bind(&payload.skills)
        .bind(payload.experience_years)
        .bind(payload.location)
        .bind(payload.education)
        .bind(payload.work_history)
        .bind(payload.summary)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn get(&self, response_id: Uuid) -> Result<Option<CandidateProfile>> {
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

    /// All profiles keyed by response, for joining onto a candidate list.
    pub async fn by_response(&self) -> Result<HashMap<Uuid, CandidateProfile>> {
        let profiles = sqlx::query_as::<_, CandidateProfile>(
            r#"
            SELECT id, response_id, skills, experience_years, location, education,
                   work_history, summary, created_at, updated_at
            FROM candidate_profiles
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles.into_iter().map(|p| (p.response_id, p)).collect())
    }
}
