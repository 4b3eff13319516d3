use crate::dto::assessment_dto::{
    CreateSkillAssessmentPayload, SubmitAssessmentPayload, UpdateSkillAssessmentPayload,
};
use crate::error::{Error, Result};
use crate::models::assessment::{CandidateAssessment, SkillAssessment};
use crate::models::response::CandidateStatus;
use crate::services::workflow_service::WorkflowService;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct ScoringService {
    pool: PgPool,
    workflow: WorkflowService,
}

impl ScoringService {
    pub fn new(pool: PgPool, workflow: WorkflowService) -> Self {
        Self { pool, workflow }
    }

    /// Overall score in 0..=100: each assessment normalized to a percentage
    /// of its max (non-positive max contributes 0), arithmetic mean, rounded.
    /// Every assessment weighs the same regardless of declared difficulty.
    pub fn overall_score(assessments: &[CandidateAssessment]) -> i32 {
        if assessments.is_empty() {
            return 0;
        }

        let sum: f64 = assessments
            .iter()
            .map(|a| Self::percentage(a.score, a.max_score))
            .sum();

        (sum / assessments.len() as f64).round() as i32
    }

    fn percentage(score: Decimal, max_score: Decimal) -> f64 {
        if max_score <= Decimal::ZERO {
            return 0.0;
        }
        let score = score.to_f64().unwrap_or(0.0);
        let max = max_score.to_f64().unwrap_or(0.0);
        (score / max * 100.0).clamp(0.0, 100.0)
    }

    pub async fn create_template(
        &self,
        payload: CreateSkillAssessmentPayload,
    ) -> Result<SkillAssessment> {
        let template = sqlx::query_as::<_, SkillAssessment>(
            r#"
            INSERT INTO skill_assessments (title, assessment_type, difficulty, time_limit_minutes, passing_score, criteria_weights)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, assessment_type, difficulty, time_limit_minutes, passing_score,
                      criteria_weights, created_at, updated_at
            "#,
        )
        .bind(payload.title)
        .bind(payload.assessment_type)
        .bind(payload.difficulty.unwrap_or_else(|| "medium".to_string()))
        .bind(payload.time_limit_minutes.unwrap_or(30))
        .bind(payload.passing_score.unwrap_or_else(|| Decimal::from(60)))
        .bind(payload.criteria_weights)
        .fetch_one(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn list_templates(&self) -> Result<Vec<SkillAssessment>> {
        let templates = sqlx::query_as::<_, SkillAssessment>(
            r#"
            SELECT id, title, assessment_type, difficulty, time_limit_minutes, passing_score,
                   criteria_weights, created_at, updated_at
            FROM skill_assessments
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    pub async fn get_template(&self, id: Uuid) -> Result<Option<SkillAssessment>> {
        let template = sqlx::query_as::<_, SkillAssessment>(
            r#"
            SELECT id, title, assessment_type, difficulty, time_limit_minutes, passing_score,
                   criteria_weights, created_at, updated_at
            FROM skill_assessments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(template)
    }

    pub async fn update_template(
        &self,
        id: Uuid,
        payload: UpdateSkillAssessmentPayload,
    ) -> Result<SkillAssessment> {
        let template = sqlx::query_as::<_, SkillAssessment>(
            r#"
            UPDATE skill_assessments
            SET title = COALESCE($2, title),
                assessment_type = COALESCE($3, assessment_type),
                difficulty = COALESCE($4, difficulty),
                time_limit_minutes = COALESCE($5, time_limit_minutes),
                passing_score = COALESCE($6, passing_score),
                criteria_weights = COALESCE($7, criteria_weights),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, assessment_type, difficulty, time_limit_minutes, passing_score,
                      criteria_weights, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(payload.title)
        .bind(payload.assessment_type)
        .bind(payload.difficulty)
        .bind(payload.time_limit_minutes)
        .bind(payload.passing_score)
        .bind(payload.criteria_weights)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Skill assessment {} not found", id)))?;
        Ok(template)
    }

    /// Templates with recorded submissions cannot be deleted.
    pub async fn delete_template(&self, id: Uuid) -> Result<()> {
        let deleted = sqlx::query(r#"DELETE FROM skill_assessments WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => Error::Conflict(
                    format!("Skill assessment {} has recorded submissions", id),
                ),
                _ => Error::from(e),
            })?;

        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Skill assessment {} not found", id)));
        }
        Ok(())
    }

    /// Record a completed assessment and refresh the candidate's aggregated
    /// score. A second submission for the same (assessment, response) pair is
    /// rejected by the unique constraint. A freshly scored `pending`
    /// candidate is auto-advanced into review.
    pub async fn submit_assessment(
        &self,
        payload: SubmitAssessmentPayload,
    ) -> Result<CandidateAssessment> {
        let template = self
            .get_template(payload.assessment_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Skill assessment {} not found", payload.assessment_id))
            })?;

        let response = self
            .workflow
            .get_response(payload.response_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Candidate response {} not found", payload.response_id))
            })?;

        let passed = Self::percentage(payload.score, payload.max_score)
            >= template.passing_score.to_f64().unwrap_or(0.0);

        let assessment = sqlx::query_as::<_, CandidateAssessment>(
            r#"
            INSERT INTO candidate_assessments (assessment_id, response_id, score, max_score, passed, time_spent_seconds, evaluation)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, assessment_id, response_id, score, max_score, passed,
                      time_spent_seconds, evaluation, completed_at
            "#,
        )
        .bind(payload.assessment_id)
        .bind(payload.response_id)
        .bind(payload.score)
        .bind(payload.max_score)
        .bind(passed)
        .bind(payload.time_spent_seconds)
        .bind(payload.evaluation)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => Error::BadRequest(format!(
                "Candidate {} has already completed assessment {}",
                payload.response_id, payload.assessment_id
            )),
            _ => Error::from(e),
        })?;

        self.refresh_overall_score(payload.response_id).await?;

        if response.status == CandidateStatus::Pending {
            if let Err(e) = self
                .workflow
                .update_status(
                    payload.response_id,
                    CandidateStatus::InReview,
                    Some("Assessment submitted".to_string()),
                    "system",
                    true,
                )
                .await
            {
                tracing::warn!(
                    response = %payload.response_id,
                    error = ?e,
                    "Auto-advance to in_review skipped"
                );
            }
        }

        Ok(assessment)
    }

    pub async fn assessments_for_response(
        &self,
        response_id: Uuid,
    ) -> Result<Vec<CandidateAssessment>> {
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

    async fn refresh_overall_score(&self, response_id: Uuid) -> Result<i32> {
        let assessments = self.assessments_for_response(response_id).await?;
        let overall = Self::overall_score(&assessments);

        sqlx::query(
            r#"UPDATE candidate_responses SET overall_score = $1, updated_at = NOW() WHERE id = $2"#,
        )
        .bind(overall)
        .bind(response_id)
        .execute(&self.pool)
        .await?;

        Ok(overall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessment(score: i64, max_score: i64) -> CandidateAssessment {
        CandidateAssessment {
            id: Uuid::new_v4(),
            assessment_id: Uuid::new_v4(),
            response_id: Uuid::new_v4(),
            score: Decimal::from(score),
            max_score: Decimal::from(max_score),
            passed: false,
            time_spent_seconds: None,
            evaluation: None,
            completed_at: None,
        }
    }

    #[test]
    fn empty_list_scores_zero() {
        assert_eq!(ScoringService::overall_score(&[]), 0);
    }

    #[test]
    fn single_assessment_is_its_percentage() {
        assert_eq!(ScoringService::overall_score(&[assessment(80, 100)]), 80);
        assert_eq!(ScoringService::overall_score(&[assessment(7, 10)]), 70);
    }

    #[test]
    fn mean_of_normalized_percentages_rounded() {
        let list = [assessment(50, 100), assessment(100, 100)];
        assert_eq!(ScoringService::overall_score(&list), 75);

        let list = [assessment(1, 3), assessment(2, 3)];
        // 33.33 and 66.67 average to 50
        assert_eq!(ScoringService::overall_score(&list), 50);
    }

    #[test]
    fn non_positive_max_contributes_zero() {
        let list = [assessment(50, 0), assessment(100, 100)];
        assert_eq!(ScoringService::overall_score(&list), 50);

        let list = [assessment(10, -5)];
        assert_eq!(ScoringService::overall_score(&list), 0);
    }
}
