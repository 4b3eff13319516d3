use crate::dto::workflow_dto::StatusChangeOutcome;
use crate::error::{Error, Result};
use crate::models::event::{EVENT_ATS_STATUS_CHANGED, EVENT_NOTIFY_STATUS_CHANGED};
use crate::models::response::{
    CandidateResponse, CandidateStatus, RequestState, StatusChangeRequest, StatusHistoryRecord,
};
use crate::services::outbox_service::OutboxService;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub notify_candidate: bool,
    pub notify_recruiter: bool,
}

impl NotificationSettings {
    pub const fn none() -> Self {
        Self {
            notify_candidate: false,
            notify_recruiter: false,
        }
    }

    pub const fn recruiter() -> Self {
        Self {
            notify_candidate: false,
            notify_recruiter: true,
        }
    }

    pub const fn both() -> Self {
        Self {
            notify_candidate: true,
            notify_recruiter: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransitionRule {
    pub from: CandidateStatus,
    pub to: CandidateStatus,
    pub requires_approval: bool,
    pub notifications: NotificationSettings,
}

/// The legal transition graph. Built once at startup and handed to the
/// workflow service; nothing else defines what a valid transition is.
/// No implicit self-transitions, no wildcards.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    rules: Vec<TransitionRule>,
}

impl TransitionTable {
    pub fn with_rules(rules: Vec<TransitionRule>) -> Self {
        Self { rules }
    }

    /// Default rule set: `pending` is the only entry state, `withdrawn` and
    /// `rejected` have no outgoing rules, and approval is required exactly
    /// for the two high-stakes moves out of `in_review`.
    pub fn standard() -> Self {
        use CandidateStatus::*;

        let auto = |from, to, notifications| TransitionRule {
            from,
            to,
            requires_approval: false,
            notifications,
        };
        let gated = |from, to, notifications| TransitionRule {
            from,
            to,
            requires_approval: true,
            notifications,
        };

        Self::with_rules(vec![
            auto(Pending, InReview, NotificationSettings::recruiter()),
            auto(Pending, OnHold, NotificationSettings::none()),
            auto(Pending, Withdrawn, NotificationSettings::recruiter()),
            gated(InReview, Selected, NotificationSettings::both()),
            gated(InReview, Rejected, NotificationSettings::both()),
            auto(InReview, OnHold, NotificationSettings::none()),
            auto(InReview, Withdrawn, NotificationSettings::recruiter()),
            auto(OnHold, InReview, NotificationSettings::recruiter()),
            auto(OnHold, Withdrawn, NotificationSettings::recruiter()),
            auto(Selected, Withdrawn, NotificationSettings::both()),
        ])
    }

    pub fn find(&self, from: CandidateStatus, to: CandidateStatus) -> Option<&TransitionRule> {
        self.rules.iter().find(|r| r.from == from && r.to == to)
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }
}

#[derive(Clone)]
pub struct WorkflowService {
    pool: PgPool,
    table: Arc<TransitionTable>,
    outbox: OutboxService,
}

impl WorkflowService {
    pub fn new(pool: PgPool, table: Arc<TransitionTable>, outbox: OutboxService) -> Self {
        Self {
            pool,
            table,
            outbox,
        }
    }

    pub async fn get_response(&self, id: Uuid) -> Result<Option<CandidateResponse>> {
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

    pub async fn list_responses(&self) -> Result<Vec<CandidateResponse>> {
        let responses = sqlx::query_as::<_, CandidateResponse>(
            r#"
            SELECT id, interview_id, name, email, status, overall_score, duration_seconds,
                   tab_switches, analytics, insights, created_at, updated_at
            FROM candidate_responses
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(responses)
    }

    /// Validate and execute a status transition. Approval-gated rules file a
    /// pending request instead of mutating the candidate; everything else is
    /// applied with an optimistic conditional update so two concurrent
    /// requests cannot both win the same transition.
    pub async fn update_status(
        &self,
        response_id: Uuid,
        new_status: CandidateStatus,
        reason: Option<String>,
        requested_by: &str,
        is_automatic: bool,
    ) -> Result<StatusChangeOutcome> {
        let current = self
            .current_status(response_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Candidate response {} not found", response_id)))?;

        let rule = self.table.find(current, new_status).ok_or(Error::InvalidTransition {
            from: current.to_string(),
            to: new_status.to_string(),
        })?;

        if rule.requires_approval {
            let request = self
                .file_change_request(response_id, current, new_status, reason, requested_by)
                .await?;
            return Ok(StatusChangeOutcome::pending_approval(request.id));
        }

        self.apply_transition(response_id, *rule, reason, requested_by, is_automatic)
            .await?;

        Ok(StatusChangeOutcome::applied(format!(
            "Status changed from '{}' to '{}'",
            current, new_status
        )))
    }

    /// Approve a pending request. The candidate's current status is
    /// re-validated first: it may have moved since the request was filed.
    pub async fn approve_request(
        &self,
        request_id: Uuid,
        approved_by: &str,
        comments: Option<String>,
    ) -> Result<StatusChangeOutcome> {
        let request = self.get_request(request_id).await?;
        if request.state != RequestState::Pending {
            return Err(Error::BadRequest(format!(
                "Status change request {} has already been reviewed",
                request_id
            )));
        }

        let current = self
            .current_status(request.response_id)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Candidate response {} not found", request.response_id))
            })?;
        if current != request.from_status {
            return Err(Error::Conflict(format!(
                "Candidate is now '{}', request was filed against '{}'",
                current, request.from_status
            )));
        }

        let rule = self
            .table
            .find(request.from_status, request.to_status)
            .ok_or(Error::InvalidTransition {
                from: request.from_status.to_string(),
                to: request.to_status.to_string(),
            })?;

        self.apply_transition(
            request.response_id,
            *rule,
            request.reason.clone(),
            approved_by,
            false,
        )
        .await?;

        self.mark_reviewed(request_id, RequestState::Approved, approved_by, comments)
            .await?;

        Ok(StatusChangeOutcome::applied(format!(
            "Approved: status changed from '{}' to '{}'",
            request.from_status, request.to_status
        )))
    }

    /// Reject a pending request. Marks the request only; the candidate is
    /// never touched.
    pub async fn reject_request(
        &self,
        request_id: Uuid,
        reviewed_by: &str,
        comments: Option<String>,
    ) -> Result<StatusChangeOutcome> {
        let request = self.get_request(request_id).await?;
        if request.state != RequestState::Pending {
            return Err(Error::BadRequest(format!(
                "Status change request {} has already been reviewed",
                request_id
            )));
        }

        self.mark_reviewed(request_id, RequestState::Rejected, reviewed_by, comments)
            .await?;

        Ok(StatusChangeOutcome::applied(format!(
            "Status change request {} rejected",
            request_id
        )))
    }

    pub async fn history(&self, response_id: Uuid) -> Result<Vec<StatusHistoryRecord>> {
        let records = sqlx::query_as::<_, StatusHistoryRecord>(
            r#"
            SELECT id, response_id, from_status, to_status, changed_by, reason, is_automatic, changed_at
            FROM candidate_status_history
            WHERE response_id = $1
            ORDER BY changed_at DESC
            "#,
        )
        .bind(response_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn pending_requests(&self) -> Result<Vec<StatusChangeRequest>> {
        let requests = sqlx::query_as::<_, StatusChangeRequest>(
            r#"
            SELECT id, response_id, from_status, to_status, reason, requested_by, state,
                   reviewed_by, review_comments, created_at, reviewed_at
            FROM status_change_requests
            WHERE state = 'pending'
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    pub async fn status_counts(&self) -> Result<HashMap<String, i64>> {
        let rows = sqlx::query_as::<_, (CandidateStatus, i64)>(
            r#"
            SELECT status, COUNT(*)
            FROM candidate_responses
            GROUP BY status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(status, count)| (status.to_string(), count))
            .collect())
    }

    async fn current_status(&self, response_id: Uuid) -> Result<Option<CandidateStatus>> {
        let status = sqlx::query_scalar::<_, CandidateStatus>(
            r#"SELECT status FROM candidate_responses WHERE id = $1"#,
        )
        .bind(response_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(status)
    }

    async fn get_request(&self, request_id: Uuid) -> Result<StatusChangeRequest> {
        let request = sqlx::query_as::<_, StatusChangeRequest>(
            r#"
            SELECT id, response_id, from_status, to_status, reason, requested_by, state,
                   reviewed_by, review_comments, created_at, reviewed_at
            FROM status_change_requests
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Status change request {} not found", request_id)))?;
        Ok(request)
    }

    async fn file_change_request(
        &self,
        response_id: Uuid,
        from: CandidateStatus,
        to: CandidateStatus,
        reason: Option<String>,
        requested_by: &str,
    ) -> Result<StatusChangeRequest> {
        let request = sqlx::query_as::<_, StatusChangeRequest>(
            r#"
            INSERT INTO status_change_requests (response_id, from_status, to_status, reason, requested_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, response_id, from_status, to_status, reason, requested_by, state,
                      reviewed_by, review_comments, created_at, reviewed_at
            "#,
        )
        .bind(response_id)
        .bind(from)
        .bind(to)
        .bind(reason)
        .bind(requested_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(request)
    }

    async fn mark_reviewed(
        &self,
        request_id: Uuid,
        state: RequestState,
        reviewed_by: &str,
        comments: Option<String>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE status_change_requests
            SET state = $2, reviewed_by = $3, review_comments = $4, reviewed_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(request_id)
        .bind(state)
        .bind(reviewed_by)
        .bind(comments)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Conditional update is the concurrency guard: the WHERE clause on the
    /// observed `from` status makes the transition apply exactly once even
    /// when two requests race on the same candidate. History and outbox rows
    /// commit atomically with the status flip.
    async fn apply_transition(
        &self,
        response_id: Uuid,
        rule: TransitionRule,
        reason: Option<String>,
        changed_by: &str,
        is_automatic: bool,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE candidate_responses
            SET status = $1, updated_at = NOW()
            WHERE id = $2 AND status = $3
            "#,
        )
        .bind(rule.to)
        .bind(response_id)
        .bind(rule.from)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(Error::Conflict(format!(
                "Candidate {} is no longer '{}'; transition not applied",
                response_id, rule.from
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO candidate_status_history (response_id, from_status, to_status, changed_by, reason, is_automatic)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(response_id)
        .bind(rule.from)
        .bind(rule.to)
        .bind(changed_by)
        .bind(&reason)
        .bind(is_automatic)
        .execute(&mut *tx)
        .await?;

        // Post-commit fan-out. One event row per consumer, so the notifier
        // and the ATS sync retry independently; their failures never surface
        // here.
        let payload = serde_json::json!({
            "response_id": response_id,
            "from_status": rule.from,
            "to_status": rule.to,
            "changed_by": changed_by,
            "reason": reason,
            "is_automatic": is_automatic,
            "notifications": rule.notifications,
        });
        self.outbox
            .emit(&mut *tx, EVENT_NOTIFY_STATUS_CHANGED, payload.clone())
            .await?;
        self.outbox
            .emit(&mut *tx, EVENT_ATS_STATUS_CHANGED, payload)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CandidateStatus::*;

    const ALL: [CandidateStatus; 6] = [Pending, InReview, Selected, Rejected, OnHold, Withdrawn];

    #[test]
    fn undefined_pairs_have_no_rule() {
        let table = TransitionTable::standard();
        assert!(table.find(Rejected, Pending).is_none());
        assert!(table.find(Withdrawn, InReview).is_none());
        assert!(table.find(Pending, Selected).is_none());
        assert!(table.find(Selected, Rejected).is_none());
    }

    #[test]
    fn no_self_transitions() {
        let table = TransitionTable::standard();
        for status in ALL {
            assert!(table.find(status, status).is_none(), "{} -> {}", status, status);
        }
    }

    #[test]
    fn approval_required_exactly_for_review_decisions() {
        let table = TransitionTable::standard();
        for rule in table.rules() {
            let gated = matches!((rule.from, rule.to), (InReview, Selected) | (InReview, Rejected));
            assert_eq!(rule.requires_approval, gated, "{} -> {}", rule.from, rule.to);
        }
    }

    #[test]
    fn terminal_states_have_no_outgoing_rules() {
        let table = TransitionTable::standard();
        for rule in table.rules() {
            assert_ne!(rule.from, Rejected);
            assert_ne!(rule.from, Withdrawn);
        }
    }

    #[test]
    fn pending_is_never_a_target() {
        let table = TransitionTable::standard();
        assert!(table.rules().iter().all(|r| r.to != Pending));
    }

    #[test]
    fn custom_rule_sets_are_honored() {
        let table = TransitionTable::with_rules(vec![TransitionRule {
            from: Rejected,
            to: InReview,
            requires_approval: true,
            notifications: NotificationSettings::none(),
        }]);
        assert!(table.find(Rejected, InReview).is_some());
        assert!(table.find(Pending, InReview).is_none());
    }
}
