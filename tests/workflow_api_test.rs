use std::env;

use hiring_backend::error::Error;
use hiring_backend::models::event::{
    WorkflowEvent, EVENT_ATS_STATUS_CHANGED, EVENT_NOTIFY_STATUS_CHANGED,
};
use hiring_backend::models::response::{CandidateStatus, RequestState, StatusChangeRequest};
use uuid::Uuid;

#[tokio::test]
async fn status_workflow_end_to_end() {
    dotenvy::dotenv().ok();
    env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    env::set_var("JWT_SECRET", "test_secret_key");
    env::set_var("WEBHOOK_SECRET", "whsec_test");
    env::set_var("OPENAI_API_KEY", "sk-test");
    env::set_var("INTEGRATION_RPS", "100");

    hiring_backend::config::init_config().expect("init config");

    let pool = hiring_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let response_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO candidate_responses (interview_id, name, email, status)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("Workflow E2E Candidate")
    .bind(format!("workflow_e2e_{}@example.com", Uuid::new_v4()))
    .bind(CandidateStatus::InReview)
    .fetch_one(&pool)
    .await
    .expect("seed candidate");

    let state = hiring_backend::AppState::new(pool.clone());
    let workflow = &state.workflow_service;

    // A gated transition files a request instead of moving the candidate,
    // and filing it twice yields two independent pending requests.
    let first = workflow
        .update_status(response_id, CandidateStatus::Selected, None, "hr-1", false)
        .await
        .expect("first gated request");
    let second = workflow
        .update_status(response_id, CandidateStatus::Selected, None, "hr-2", false)
        .await
        .expect("second gated request");

    assert_eq!(first.requires_approval, Some(true));
    assert_eq!(second.requires_approval, Some(true));
    let first_id = first.request_id.expect("first request id");
    let second_id = second.request_id.expect("second request id");
    assert_ne!(first_id, second_id);

    let current = workflow
        .get_response(response_id)
        .await
        .expect("get response")
        .expect("response exists");
    assert_eq!(current.status, CandidateStatus::InReview);

    let pending = workflow.pending_requests().await.expect("pending requests");
    let pending_ids: Vec<Uuid> = pending.iter().map(|r| r.id).collect();
    assert!(pending_ids.contains(&first_id));
    assert!(pending_ids.contains(&second_id));

    // Approving applies the transition and marks the request reviewed.
    let approved = workflow
        .approve_request(first_id, "admin-1", Some("looks good".to_string()))
        .await
        .expect("approve");
    assert!(approved.success);

    let current = workflow
        .get_response(response_id)
        .await
        .expect("get response")
        .expect("response exists");
    assert_eq!(current.status, CandidateStatus::Selected);

    let reviewed = sqlx::query_as::<_, StatusChangeRequest>(
        r#"
        SELECT id, response_id, from_status, to_status, reason, requested_by, state,
               reviewed_by, review_comments, created_at, reviewed_at
        FROM status_change_requests
        WHERE id = $1
        "#,
    )
    .bind(first_id)
    .fetch_one(&pool)
    .await
    .expect("fetch reviewed request");
    assert_eq!(reviewed.state, RequestState::Approved);
    assert_eq!(reviewed.reviewed_by.as_deref(), Some("admin-1"));
    assert_eq!(reviewed.review_comments.as_deref(), Some("looks good"));
    assert!(reviewed.reviewed_at.is_some());

    // A reviewed request cannot be approved again.
    let again = workflow
        .approve_request(first_id, "admin-1", None)
        .await
        .expect_err("second approval must fail");
    assert!(matches!(again, Error::BadRequest(_)));

    // The sibling request was filed against a status the candidate has left.
    let stale = workflow
        .approve_request(second_id, "admin-1", None)
        .await
        .expect_err("stale approval must fail");
    assert!(matches!(stale, Error::Conflict(_)));

    let history = workflow.history(response_id).await.expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_status, CandidateStatus::Selected);
    assert_eq!(history[0].changed_by, "admin-1");

    // The applied transition fanned out as one outbox row per consumer.
    let mut events = sqlx::query_as::<_, WorkflowEvent>(
        r#"
        SELECT id, event_type, payload, status, attempts, max_attempts, last_error,
               next_retry_at, created_at, updated_at
        FROM workflow_events
        WHERE payload->>'response_id' = $1
        ORDER BY event_type
        "#,
    )
    .bind(response_id.to_string())
    .fetch_all(&pool)
    .await
    .expect("fetch events");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, EVENT_ATS_STATUS_CHANGED);
    assert_eq!(events[1].event_type, EVENT_NOTIFY_STATUS_CHANGED);

    // Drain the queue; with no webhook configured and no active integrations
    // both consumers complete and the rows end up done.
    while state
        .outbox_service
        .run_once(&state.notification_service, &state.ats_service)
        .await
        .expect("run_once")
    {}

    for event in events.drain(..) {
        let processed = state
            .outbox_service
            .get(event.id)
            .await
            .expect("get event")
            .expect("event exists");
        assert_eq!(processed.status, "done", "event {}", processed.event_type);
    }
}
