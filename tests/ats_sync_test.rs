use std::env;

use hiring_backend::models::response::CandidateStatus;
use uuid::Uuid;

#[tokio::test]
async fn failed_provider_sync_is_logged() {
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
    .bind("ATS Sync Candidate")
    .bind(format!("ats_sync_{}@example.com", Uuid::new_v4()))
    .bind(CandidateStatus::Selected)
    .fetch_one(&pool)
    .await
    .expect("seed candidate");

    // A real provider key is never available here, so the remote call fails
    // whichever way it goes; the failure must still land in the sync log.
    let integration_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO ats_integrations (organization_id, provider, api_key)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind("greenhouse")
    .bind("invalid-test-key")
    .fetch_one(&pool)
    .await
    .expect("seed integration");

    let state = hiring_backend::AppState::new(pool.clone());

    let outcome = state
        .ats_service
        .sync_status(integration_id, response_id, CandidateStatus::Selected)
        .await
        .expect("sync_status returns a structured outcome");
    assert!(!outcome.success);
    assert!(outcome.error.is_some());

    let logs = state
        .ats_service
        .sync_logs(response_id)
        .await
        .expect("sync logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].integration_id, integration_id);
    assert_eq!(logs[0].sync_type, "status_update");
    assert_eq!(logs[0].status, "failed");
    assert!(logs[0].error.is_some());

    // Keep the broken integration out of the event worker's fan-out.
    sqlx::query(r#"UPDATE ats_integrations SET is_active = FALSE WHERE id = $1"#)
        .bind(integration_id)
        .execute(&pool)
        .await
        .expect("deactivate integration");
}
