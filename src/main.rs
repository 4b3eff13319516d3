use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use hiring_backend::middleware::rate_limit::{rps_middleware, RateLimiter};
use hiring_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                match state
                    .outbox_service
                    .run_once(&state.notification_service, &state.ats_service)
                    .await
                {
                    Ok(true) => {}
                    Ok(false) => {
                        tokio::time::sleep(Duration::from_millis(750)).await;
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "Workflow event worker error");
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        });
    }

    let base_routes = Router::new().route("/health", get(routes::health::health));

    // One shared window across both route groups.
    let rate_limiter = RateLimiter::new(config.integration_rps);

    // Approving or rejecting a gated transition needs a reviewer role on top
    // of a valid token.
    let review_api = Router::new()
        .route(
            "/api/integration/status-requests/:id/approve",
            post(routes::candidate_routes::approve_status_request),
        )
        .route(
            "/api/integration/status-requests/:id/reject",
            post(routes::candidate_routes::reject_status_request),
        )
        .layer(axum::middleware::from_fn(
            hiring_backend::middleware::auth::require_reviewer,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter.clone(),
            rps_middleware,
        ));

    let integration_api = Router::new()
        .route(
            "/api/integration/candidates",
            get(routes::candidate_routes::list_responses),
        )
        .route(
            "/api/integration/candidates/filter",
            post(routes::filter_routes::filter_candidates),
        )
        .route(
            "/api/integration/candidates/export",
            post(routes::filter_routes::export_filtered_candidates),
        )
        .route(
            "/api/integration/candidates/:id",
            get(routes::candidate_routes::get_response),
        )
        .route(
            "/api/integration/candidates/:id/history",
            get(routes::candidate_routes::get_status_history),
        )
        .route(
            "/api/integration/candidates/:id/status",
            post(routes::candidate_routes::update_status),
        )
        .route(
            "/api/integration/candidates/:id/profile",
            put(routes::candidate_routes::upsert_profile)
                .get(routes::candidate_routes::get_profile),
        )
        .route(
            "/api/integration/candidates/:id/assessments",
            get(routes::assessment_routes::list_response_assessments),
        )
        .route(
            "/api/integration/candidates/:id/insights",
            post(routes::insight_routes::generate_insights),
        )
        .route(
            "/api/integration/candidates/:id/sync-logs",
            get(routes::ats_routes::list_sync_logs),
        )
        .route(
            "/api/integration/status-requests",
            get(routes::candidate_routes::list_pending_requests),
        )
        .route(
            "/api/integration/assessments",
            get(routes::assessment_routes::list_templates)
                .post(routes::assessment_routes::create_template),
        )
        .route(
            "/api/integration/assessments/submit",
            post(routes::assessment_routes::submit_assessment),
        )
        .route(
            "/api/integration/assessments/:id",
            get(routes::assessment_routes::get_template)
                .patch(routes::assessment_routes::update_template)
                .delete(routes::assessment_routes::delete_template),
        )
        .route(
            "/api/integration/dashboard/stats",
            get(routes::candidate_routes::get_dashboard_stats),
        )
        .route(
            "/api/integration/ats/integrations",
            get(routes::ats_routes::list_integrations).post(routes::ats_routes::create_integration),
        )
        .route(
            "/api/integration/ats/integrations/:id/validate",
            post(routes::ats_routes::validate_integration),
        )
        .route(
            "/api/integration/ats/integrations/:id/candidates/:response_id/sync",
            post(routes::ats_routes::sync_candidate),
        )
        .route(
            "/api/integration/ats/integrations/:id/candidates/:response_id/sync-status",
            post(routes::ats_routes::sync_status),
        )
        .route(
            "/api/integration/ats/integrations/:id/candidates/:response_id/sync-assessments",
            post(routes::ats_routes::sync_assessments),
        )
        .layer(axum::middleware::from_fn(
            hiring_backend::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limiter,
            rps_middleware,
        ));

    let app = base_routes
        .merge(review_api)
        .merge(integration_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
