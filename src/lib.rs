pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::services::{
    ats_service::AtsSyncService, insight_service::InsightService,
    notification_service::NotificationService, outbox_service::OutboxService,
    profile_service::ProfileService, scoring_service::ScoringService,
    workflow_service::{TransitionTable, WorkflowService},
};
use reqwest::Client;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub workflow_service: WorkflowService,
    pub scoring_service: ScoringService,
    pub insight_service: InsightService,
    pub profile_service: ProfileService,
    pub ats_service: AtsSyncService,
    pub notification_service: NotificationService,
    pub outbox_service: OutboxService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap();

        let table = Arc::new(TransitionTable::standard());
        let outbox_service = OutboxService::new(pool.clone());
        let workflow_service = WorkflowService::new(pool.clone(), table, outbox_service.clone());
        let scoring_service = ScoringService::new(pool.clone(), workflow_service.clone());
        let insight_service = InsightService::new(
            pool.clone(),
            config.openai_api_key.clone(),
            http_client.clone(),
        );
        let profile_service = ProfileService::new(pool.clone());
        let ats_service = AtsSyncService::new(pool.clone(), http_client.clone());
        let notification_service = NotificationService::new(
            http_client,
            config.status_webhook_url.clone(),
            config.webhook_secret.clone(),
        );

        Self {
            pool,
            workflow_service,
            scoring_service,
            insight_service,
            profile_service,
            ats_service,
            notification_service,
            outbox_service,
        }
    }
}
