pub mod ats_service;
pub mod export_service;
pub mod filter_service;
pub mod insight_service;
pub mod notification_service;
pub mod outbox_service;
pub mod profile_service;
pub mod scoring_service;
pub mod workflow_service;
