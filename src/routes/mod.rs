pub mod assessment_routes;
pub mod ats_routes;
pub mod candidate_routes;
pub mod filter_routes;
pub mod health;
pub mod insight_routes;
