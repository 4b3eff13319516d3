use serde::{Deserialize, Serialize};

/// Structured judgment produced by the external text-generation service.
/// A zeroed/empty value is the degraded result when the service fails or
/// returns something unparseable, so downstream ranking never crashes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateInsights {
    #[serde(default)]
    pub match_score: i32,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub potential_role_fit: Vec<String>,
}
