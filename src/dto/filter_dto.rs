use crate::dto::insight_dto::CandidateInsights;
use crate::models::profile::CandidateProfile;
use crate::models::response::{CandidateResponse, CandidateStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceBounds {
    pub min: Option<i32>,
    pub max: Option<i32>,
}

/// Transient query object, constructed per filter request and never
/// persisted. Absent criteria impose no constraint; present criteria are
/// AND-combined.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterCriteria {
    pub min_score: Option<i32>,
    pub max_score: Option<i32>,
    pub skills: Option<Vec<String>>,
    pub experience_years: Option<ExperienceBounds>,
    pub locations: Option<Vec<String>>,
    pub statuses: Option<Vec<CandidateStatus>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub criteria: FilterCriteria,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// A response joined with its optional profile and cached AI insight, the
/// unit the filter engine operates on.
#[derive(Debug, Clone, Serialize)]
pub struct EnhancedCandidate {
    #[serde(flatten)]
    pub response: CandidateResponse,
    pub profile: Option<CandidateProfile>,
    // Renamed on the wire: the flattened response already carries a raw
    // `insights` column.
    #[serde(rename = "ai_insights")]
    pub insights: Option<CandidateInsights>,
}

impl EnhancedCandidate {
    pub fn score(&self) -> i32 {
        self.response.overall_score.unwrap_or(0)
    }

    pub fn match_score(&self) -> i32 {
        self.insights.as_ref().map(|i| i.match_score).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformerSummary {
    pub response_id: Uuid,
    pub name: String,
    pub score: i32,
}

/// Aggregates computed over the filtered, pre-pagination set. The top
/// performer and needs-review buckets are intentionally not exclusive.
#[derive(Debug, Clone, Serialize)]
pub struct FilterInsights {
    pub average_score: f64,
    pub skill_distribution: HashMap<String, usize>,
    pub status_distribution: HashMap<String, usize>,
    pub top_performers: Vec<PerformerSummary>,
    pub needs_review: Vec<PerformerSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilteredCandidates {
    pub candidates: Vec<EnhancedCandidate>,
    pub total_count: usize,
    pub page: u32,
    pub limit: u32,
    pub insights: FilterInsights,
}
