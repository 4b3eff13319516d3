use crate::dto::filter_dto::{
    EnhancedCandidate, FilterCriteria, FilterInsights, FilteredCandidates, PerformerSummary,
};
use std::collections::HashMap;

const TOP_PERFORMER_THRESHOLD: i32 = 80;
const TOP_PERFORMER_CAP: usize = 5;
const NEEDS_REVIEW_SCORE: i32 = 60;
const NEEDS_REVIEW_TAB_SWITCHES: i32 = 10;
const NEEDS_REVIEW_RISK_FACTORS: usize = 2;

/// Pure in-memory filter/rank engine over enhanced candidates. Criteria are
/// AND-combined; ranking is by AI match score, a softer relevance signal than
/// the raw aggregated score; pagination happens only after ranking.
pub struct FilterService;

impl FilterService {
    pub fn filter(
        all_candidates: Vec<EnhancedCandidate>,
        criteria: &FilterCriteria,
        page: u32,
        limit: u32,
    ) -> FilteredCandidates {
        let mut matched: Vec<EnhancedCandidate> = all_candidates
            .into_iter()
            .filter(|c| Self::matches(c, criteria))
            .collect();

        matched.sort_by(|a, b| b.match_score().cmp(&a.match_score()));

        let insights = Self::compute_insights(&matched);
        let total_count = matched.len();

        let page = page.max(1);
        let limit = limit.max(1);
        // Page and limit come straight from the request body; the offset
        // must not overflow for any u32 pair.
        let start = ((page - 1) as usize).saturating_mul(limit as usize);
        let candidates: Vec<EnhancedCandidate> = matched
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();

        FilteredCandidates {
            candidates,
            total_count,
            page,
            limit,
            insights,
        }
    }

    fn matches(candidate: &EnhancedCandidate, criteria: &FilterCriteria) -> bool {
        let score = candidate.score();
        if let Some(min) = criteria.min_score {
            if score < min {
                return false;
            }
        }
        if let Some(max) = criteria.max_score {
            if score > max {
                return false;
            }
        }

        if let Some(wanted) = criteria.skills.as_deref() {
            if !wanted.is_empty() && !Self::matches_skills(candidate, wanted) {
                return false;
            }
        }

        if let Some(bounds) = &criteria.experience_years {
            if bounds.min.is_some() || bounds.max.is_some() {
                let Some(years) = candidate.profile.as_ref().and_then(|p| p.experience_years)
                else {
                    // No recorded experience fails any experience-bounded filter.
                    return false;
                };
                if bounds.min.is_some_and(|min| years < min) {
                    return false;
                }
                if bounds.max.is_some_and(|max| years > max) {
                    return false;
                }
            }
        }

        if let Some(locations) = criteria.locations.as_deref() {
            if !locations.is_empty() && !Self::matches_location(candidate, locations) {
                return false;
            }
        }

        if let Some(statuses) = criteria.statuses.as_deref() {
            if !statuses.is_empty() && !statuses.contains(&candidate.response.status) {
                return false;
            }
        }

        true
    }

    /// OR semantics within the list: one profile skill containing any
    /// requested term (case-insensitive) is enough.
    fn matches_skills(candidate: &EnhancedCandidate, wanted: &[String]) -> bool {
        let Some(profile) = &candidate.profile else {
            return false;
        };
        profile.skills.iter().any(|have| {
            let have = have.to_lowercase();
            wanted.iter().any(|w| have.contains(&w.to_lowercase()))
        })
    }

    fn matches_location(candidate: &EnhancedCandidate, locations: &[String]) -> bool {
        let Some(location) = candidate.profile.as_ref().and_then(|p| p.location.as_deref())
        else {
            return false;
        };
        let location = location.to_lowercase();
        locations.iter().any(|l| location.contains(&l.to_lowercase()))
    }

    /// Aggregates over the filtered, pre-pagination set. Top performers and
    /// needs-review use independent predicates, so a candidate can land in
    /// both lists.
    fn compute_insights(candidates: &[EnhancedCandidate]) -> FilterInsights {
        let average_score = if candidates.is_empty() {
            0.0
        } else {
            candidates.iter().map(|c| c.score() as f64).sum::<f64>() / candidates.len() as f64
        };

        let mut skill_distribution: HashMap<String, usize> = HashMap::new();
        for candidate in candidates {
            if let Some(profile) = &candidate.profile {
                for skill in &profile.skills {
                    *skill_distribution.entry(skill.to_lowercase()).or_insert(0) += 1;
                }
            }
        }

        let mut status_distribution: HashMap<String, usize> = HashMap::new();
        for candidate in candidates {
            *status_distribution
                .entry(candidate.response.status.to_string())
                .or_insert(0) += 1;
        }

        let mut top_performers: Vec<&EnhancedCandidate> = candidates
            .iter()
            .filter(|c| c.score() >= TOP_PERFORMER_THRESHOLD)
            .collect();
        top_performers.sort_by(|a, b| b.score().cmp(&a.score()));
        let top_performers = top_performers
            .into_iter()
            .take(TOP_PERFORMER_CAP)
            .map(Self::summary)
            .collect();

        let needs_review = candidates
            .iter()
            .filter(|c| {
                let risk_factors = c
                    .insights
                    .as_ref()
                    .map(|i| i.risk_factors.len())
                    .unwrap_or(0);
                c.score() < NEEDS_REVIEW_SCORE
                    || c.response.tab_switches > NEEDS_REVIEW_TAB_SWITCHES
                    || risk_factors > NEEDS_REVIEW_RISK_FACTORS
            })
            .map(Self::summary)
            .collect();

        FilterInsights {
            average_score,
            skill_distribution,
            status_distribution,
            top_performers,
            needs_review,
        }
    }

    fn summary(candidate: &EnhancedCandidate) -> PerformerSummary {
        PerformerSummary {
            response_id: candidate.response.id,
            name: candidate.response.name.clone(),
            score: candidate.score(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::insight_dto::CandidateInsights;
    use crate::models::profile::CandidateProfile;
    use crate::models::response::{CandidateResponse, CandidateStatus};
    use uuid::Uuid;

    struct Fixture<'a> {
        name: &'a str,
        score: i32,
        match_score: i32,
        skills: &'a [&'a str],
        experience_years: Option<i32>,
        location: Option<&'a str>,
        status: CandidateStatus,
        tab_switches: i32,
        risk_factors: usize,
    }

    impl Default for Fixture<'_> {
        fn default() -> Self {
            Fixture {
                name: "candidate",
                score: 50,
                match_score: 50,
                skills: &[],
                experience_years: None,
                location: None,
                status: CandidateStatus::InReview,
                tab_switches: 0,
                risk_factors: 0,
            }
        }
    }

    fn candidate(fx: Fixture) -> EnhancedCandidate {
        let id = Uuid::new_v4();
        EnhancedCandidate {
            response: CandidateResponse {
                id,
                interview_id: Uuid::nil(),
                name: fx.name.to_string(),
                email: format!("{}@example.com", fx.name),
                status: fx.status,
                overall_score: Some(fx.score),
                duration_seconds: None,
                tab_switches: fx.tab_switches,
                analytics: None,
                insights: None,
                created_at: None,
                updated_at: None,
            },
            profile: Some(CandidateProfile {
                id: Uuid::new_v4(),
                response_id: id,
                skills: fx.skills.iter().map(|s| s.to_string()).collect(),
                experience_years: fx.experience_years,
                location: fx.location.map(|l| l.to_string()),
                education: None,
                work_history: None,
                summary: None,
                created_at: None,
                updated_at: None,
            }),
            insights: Some(CandidateInsights {
                match_score: fx.match_score,
                risk_factors: (0..fx.risk_factors)
                    .map(|i| format!("risk {}", i))
                    .collect(),
                ..CandidateInsights::default()
            }),
        }
    }

    #[test]
    fn criteria_are_and_combined() {
        let a = candidate(Fixture {
            name: "a",
            score: 90,
            skills: &["react"],
            ..Fixture::default()
        });
        let b = candidate(Fixture {
            name: "b",
            score: 40,
            skills: &["react"],
            ..Fixture::default()
        });

        let criteria = FilterCriteria {
            min_score: Some(70),
            skills: Some(vec!["react".to_string()]),
            ..FilterCriteria::default()
        };
        let result = FilterService::filter(vec![a, b], &criteria, 1, 20);
        assert_eq!(result.total_count, 1);
        assert_eq!(result.candidates[0].response.name, "a");
    }

    #[test]
    fn skill_match_is_case_insensitive_substring_with_or_semantics() {
        let c = candidate(Fixture {
            skills: &["React Native", "TypeScript"],
            ..Fixture::default()
        });
        let criteria = FilterCriteria {
            skills: Some(vec!["react".to_string(), "golang".to_string()]),
            ..FilterCriteria::default()
        };
        let result = FilterService::filter(vec![c], &criteria, 1, 20);
        assert_eq!(result.total_count, 1);
    }

    #[test]
    fn missing_experience_fails_experience_bounded_filters() {
        let with = candidate(Fixture {
            name: "with",
            experience_years: Some(4),
            ..Fixture::default()
        });
        let without = candidate(Fixture {
            name: "without",
            experience_years: None,
            ..Fixture::default()
        });

        let criteria = FilterCriteria {
            experience_years: Some(crate::dto::filter_dto::ExperienceBounds {
                min: Some(2),
                max: Some(10),
            }),
            ..FilterCriteria::default()
        };
        let result = FilterService::filter(vec![with, without], &criteria, 1, 20);
        assert_eq!(result.total_count, 1);
        assert_eq!(result.candidates[0].response.name, "with");
    }

    #[test]
    fn location_and_status_filters() {
        let berlin = candidate(Fixture {
            name: "berlin",
            location: Some("Berlin, Germany"),
            status: CandidateStatus::Selected,
            ..Fixture::default()
        });
        let remote = candidate(Fixture {
            name: "remote",
            location: Some("Remote"),
            ..Fixture::default()
        });

        let criteria = FilterCriteria {
            locations: Some(vec!["berlin".to_string()]),
            statuses: Some(vec![CandidateStatus::Selected]),
            ..FilterCriteria::default()
        };
        let result = FilterService::filter(vec![berlin, remote], &criteria, 1, 20);
        assert_eq!(result.total_count, 1);
        assert_eq!(result.candidates[0].response.name, "berlin");
    }

    #[test]
    fn ranking_is_by_match_score_descending() {
        let low = candidate(Fixture {
            name: "low",
            match_score: 10,
            ..Fixture::default()
        });
        let high = candidate(Fixture {
            name: "high",
            match_score: 95,
            ..Fixture::default()
        });
        let mid = candidate(Fixture {
            name: "mid",
            match_score: 50,
            ..Fixture::default()
        });

        let result =
            FilterService::filter(vec![low, high, mid], &FilterCriteria::default(), 1, 20);
        let names: Vec<&str> = result
            .candidates
            .iter()
            .map(|c| c.response.name.as_str())
            .collect();
        assert_eq!(names, vec!["high", "mid", "low"]);
    }

    #[test]
    fn pagination_is_disjoint_and_exhaustive() {
        let all: Vec<EnhancedCandidate> = (0..25)
            .map(|i| {
                candidate(Fixture {
                    match_score: i,
                    ..Fixture::default()
                })
            })
            .collect();

        let page1 = FilterService::filter(all.clone(), &FilterCriteria::default(), 1, 20);
        let page2 = FilterService::filter(all, &FilterCriteria::default(), 2, 20);

        assert_eq!(page1.total_count, 25);
        assert_eq!(page1.candidates.len(), 20);
        assert_eq!(page2.candidates.len(), 5);

        let mut seen: Vec<Uuid> = page1
            .candidates
            .iter()
            .chain(page2.candidates.iter())
            .map(|c| c.response.id)
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 25);

        // Descending match score across the page boundary.
        assert!(
            page1.candidates.last().unwrap().match_score()
                >= page2.candidates.first().unwrap().match_score()
        );
    }

    #[test]
    fn oversized_page_windows_do_not_overflow() {
        let c = candidate(Fixture::default());
        let result = FilterService::filter(vec![c], &FilterCriteria::default(), 3, u32::MAX);
        assert_eq!(result.total_count, 1);
        assert!(result.candidates.is_empty());

        let c = candidate(Fixture::default());
        let result =
            FilterService::filter(vec![c], &FilterCriteria::default(), u32::MAX, u32::MAX);
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn top_performers_capped_and_sorted() {
        let all: Vec<EnhancedCandidate> = (0..8)
            .map(|i| {
                candidate(Fixture {
                    score: 80 + i,
                    ..Fixture::default()
                })
            })
            .collect();

        let result = FilterService::filter(all, &FilterCriteria::default(), 1, 20);
        let top = &result.insights.top_performers;
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].score, 87);
        assert!(top.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn needs_review_triggers_on_any_signal() {
        let low_score = candidate(Fixture {
            name: "low_score",
            score: 30,
            ..Fixture::default()
        });
        let tab_switcher = candidate(Fixture {
            name: "tab_switcher",
            score: 90,
            tab_switches: 15,
            ..Fixture::default()
        });
        let risky = candidate(Fixture {
            name: "risky",
            score: 90,
            risk_factors: 3,
            ..Fixture::default()
        });
        let clean = candidate(Fixture {
            name: "clean",
            score: 90,
            ..Fixture::default()
        });

        let result = FilterService::filter(
            vec![low_score, tab_switcher, risky, clean],
            &FilterCriteria::default(),
            1,
            20,
        );
        let names: Vec<&str> = result
            .insights
            .needs_review
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert!(names.contains(&"low_score"));
        assert!(names.contains(&"tab_switcher"));
        assert!(names.contains(&"risky"));
        assert!(!names.contains(&"clean"));
    }

    #[test]
    fn buckets_are_not_mutually_exclusive() {
        // High score but excessive tab switching: both a top performer and
        // flagged for review.
        let both = candidate(Fixture {
            name: "both",
            score: 95,
            tab_switches: 20,
            ..Fixture::default()
        });

        let result = FilterService::filter(vec![both], &FilterCriteria::default(), 1, 20);
        assert_eq!(result.insights.top_performers.len(), 1);
        assert_eq!(result.insights.needs_review.len(), 1);
    }

    #[test]
    fn insight_histograms_cover_filtered_set() {
        let a = candidate(Fixture {
            score: 80,
            skills: &["Rust", "SQL"],
            status: CandidateStatus::InReview,
            ..Fixture::default()
        });
        let b = candidate(Fixture {
            score: 40,
            skills: &["rust"],
            status: CandidateStatus::Pending,
            ..Fixture::default()
        });

        let result = FilterService::filter(vec![a, b], &FilterCriteria::default(), 1, 20);
        assert_eq!(result.insights.average_score, 60.0);
        assert_eq!(result.insights.skill_distribution.get("rust"), Some(&2));
        assert_eq!(result.insights.skill_distribution.get("sql"), Some(&1));
        assert_eq!(result.insights.status_distribution.get("in_review"), Some(&1));
        assert_eq!(result.insights.status_distribution.get("pending"), Some(&1));
    }
}
