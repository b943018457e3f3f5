//! Reasoning collaborator contract for preference filtering and ranking
//!
//! The collaborator is a non-deterministic black box. Its answers are checked
//! against the candidates actually sent: unknown names are dropped, counts are
//! capped, and an error or an empty answer means "no opinion", in which case the
//! input passes through unchanged.

pub mod openai;

use std::collections::HashSet;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::Result;
use crate::models::{EnrichedCandidate, PlaceCandidate, Preferences};

pub use openai::OpenAiReasoner;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterPreferences {
    pub dislikes: Vec<String>,
    pub must_avoid: Vec<String>,
}

/// Ask which of `candidates` survive the user's aversions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterRequest {
    pub preferences: FilterPreferences,
    pub candidates: Vec<String>,
    /// Try not to go below this many places
    pub k_min: usize,
    /// Never return more than this many places
    pub k_max: usize,
}

impl FilterRequest {
    #[must_use]
    pub fn new(preferences: &Preferences, candidates: &[PlaceCandidate], k_min: usize, k_max: usize) -> Self {
        Self {
            preferences: FilterPreferences {
                dislikes: preferences.dislikes.clone(),
                must_avoid: preferences.must_avoid.clone(),
            },
            candidates: candidates.iter().map(|c| c.name.clone()).collect(),
            k_min,
            k_max,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterResponse {
    #[serde(default)]
    pub places: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankPreferences {
    pub must_include: Vec<String>,
    pub likes: Vec<String>,
}

/// What the ranker sees of one candidate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankCandidate {
    pub name: String,
    pub round_trip_hours: Option<f64>,
    pub outdoor_score: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankRequest {
    pub preferences: RankPreferences,
    pub candidates: Vec<RankCandidate>,
    pub top_k: usize,
}

impl RankRequest {
    #[must_use]
    pub fn new(preferences: &Preferences, candidates: &[EnrichedCandidate], top_k: usize) -> Self {
        Self {
            preferences: RankPreferences {
                must_include: preferences.must_include.clone(),
                likes: preferences.likes.clone(),
            },
            candidates: candidates
                .iter()
                .map(|c| RankCandidate {
                    name: c.place.name.clone(),
                    round_trip_hours: c.shortest_round_trip_hours(),
                    outdoor_score: c.outdoor_score.map(|s| s.value()),
                })
                .collect(),
            top_k,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedPlace {
    #[serde(alias = "place")]
    pub place_name: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RankResponse {
    #[serde(default)]
    pub candidates: Vec<RankedPlace>,
}

/// External natural-language service for filtering and ranking
#[async_trait]
pub trait ReasoningCollaborator: Send + Sync {
    async fn filter(&self, request: &FilterRequest) -> Result<FilterResponse>;

    async fn rank(&self, request: &RankRequest) -> Result<RankResponse>;
}

/// Collaborator that never has an opinion; used when no service is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughReasoner;

#[async_trait]
impl ReasoningCollaborator for PassThroughReasoner {
    async fn filter(&self, _request: &FilterRequest) -> Result<FilterResponse> {
        Ok(FilterResponse::default())
    }

    async fn rank(&self, _request: &RankRequest) -> Result<RankResponse> {
        Ok(RankResponse::default())
    }
}

/// Apply a filter answer to the candidates that were sent.
///
/// Every candidate whose name the collaborator kept survives, in input order.
/// Failures, empty answers and answers naming no known candidate fall back to the
/// input. The result never exceeds `k_max`.
#[must_use]
pub fn apply_filter(
    candidates: Vec<PlaceCandidate>,
    outcome: Result<FilterResponse>,
    k_max: usize,
) -> Vec<PlaceCandidate> {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            warn!("Preference filter unavailable, keeping all candidates: {}", e);
            return cap(candidates, k_max);
        }
    };

    if response.places.is_empty() {
        info!("Preference filter had no opinion, keeping all candidates");
        return cap(candidates, k_max);
    }

    let known: HashSet<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
    let kept: HashSet<String> = response
        .places
        .into_iter()
        .filter(|name| {
            let is_known = known.contains(name.as_str());
            if !is_known {
                debug!("Filter returned unknown place '{}', ignoring it", name);
            }
            is_known
        })
        .collect();

    if kept.is_empty() {
        warn!("Preference filter named no known candidate, keeping all candidates");
        return cap(candidates, k_max);
    }

    let filtered: Vec<PlaceCandidate> = candidates
        .into_iter()
        .filter(|c| kept.contains(&c.name))
        .collect();
    cap(filtered, k_max)
}

/// Apply a ranking answer to the enriched candidates that were sent.
///
/// Output follows the collaborator's order with reasons attached. Unknown and
/// repeated names are dropped; nothing is invented. Failures and answers with no
/// usable entry fall back to the input order. The result never exceeds `top_k`.
#[must_use]
pub fn apply_ranking(
    candidates: Vec<EnrichedCandidate>,
    outcome: Result<RankResponse>,
    top_k: usize,
) -> Vec<EnrichedCandidate> {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => {
            warn!("Ranker unavailable, keeping search order: {}", e);
            return cap(candidates, top_k);
        }
    };

    let mut pool: Vec<Option<EnrichedCandidate>> = candidates.into_iter().map(Some).collect();
    let mut seen = HashSet::new();
    let mut ranked = Vec::new();

    for entry in response.candidates {
        if ranked.len() == top_k {
            break;
        }
        if !seen.insert(entry.place_name.clone()) {
            debug!("Ranker repeated '{}', ignoring it", entry.place_name);
            continue;
        }
        let slot = pool
            .iter_mut()
            .find(|slot| matches!(slot, Some(c) if c.place.name == entry.place_name));
        match slot.and_then(Option::take) {
            Some(mut candidate) => {
                let reason = entry.reason.trim();
                if !reason.is_empty() {
                    candidate.rank_reason = Some(reason.to_string());
                }
                ranked.push(candidate);
            }
            None => debug!("Ranker returned unknown place '{}', ignoring it", entry.place_name),
        }
    }

    if ranked.is_empty() {
        info!("Ranker had no usable opinion, keeping search order");
        return cap(pool.into_iter().flatten().collect(), top_k);
    }
    ranked
}

fn cap<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    items.truncate(limit);
    items
}
