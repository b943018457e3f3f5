//! The candidate pipeline: geocode, search, filter, enrich, rank
//!
//! Stages only move forward. An empty intermediate result finishes the run early
//! with an empty recommendation; only an unresolvable origin fails it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use crate::enrichment::{FeasibilityEnricher, TripContext};
use crate::geo::{SearchGeometry, estimate_radius, tile_area};
use crate::models::{
    EnrichedCandidate, GeoPoint, OriginInput, PlaceCandidate, TravelMode, TripRequest,
};
use crate::providers::Geocoder;
use crate::reasoning::{
    FilterRequest, RankRequest, ReasoningCollaborator, apply_filter, apply_ranking,
};
use crate::search::{FanOutSearcher, dedup_by_id};
use crate::{DayTripError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Geocoding,
    Searching,
    PreferenceFiltering,
    FeasibilityEnriching,
    Ranking,
    Done,
    Failed,
}

impl PipelineStage {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Geocoding => "geocoding",
            PipelineStage::Searching => "searching",
            PipelineStage::PreferenceFiltering => "preference filtering",
            PipelineStage::FeasibilityEnriching => "feasibility enriching",
            PipelineStage::Ranking => "ranking",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Records the stages a run passed through and refuses to go back
#[derive(Debug, Clone)]
pub struct StageTracker {
    history: Vec<PipelineStage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self {
            history: vec![PipelineStage::Geocoding],
        }
    }
}

impl StageTracker {
    #[must_use]
    pub fn current(&self) -> PipelineStage {
        self.history
            .last()
            .copied()
            .unwrap_or(PipelineStage::Geocoding)
    }

    #[must_use]
    pub fn history(&self) -> &[PipelineStage] {
        &self.history
    }

    /// Move to `next`; returns `false` (and stays put) for backward moves or
    /// once a terminal stage is reached
    pub fn advance(&mut self, next: PipelineStage) -> bool {
        let current = self.current();
        if current.is_terminal() || next <= current {
            warn!("Ignoring stage transition {} -> {}", current, next);
            return false;
        }
        info!("Pipeline stage: {}", next);
        self.history.push(next);
        true
    }

    pub fn fail(&mut self) {
        self.advance(PipelineStage::Failed);
    }
}

/// Result of one run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub origin: GeoPoint,
    pub geometry: SearchGeometry,
    /// Ranked best first; may be empty
    pub candidates: Vec<EnrichedCandidate>,
    pub stages: Vec<PipelineStage>,
}

/// Numeric limits of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Recommendations returned when the request does not say
    pub top_k: usize,
    /// Preference filtering keeps at most `top_k * filter_multiplier`
    pub filter_multiplier: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            filter_multiplier: 6,
        }
    }
}

pub struct CandidatePipeline {
    geocoder: Arc<dyn Geocoder>,
    searcher: FanOutSearcher,
    enricher: FeasibilityEnricher,
    reasoner: Arc<dyn ReasoningCollaborator>,
    settings: PipelineSettings,
}

impl CandidatePipeline {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        searcher: FanOutSearcher,
        enricher: FeasibilityEnricher,
        reasoner: Arc<dyn ReasoningCollaborator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            geocoder,
            searcher,
            enricher,
            reasoner,
            settings,
        }
    }

    /// Run the whole pipeline for one request
    pub async fn run(&self, request: &TripRequest) -> Result<Recommendation> {
        let mut tracker = StageTracker::default();
        self.run_tracked(request, &mut tracker).await
    }

    /// Run the pipeline, leaving the reached stages in `tracker`
    #[instrument(skip_all, fields(origin = %request.origin, budget = request.max_travel_hours))]
    pub async fn run_tracked(
        &self,
        request: &TripRequest,
        tracker: &mut StageTracker,
    ) -> Result<Recommendation> {
        request.validate()?;

        let origin = match self.resolve_origin(&request.origin).await {
            Ok(origin) => origin,
            Err(e) => {
                if e.is_fatal() {
                    error!("Cannot proceed: {}", e);
                    tracker.fail();
                }
                return Err(e);
            }
        };

        tracker.advance(PipelineStage::Searching);
        let radius_m = estimate_radius(request.max_travel_hours, request.transportation);
        let geometry = tile_area(origin, radius_m, self.searcher.max_radius_m());
        info!(
            "Searching {} center(s) around {} for a {:.1} km radius",
            geometry.centers.len(),
            origin,
            f64::from(radius_m) / 1000.0
        );

        let places = self.search(&geometry, request).await;
        if places.is_empty() {
            return Ok(finish(tracker, origin, geometry, Vec::new()));
        }

        let top_k = request.top_k.unwrap_or(self.settings.top_k).max(1);
        let k_max = top_k.saturating_mul(self.settings.filter_multiplier.max(1));

        tracker.advance(PipelineStage::PreferenceFiltering);
        let places = self.filter(places, request, top_k, k_max).await;
        if places.is_empty() {
            return Ok(finish(tracker, origin, geometry, Vec::new()));
        }

        tracker.advance(PipelineStage::FeasibilityEnriching);
        let modes = TravelMode::routing_modes(request.transportation);
        let trip = TripContext {
            origin,
            departure: request.departure,
            budget_hours: request.max_travel_hours,
            modes: &modes,
        };
        let enriched = self.enricher.enrich_all(&trip, places).await;
        if enriched.is_empty() {
            return Ok(finish(tracker, origin, geometry, Vec::new()));
        }

        tracker.advance(PipelineStage::Ranking);
        let rank_request = RankRequest::new(&request.preferences, &enriched, top_k);
        let outcome = self.reasoner.rank(&rank_request).await;
        let ranked = apply_ranking(enriched, outcome, top_k);
        info!("Ranked {} recommendation(s)", ranked.len());

        Ok(finish(tracker, origin, geometry, ranked))
    }

    async fn resolve_origin(&self, origin: &str) -> Result<GeoPoint> {
        match OriginInput::parse(origin) {
            OriginInput::Coordinates(point) => {
                info!("Origin given as coordinates {}", point);
                Ok(point)
            }
            OriginInput::Query(query) => self
                .geocoder
                .resolve(&query)
                .await
                .ok_or_else(|| DayTripError::geocode_not_found(query)),
        }
    }

    /// Search every criterion in turn and merge with the same dedup as the fan-out
    async fn search(&self, geometry: &SearchGeometry, request: &TripRequest) -> Vec<PlaceCandidate> {
        let mut places = Vec::new();
        for criterion in request.criteria() {
            places.extend(self.searcher.search(geometry, &criterion).await);
        }
        let places = dedup_by_id(places);
        info!("{} candidate(s) after search", places.len());
        places
    }

    async fn filter(
        &self,
        places: Vec<PlaceCandidate>,
        request: &TripRequest,
        top_k: usize,
        k_max: usize,
    ) -> Vec<PlaceCandidate> {
        let filtered = if request.preferences.has_aversions() {
            let filter_request = FilterRequest::new(&request.preferences, &places, top_k, k_max);
            let outcome = self.reasoner.filter(&filter_request).await;
            apply_filter(places, outcome, k_max)
        } else {
            let mut places = places;
            places.truncate(k_max);
            places
        };
        info!("{} candidate(s) after preference filtering", filtered.len());
        filtered
    }
}

fn finish(
    tracker: &mut StageTracker,
    origin: GeoPoint,
    geometry: SearchGeometry,
    candidates: Vec<EnrichedCandidate>,
) -> Recommendation {
    if candidates.is_empty() {
        info!("No destinations found");
    }
    tracker.advance(PipelineStage::Done);
    Recommendation {
        origin,
        geometry,
        candidates,
        stages: tracker.history().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_moves_forward_only() {
        let mut tracker = StageTracker::default();
        assert_eq!(tracker.current(), PipelineStage::Geocoding);
        assert!(tracker.advance(PipelineStage::Searching));
        assert!(!tracker.advance(PipelineStage::Geocoding));
        assert!(tracker.advance(PipelineStage::Done));
        assert!(!tracker.advance(PipelineStage::Ranking));
        assert_eq!(tracker.current(), PipelineStage::Done);
        assert_eq!(
            tracker.history(),
            &[PipelineStage::Geocoding, PipelineStage::Searching, PipelineStage::Done]
        );
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut tracker = StageTracker::default();
        tracker.fail();
        assert_eq!(tracker.current(), PipelineStage::Failed);
        assert!(!tracker.advance(PipelineStage::Done));
    }

    #[test]
    fn test_empty_jump_to_done_skips_stages() {
        let mut tracker = StageTracker::default();
        tracker.advance(PipelineStage::Searching);
        assert!(tracker.advance(PipelineStage::Done));
        assert!(!tracker.history().contains(&PipelineStage::Ranking));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::FeasibilityEnriching.to_string(), "feasibility enriching");
    }
}
