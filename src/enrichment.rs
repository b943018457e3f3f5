//! Round-trip feasibility, weather and outdoor scoring for each candidate

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, instrument};

use crate::models::{
    EnrichedCandidate, GeoPoint, OutdoorScore, PlaceCandidate, TransportMode, TravelTimeEstimate,
    TravelTimes, shortest_round_trip,
};
use crate::providers::{TravelTimeProvider, WeatherProvider};

/// Share of the day budget a round trip may take up
pub const FEASIBLE_SHARE: f64 = 0.5;

/// The only feasibility rule: the fastest known round trip fits in half the budget
#[must_use]
pub fn is_feasible(times: &TravelTimes, budget_hours: f64) -> bool {
    shortest_round_trip(times).is_some_and(|hours| hours <= budget_hours * FEASIBLE_SHARE)
}

/// Trip context shared by every candidate of one run
#[derive(Debug, Clone, Copy)]
pub struct TripContext<'a> {
    pub origin: GeoPoint,
    pub departure: NaiveDateTime,
    pub budget_hours: f64,
    pub modes: &'a [TransportMode],
}

pub struct FeasibilityEnricher {
    routers: Vec<Arc<dyn TravelTimeProvider>>,
    weather: Arc<dyn WeatherProvider>,
}

impl FeasibilityEnricher {
    pub fn new(routers: Vec<Arc<dyn TravelTimeProvider>>, weather: Arc<dyn WeatherProvider>) -> Self {
        Self { routers, weather }
    }

    /// Estimate every requested mode; modes without a router stay absent
    pub async fn travel_times(
        &self,
        trip: &TripContext<'_>,
        destination: GeoPoint,
    ) -> TravelTimes {
        let mut times = TravelTimes::new();
        for mode in trip.modes {
            let seconds = match self.routers.iter().find(|router| router.mode() == *mode) {
                Some(router) => router.estimate(trip.departure, trip.origin, destination).await,
                None => None,
            };
            times.insert(*mode, TravelTimeEstimate::from_one_way_seconds(*mode, seconds));
        }
        times
    }

    /// Enrich one candidate, or `None` when it cannot be reached and back in time
    pub async fn enrich(
        &self,
        trip: &TripContext<'_>,
        place: PlaceCandidate,
    ) -> Option<EnrichedCandidate> {
        let travel_times = self.travel_times(trip, place.location).await;

        if !is_feasible(&travel_times, trip.budget_hours) {
            debug!(
                "Dropping {}: shortest round trip {:?}h exceeds half of {}h",
                place.name,
                shortest_round_trip(&travel_times),
                trip.budget_hours
            );
            return None;
        }

        let weather = self
            .weather
            .summarize(place.location, trip.departure.date())
            .await;
        if weather.is_none() {
            debug!("No weather for {}, keeping it unscored", place.name);
        }

        Some(EnrichedCandidate {
            outdoor_score: weather.as_ref().map(OutdoorScore::from_summary),
            weather,
            travel_times,
            place,
            rank_reason: None,
        })
    }

    /// Enrich candidates one after another, keeping input order
    #[instrument(skip_all, fields(candidates = places.len()))]
    pub async fn enrich_all(
        &self,
        trip: &TripContext<'_>,
        places: Vec<PlaceCandidate>,
    ) -> Vec<EnrichedCandidate> {
        let total = places.len();
        let mut enriched = Vec::with_capacity(total);
        for place in places {
            if let Some(candidate) = self.enrich(trip, place).await {
                enriched.push(candidate);
            }
        }
        info!("{} of {} candidates are feasible", enriched.len(), total);
        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeatherDaySummary;
    use async_trait::async_trait;
    use chrono::NaiveDate;

    struct FixedRouter {
        mode: TransportMode,
        seconds: Option<u64>,
    }

    #[async_trait]
    impl TravelTimeProvider for FixedRouter {
        fn mode(&self) -> TransportMode {
            self.mode
        }

        async fn estimate(&self, _: NaiveDateTime, _: GeoPoint, _: GeoPoint) -> Option<u64> {
            self.seconds
        }
    }

    struct FixedWeather(Option<WeatherDaySummary>);

    #[async_trait]
    impl WeatherProvider for FixedWeather {
        async fn summarize(&self, _: GeoPoint, _: NaiveDate) -> Option<WeatherDaySummary> {
            self.0
        }
    }

    fn hours(h: f64) -> Option<u64> {
        // one-way seconds for a round trip of `h` hours
        Some((h * 3600.0 / 2.0) as u64)
    }

    fn enricher(car: Option<u64>, public: Option<u64>, weather: Option<WeatherDaySummary>) -> FeasibilityEnricher {
        FeasibilityEnricher::new(
            vec![
                Arc::new(FixedRouter {
                    mode: TransportMode::Car,
                    seconds: car,
                }),
                Arc::new(FixedRouter {
                    mode: TransportMode::Public,
                    seconds: public,
                }),
            ],
            Arc::new(FixedWeather(weather)),
        )
    }

    fn place() -> PlaceCandidate {
        PlaceCandidate {
            id: "42".to_string(),
            name: "Namhansanseong".to_string(),
            address: "Gwangju-si".to_string(),
            location: GeoPoint::new(37.478, 127.184),
        }
    }

    fn departure() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn trip(budget_hours: f64, modes: &[TransportMode]) -> TripContext<'_> {
        TripContext {
            origin: GeoPoint::new(37.48, 127.02),
            departure: departure(),
            budget_hours,
            modes,
        }
    }

    const SUNNY: WeatherDaySummary = WeatherDaySummary {
        condition_code: 0,
        high_c: 21.0,
        low_c: 10.0,
        precipitation_mm: 0.0,
    };

    #[tokio::test]
    async fn test_public_three_hours_fits_eight_hour_budget() {
        let modes = [TransportMode::Public];
        let candidate = enricher(None, hours(3.0), Some(SUNNY))
            .enrich(&trip(8.0, &modes), place())
            .await;
        let candidate = candidate.unwrap();
        assert_eq!(candidate.shortest_round_trip_hours(), Some(3.0));
        assert_eq!(candidate.outdoor_score.map(|s| s.value()), Some(100));
    }

    #[tokio::test]
    async fn test_public_three_hours_exceeds_four_hour_budget() {
        let modes = [TransportMode::Public];
        let candidate = enricher(None, hours(3.0), Some(SUNNY))
            .enrich(&trip(4.0, &modes), place())
            .await;
        assert!(candidate.is_none());
    }

    #[tokio::test]
    async fn test_exactly_half_the_budget_is_kept() {
        let modes = [TransportMode::Car];
        let candidate = enricher(hours(2.0), None, Some(SUNNY))
            .enrich(&trip(4.0, &modes), place())
            .await;
        assert!(candidate.is_some());
    }

    #[tokio::test]
    async fn test_missing_mode_does_not_block_the_other() {
        let modes = TransportMode::ALL;
        let candidate = enricher(None, hours(2.5), Some(SUNNY))
            .enrich(&trip(6.0, &modes), place())
            .await
            .unwrap();
        assert_eq!(candidate.travel_times[&TransportMode::Car].round_trip_hours, None);
        assert_eq!(candidate.shortest_round_trip_hours(), Some(2.5));
    }

    #[tokio::test]
    async fn test_no_route_at_all_is_infeasible() {
        let modes = TransportMode::ALL;
        let candidate = enricher(None, None, Some(SUNNY))
            .enrich(&trip(12.0, &modes), place())
            .await;
        assert!(candidate.is_none());
    }

    #[tokio::test]
    async fn test_weather_outage_keeps_candidate_unscored() {
        let modes = [TransportMode::Car];
        let candidate = enricher(hours(1.0), None, None)
            .enrich(&trip(6.0, &modes), place())
            .await
            .unwrap();
        assert!(candidate.weather.is_none());
        assert!(candidate.outdoor_score.is_none());
    }

    #[tokio::test]
    async fn test_only_requested_modes_are_estimated() {
        let modes = [TransportMode::Car];
        let times = enricher(hours(1.0), hours(2.0), None)
            .travel_times(&trip(6.0, &modes), place().location)
            .await;
        assert_eq!(times.len(), 1);
        assert!(times.contains_key(&TransportMode::Car));
    }

    #[tokio::test]
    async fn test_enrich_all_preserves_order() {
        let modes = [TransportMode::Car];
        let mut second = place();
        second.id = "43".to_string();
        let enriched = enricher(hours(1.0), None, Some(SUNNY))
            .enrich_all(&trip(6.0, &modes), vec![place(), second])
            .await;
        assert_eq!(
            enriched.iter().map(|c| c.place.id.as_str()).collect::<Vec<_>>(),
            vec!["42", "43"]
        );
    }
}
