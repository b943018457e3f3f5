//! Candidates after feasibility checks, weather scoring and ranking

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{OutdoorScore, PlaceCandidate, TravelTimes, WeatherDaySummary, shortest_round_trip};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EnrichedCandidate {
    pub place: PlaceCandidate,
    pub travel_times: TravelTimes,
    /// `None` when the weather provider had nothing for the target date
    pub weather: Option<WeatherDaySummary>,
    pub outdoor_score: Option<OutdoorScore>,
    /// Filled in by the ranking collaborator only
    pub rank_reason: Option<String>,
}

impl EnrichedCandidate {
    #[must_use]
    pub fn shortest_round_trip_hours(&self) -> Option<f64> {
        shortest_round_trip(&self.travel_times)
    }
}

impl fmt::Display for EnrichedCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "📍 {}", self.place.name)?;
        if !self.place.address.is_empty() {
            writeln!(f, "   🗺️ {}", self.place.address)?;
        }

        for estimate in self.travel_times.values() {
            if let Some(hours) = estimate.round_trip_hours {
                writeln!(f, "   ⏱️ {} round trip: about {hours:.1}h", estimate.mode)?;
            }
        }

        match (&self.weather, &self.outdoor_score) {
            (Some(weather), Some(score)) => writeln!(
                f,
                "   🌤️ {} ({:.0}°C / {:.0}°C, {:.1} mm), outdoor score {score}: {}",
                weather.description(),
                weather.high_c,
                weather.low_c,
                weather.precipitation_mm,
                score.label()
            )?,
            _ => writeln!(f, "   🌤️ No weather data for the day")?,
        }

        if let Some(reason) = &self.rank_reason {
            writeln!(f, "   ✨ {reason}")?;
        }
        Ok(())
    }
}
