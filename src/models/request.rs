//! What the traveller asked for

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{GeoPoint, PlaceCategory, SearchCriterion, TravelMode};
use crate::{DayTripError, Result};

/// Largest number of recommendations one request may ask for
pub const MAX_TOP_K: usize = 20;

/// Soft and hard preferences forwarded to the reasoning collaborator
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Preferences {
    pub likes: Vec<String>,
    pub dislikes: Vec<String>,
    pub must_include: Vec<String>,
    pub must_avoid: Vec<String>,
}

impl Preferences {
    /// Whether there is anything to filter away
    #[must_use]
    pub fn has_aversions(&self) -> bool {
        !self.dislikes.is_empty() || !self.must_avoid.is_empty()
    }
}

/// One recommendation request
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TripRequest {
    /// Address, landmark or "lat,lon"
    pub origin: String,
    /// Local departure time; its date is the weather target date
    pub departure: NaiveDateTime,
    /// Total time budget for the day, travel included
    pub max_travel_hours: f64,
    #[serde(default)]
    pub transportation: Option<TravelMode>,
    #[serde(default)]
    pub categories: Vec<PlaceCategory>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub preferences: Preferences,
    /// Overrides the configured number of recommendations
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl TripRequest {
    /// Validate the request before any provider is called
    pub fn validate(&self) -> Result<()> {
        if self.origin.trim().is_empty() {
            return Err(DayTripError::validation("Origin cannot be empty"));
        }
        if !self.max_travel_hours.is_finite() || self.max_travel_hours <= 0.0 {
            return Err(DayTripError::validation(format!(
                "Travel budget must be a positive number of hours, got: {}",
                self.max_travel_hours
            )));
        }
        if let Some(k) = self.top_k {
            if k == 0 || k > MAX_TOP_K {
                return Err(DayTripError::validation(format!(
                    "Number of recommendations must be between 1 and {MAX_TOP_K}, got: {k}"
                )));
            }
        }
        Ok(())
    }

    /// Search criteria in the order they are queried.
    ///
    /// A keyword wins over categories; with neither, tourist spots are searched.
    #[must_use]
    pub fn criteria(&self) -> Vec<SearchCriterion> {
        if let Some(keyword) = self.keyword.as_deref().map(str::trim) {
            if !keyword.is_empty() {
                return vec![SearchCriterion::Keyword(keyword.to_string())];
            }
        }

        if self.categories.is_empty() {
            return vec![SearchCriterion::Category(PlaceCategory::TouristSpot)];
        }

        let mut criteria = Vec::new();
        for category in &self.categories {
            let criterion = SearchCriterion::Category(*category);
            if !criteria.contains(&criterion) {
                criteria.push(criterion);
            }
        }
        criteria
    }
}

/// Types of origin input
#[derive(Debug, Clone, PartialEq)]
pub enum OriginInput {
    /// Coordinates that need no geocoding
    Coordinates(GeoPoint),
    /// Address or landmark to geocode
    Query(String),
}

impl OriginInput {
    /// Parse origin input; coordinates like "37.48,127.02" or "37.48 127.02"
    /// outside valid ranges are treated as a query
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match Self::parse_coordinates(input) {
            Some(point) => OriginInput::Coordinates(point),
            None => OriginInput::Query(input.to_string()),
        }
    }

    fn parse_coordinates(input: &str) -> Option<GeoPoint> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return None;
        }

        let lat = parts[0].parse::<f64>().ok()?;
        let lon = parts[1].parse::<f64>().ok()?;
        let point = GeoPoint::new(lat, lon);
        point.is_valid().then_some(point)
    }
}
