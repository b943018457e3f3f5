//! Point-of-interest models produced by place search

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::GeoPoint;
use crate::DayTripError;

/// A destination candidate as returned by the place-search provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PlaceCandidate {
    /// Provider-assigned identifier, stable across pages and sub-regions
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: GeoPoint,
}

/// Category groups understood by the place-search provider
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    TouristSpot,
    CultureFacility,
}

impl PlaceCategory {
    /// Provider category group code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            PlaceCategory::TouristSpot => "AT4",
            PlaceCategory::CultureFacility => "CT1",
        }
    }
}

impl FromStr for PlaceCategory {
    type Err = DayTripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "tourist_spot" | "at4" => Ok(PlaceCategory::TouristSpot),
            "culture_facility" | "ct1" => Ok(PlaceCategory::CultureFacility),
            other => Err(DayTripError::validation(format!(
                "Unknown place category '{other}'. Use tourist-spot or culture-facility"
            ))),
        }
    }
}

/// What a single place search looks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriterion {
    /// Free-text keyword such as "museum" or "lake"
    Keyword(String),
    /// Fixed category group
    Category(PlaceCategory),
}

impl fmt::Display for SearchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCriterion::Keyword(keyword) => write!(f, "keyword '{keyword}'"),
            SearchCriterion::Category(category) => write!(f, "category {}", category.code()),
        }
    }
}
