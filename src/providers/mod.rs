//! External data providers behind narrow async traits
//!
//! Every method returns `None` when the provider could not deliver; the error
//! itself has already been logged by the implementation.

pub mod cached;
pub mod kakao;
pub mod odsay;
pub mod open_meteo;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use crate::models::{GeoPoint, PlaceCandidate, SearchCriterion, TransportMode, WeatherDaySummary};

pub use cached::{CachedGeocoder, CachedTravelTime};
pub use kakao::{KakaoLocalClient, KakaoMobilityClient};
pub use odsay::OdsayClient;
pub use open_meteo::OpenMeteoClient;

/// Resolves free text (address or landmark) to a coordinate
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, query: &str) -> Option<GeoPoint>;
}

/// One page request against a single sub-region
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    pub center: GeoPoint,
    pub radius_m: u32,
    pub criterion: SearchCriterion,
    /// 1-based
    pub page: u32,
    pub page_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacePage {
    pub items: Vec<PlaceCandidate>,
    pub is_last_page: bool,
}

#[async_trait]
pub trait PlaceSearchProvider: Send + Sync {
    /// Largest radius a single query accepts, in meters
    fn max_radius_m(&self) -> u32;

    async fn search_page(&self, query: &PageQuery) -> Option<PlacePage>;
}

/// Door-to-door duration for one transport mode
#[async_trait]
pub trait TravelTimeProvider: Send + Sync {
    fn mode(&self) -> TransportMode;

    /// One-way duration in seconds
    async fn estimate(
        &self,
        departure: NaiveDateTime,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Option<u64>;
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Daily aggregate for `date` at `location`
    async fn summarize(&self, location: GeoPoint, date: NaiveDate) -> Option<WeatherDaySummary>;
}
