//! Data models for the `DayTrip` pipeline

pub mod candidate;
pub mod location;
pub mod place;
pub mod request;
pub mod session;
pub mod travel;
pub mod weather;

pub use candidate::EnrichedCandidate;
pub use location::GeoPoint;
pub use place::{PlaceCandidate, PlaceCategory, SearchCriterion};
pub use request::{MAX_TOP_K, OriginInput, Preferences, TripRequest};
pub use session::SessionState;
pub use travel::{
    TransportMode, TravelMode, TravelTimeEstimate, TravelTimes, shortest_round_trip,
};
pub use weather::{ConditionBracket, OutdoorScore, WeatherDaySummary, weather_code_to_description};
