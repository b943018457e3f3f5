//! `DayTrip` - day-trip destination discovery and enrichment
//!
//! Turns a travel-time budget and an origin into a search geometry, fans out
//! place searches over it, filters the results against user aversions, keeps only
//! destinations reachable and back within the budget, scores the day's weather,
//! and ranks what is left.

pub mod api;
pub mod cache;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod geo;
pub mod http;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod providers;
pub mod reasoning;
pub mod search;
pub mod setup;
pub mod web;

// Re-export core types for public API
pub use config::DayTripConfig;
pub use error::DayTripError;
pub use geo::{SearchGeometry, estimate_radius, tile_area};
pub use models::{EnrichedCandidate, GeoPoint, PlaceCandidate, SessionState, TripRequest};
pub use pipeline::{CandidatePipeline, PipelineStage, Recommendation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, DayTripError>;
