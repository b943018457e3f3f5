//! Place search over one sub-region and across a tiled search area

pub mod fan_out;
pub mod gateway;

pub use fan_out::{FanOutSearcher, dedup_by_id};
pub use gateway::{PageLimits, PlaceSearchGateway};
