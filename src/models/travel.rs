//! Transport modes and travel-time estimates

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DayTripError;

/// Modes a routing provider can estimate
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Car,
    Public,
}

impl TransportMode {
    pub const ALL: [TransportMode; 2] = [TransportMode::Car, TransportMode::Public];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Car => "car",
            TransportMode::Public => "public",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the traveller says they will move; drives the coarse search radius
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Car,
    Public,
    Bus,
    Train,
    Bicycle,
    Walking,
}

impl TravelMode {
    /// Average door-to-door speed in km/h
    #[must_use]
    pub fn speed_kmh(&self) -> f64 {
        match self {
            TravelMode::Car => 60.0,
            TravelMode::Public => 22.0,
            TravelMode::Bus => 40.0,
            TravelMode::Train => 80.0,
            TravelMode::Bicycle => 15.0,
            TravelMode::Walking => 5.0,
        }
    }

    /// Routing modes worth asking about for this travel mode.
    ///
    /// Modes without a routing provider fall back to both.
    #[must_use]
    pub fn routing_modes(mode: Option<TravelMode>) -> Vec<TransportMode> {
        match mode {
            Some(TravelMode::Car) => vec![TransportMode::Car],
            Some(TravelMode::Public | TravelMode::Bus | TravelMode::Train) => {
                vec![TransportMode::Public]
            }
            Some(TravelMode::Bicycle | TravelMode::Walking) | None => TransportMode::ALL.to_vec(),
        }
    }
}

impl FromStr for TravelMode {
    type Err = DayTripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "car" | "drive" | "driving" => Ok(TravelMode::Car),
            "public" | "transit" => Ok(TravelMode::Public),
            "bus" => Ok(TravelMode::Bus),
            "train" | "subway" => Ok(TravelMode::Train),
            "bicycle" | "bike" => Ok(TravelMode::Bicycle),
            "walking" | "walk" => Ok(TravelMode::Walking),
            other => Err(DayTripError::validation(format!(
                "Unknown transport mode '{other}'"
            ))),
        }
    }
}

/// Round-trip estimate for one mode; `None` means no route could be computed
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct TravelTimeEstimate {
    pub mode: TransportMode,
    pub round_trip_hours: Option<f64>,
}

impl TravelTimeEstimate {
    /// Build an estimate from a one-way duration in seconds
    #[must_use]
    pub fn from_one_way_seconds(mode: TransportMode, seconds: Option<u64>) -> Self {
        Self {
            mode,
            round_trip_hours: seconds.map(|s| s as f64 * 2.0 / 3600.0),
        }
    }
}

/// Estimates keyed by mode
pub type TravelTimes = BTreeMap<TransportMode, TravelTimeEstimate>;

/// Shortest present round trip across all modes
#[must_use]
pub fn shortest_round_trip(times: &TravelTimes) -> Option<f64> {
    times
        .values()
        .filter_map(|estimate| estimate.round_trip_hours)
        .filter(|hours| hours.is_finite())
        .reduce(f64::min)
}
