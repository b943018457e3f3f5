//! Stub providers shared by the integration tests
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use daytrip::enrichment::FeasibilityEnricher;
use daytrip::models::{
    GeoPoint, PlaceCandidate, Preferences, TransportMode, TravelMode, TripRequest,
    WeatherDaySummary,
};
use daytrip::pipeline::{CandidatePipeline, PipelineSettings};
use daytrip::providers::{
    Geocoder, PageQuery, PlacePage, PlaceSearchProvider, TravelTimeProvider, WeatherProvider,
};
use daytrip::reasoning::{
    FilterRequest, FilterResponse, RankRequest, RankResponse, RankedPlace, ReasoningCollaborator,
};
use daytrip::search::fan_out::DEFAULT_MAX_WORKERS;
use daytrip::search::{FanOutSearcher, PageLimits, PlaceSearchGateway};
use daytrip::DayTripError;

pub const SEOUL: GeoPoint = GeoPoint::new(37.4979, 127.0276);

pub fn place(id: &str, name: &str, latitude: f64, longitude: f64) -> PlaceCandidate {
    PlaceCandidate {
        id: id.to_string(),
        name: name.to_string(),
        address: format!("{name} address"),
        location: GeoPoint::new(latitude, longitude),
    }
}

pub fn departure() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 18)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

pub fn request(origin: &str, hours: f64) -> TripRequest {
    TripRequest {
        origin: origin.to_string(),
        departure: departure(),
        max_travel_hours: hours,
        transportation: Some(TravelMode::Car),
        categories: vec![],
        keyword: None,
        preferences: Preferences::default(),
        top_k: None,
    }
}

/// Knows a fixed set of addresses and counts lookups
#[derive(Default)]
pub struct StubGeocoder {
    pub known: HashMap<String, GeoPoint>,
    pub calls: AtomicUsize,
}

impl StubGeocoder {
    pub fn with(query: &str, point: GeoPoint) -> Self {
        let mut known = HashMap::new();
        known.insert(query.to_string(), point);
        Self {
            known,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for StubGeocoder {
    async fn resolve(&self, query: &str) -> Option<GeoPoint> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.known.get(query).copied()
    }
}

/// Returns the same single page for every center, or fails everywhere
pub struct StubPlaces {
    pub places: Option<Vec<PlaceCandidate>>,
    pub queries: AtomicUsize,
}

impl StubPlaces {
    pub fn serving(places: Vec<PlaceCandidate>) -> Self {
        Self {
            places: Some(places),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn down() -> Self {
        Self {
            places: None,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlaceSearchProvider for StubPlaces {
    fn max_radius_m(&self) -> u32 {
        20_000
    }

    async fn search_page(&self, _query: &PageQuery) -> Option<PlacePage> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.places.as_ref().map(|items| PlacePage {
            items: items.clone(),
            is_last_page: true,
        })
    }
}

/// One-way seconds per destination id; unknown destinations have no route
pub struct StubRouter {
    pub mode: TransportMode,
    pub seconds_by_place: HashMap<String, u64>,
    pub places: Vec<PlaceCandidate>,
}

impl StubRouter {
    pub fn car(places: &[PlaceCandidate], seconds: &[(&str, u64)]) -> Self {
        Self {
            mode: TransportMode::Car,
            seconds_by_place: seconds
                .iter()
                .map(|(id, secs)| ((*id).to_string(), *secs))
                .collect(),
            places: places.to_vec(),
        }
    }
}

#[async_trait]
impl TravelTimeProvider for StubRouter {
    fn mode(&self) -> TransportMode {
        self.mode
    }

    async fn estimate(
        &self,
        _departure: NaiveDateTime,
        _origin: GeoPoint,
        destination: GeoPoint,
    ) -> Option<u64> {
        let place = self.places.iter().find(|p| p.location == destination)?;
        self.seconds_by_place.get(&place.id).copied()
    }
}

pub struct StubWeather(pub Option<WeatherDaySummary>);

impl StubWeather {
    pub fn sunny() -> Self {
        Self(Some(WeatherDaySummary {
            condition_code: 0,
            high_c: 22.0,
            low_c: 12.0,
            precipitation_mm: 0.0,
        }))
    }
}

#[async_trait]
impl WeatherProvider for StubWeather {
    async fn summarize(&self, _location: GeoPoint, _date: NaiveDate) -> Option<WeatherDaySummary> {
        self.0
    }
}

/// Answers with scripted responses; `None` means the call fails
#[derive(Default)]
pub struct ScriptedReasoner {
    pub filter_answer: Option<Vec<String>>,
    pub rank_answer: Option<Vec<(String, String)>>,
    pub filter_requests: Mutex<Vec<FilterRequest>>,
    pub rank_requests: Mutex<Vec<RankRequest>>,
}

impl ScriptedReasoner {
    pub fn filter_calls(&self) -> usize {
        self.filter_requests.lock().unwrap().len()
    }

    pub fn rank_calls(&self) -> usize {
        self.rank_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningCollaborator for ScriptedReasoner {
    async fn filter(&self, request: &FilterRequest) -> daytrip::Result<FilterResponse> {
        self.filter_requests.lock().unwrap().push(request.clone());
        match &self.filter_answer {
            Some(places) => Ok(FilterResponse {
                places: places.clone(),
            }),
            None => Err(DayTripError::provider("reasoning", "scripted outage")),
        }
    }

    async fn rank(&self, request: &RankRequest) -> daytrip::Result<RankResponse> {
        self.rank_requests.lock().unwrap().push(request.clone());
        match &self.rank_answer {
            Some(entries) => Ok(RankResponse {
                candidates: entries
                    .iter()
                    .map(|(name, reason)| RankedPlace {
                        place_name: name.clone(),
                        reason: reason.clone(),
                    })
                    .collect(),
            }),
            None => Err(DayTripError::provider("reasoning", "scripted outage")),
        }
    }
}

/// Assemble a pipeline from stubs
pub fn pipeline(
    geocoder: Arc<StubGeocoder>,
    places: Arc<StubPlaces>,
    router: StubRouter,
    weather: StubWeather,
    reasoner: Arc<ScriptedReasoner>,
) -> CandidatePipeline {
    let gateway = PlaceSearchGateway::new(places, PageLimits::default());
    let enricher = FeasibilityEnricher::new(vec![Arc::new(router)], Arc::new(weather));
    CandidatePipeline::new(
        geocoder,
        FanOutSearcher::new(gateway, DEFAULT_MAX_WORKERS),
        enricher,
        reasoner,
        PipelineSettings::default(),
    )
}
