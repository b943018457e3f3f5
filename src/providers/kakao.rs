//! Kakao Local (geocoding, place search) and Kakao Mobility (car routing)

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use super::{Geocoder, PageQuery, PlacePage, PlaceSearchProvider, TravelTimeProvider};
use crate::http::ProviderClient;
use crate::models::{GeoPoint, PlaceCandidate, SearchCriterion, TransportMode};

/// Kakao refuses radii above 20 km
pub const KAKAO_MAX_RADIUS_M: u32 = 20_000;
/// Kakao refuses page sizes above 15
pub const KAKAO_MAX_PAGE_SIZE: u32 = 15;

fn auth_header(api_key: &str) -> String {
    format!("KakaoAK {api_key}")
}

/// Kakao Local search response envelope
#[derive(Debug, Deserialize)]
struct LocalResponse {
    #[serde(default)]
    documents: Vec<serde_json::Value>,
    meta: Option<LocalMeta>,
}

#[derive(Debug, Deserialize)]
struct LocalMeta {
    #[serde(default = "default_is_end")]
    is_end: bool,
}

fn default_is_end() -> bool {
    true
}

/// Place document from keyword or category search
#[derive(Debug, Deserialize)]
struct PlaceDocument {
    id: String,
    place_name: String,
    #[serde(default)]
    address_name: String,
    #[serde(default)]
    road_address_name: String,
    x: String,
    y: String,
}

impl PlaceDocument {
    /// Convert to a candidate; coordinates that do not parse drop the record
    fn into_candidate(self) -> Option<PlaceCandidate> {
        let location = parse_xy(&self.x, &self.y)?;
        let address = if self.road_address_name.is_empty() {
            self.address_name
        } else {
            self.road_address_name
        };
        Some(PlaceCandidate {
            id: self.id,
            name: self.place_name,
            address,
            location,
        })
    }
}

/// Any document carrying `x`/`y` strings (address or keyword hit)
#[derive(Debug, Deserialize)]
struct CoordinateDocument {
    x: String,
    y: String,
}

fn parse_xy(x: &str, y: &str) -> Option<GeoPoint> {
    let longitude = x.trim().parse::<f64>().ok()?;
    let latitude = y.trim().parse::<f64>().ok()?;
    let point = GeoPoint::new(latitude, longitude);
    point.is_valid().then_some(point)
}

/// Kakao Local API client
pub struct KakaoLocalClient {
    http: ProviderClient,
    api_key: String,
    base_url: String,
    max_radius_m: u32,
}

impl KakaoLocalClient {
    pub fn new(http: ProviderClient, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_radius_m: KAKAO_MAX_RADIUS_M,
        }
    }

    /// Lower the per-query radius; values above the Kakao limit are clamped
    #[must_use]
    pub fn with_max_radius(mut self, radius_m: u32) -> Self {
        self.max_radius_m = radius_m.clamp(1, KAKAO_MAX_RADIUS_M);
        self
    }

    async fn first_coordinate(&self, url: &str) -> Option<GeoPoint> {
        let auth = auth_header(&self.api_key);
        let response: LocalResponse = self
            .http
            .get_json(url, &[("Authorization", auth.as_str())])
            .await?;

        response.documents.into_iter().find_map(|doc| {
            let doc: CoordinateDocument = serde_json::from_value(doc).ok()?;
            parse_xy(&doc.x, &doc.y)
        })
    }
}

#[async_trait]
impl Geocoder for KakaoLocalClient {
    /// Address search first, keyword search as fallback for landmarks
    #[instrument(skip(self))]
    async fn resolve(&self, query: &str) -> Option<GeoPoint> {
        let encoded = urlencoding::encode(query);

        let address_url = format!("{}/v2/local/search/address?query={encoded}", self.base_url);
        if let Some(point) = self.first_coordinate(&address_url).await {
            info!("Resolved '{}' by address to {}", query, point);
            return Some(point);
        }

        debug!("No address match for '{}', trying keyword search", query);
        let keyword_url = format!(
            "{}/v2/local/search/keyword?query={encoded}&size=1",
            self.base_url
        );
        let point = self.first_coordinate(&keyword_url).await;
        match point {
            Some(point) => info!("Resolved '{}' by keyword to {}", query, point),
            None => warn!("Could not resolve '{}'", query),
        }
        point
    }
}

#[async_trait]
impl PlaceSearchProvider for KakaoLocalClient {
    fn max_radius_m(&self) -> u32 {
        self.max_radius_m
    }

    #[instrument(skip(self), fields(criterion = %query.criterion, page = query.page))]
    async fn search_page(&self, query: &PageQuery) -> Option<PlacePage> {
        let (endpoint, criterion_param) = match &query.criterion {
            SearchCriterion::Keyword(keyword) => {
                ("keyword", format!("query={}", urlencoding::encode(keyword)))
            }
            SearchCriterion::Category(category) => {
                ("category", format!("category_group_code={}", category.code()))
            }
        };

        let url = format!(
            "{}/v2/local/search/{endpoint}?{criterion_param}&x={}&y={}&radius={}&size={}&page={}",
            self.base_url,
            query.center.longitude,
            query.center.latitude,
            query.radius_m.min(self.max_radius_m),
            query.page_size.clamp(1, KAKAO_MAX_PAGE_SIZE),
            query.page.max(1),
        );

        let auth = auth_header(&self.api_key);
        let response: LocalResponse = self
            .http
            .get_json(&url, &[("Authorization", auth.as_str())])
            .await?;

        let total = response.documents.len();
        let items: Vec<PlaceCandidate> = response
            .documents
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<PlaceDocument>(doc).ok())
            .filter_map(PlaceDocument::into_candidate)
            .collect();

        if items.len() < total {
            warn!(
                "Skipped {} malformed place records on page {}",
                total - items.len(),
                query.page
            );
        }

        Some(PlacePage {
            items,
            is_last_page: response.meta.is_none_or(|meta| meta.is_end),
        })
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    result_code: i64,
    summary: Option<RouteSummary>,
}

#[derive(Debug, Deserialize)]
struct RouteSummary {
    /// One-way seconds
    duration: u64,
}

/// Kakao Mobility future-directions client for car travel times
pub struct KakaoMobilityClient {
    http: ProviderClient,
    api_key: String,
    base_url: String,
}

impl KakaoMobilityClient {
    pub fn new(http: ProviderClient, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TravelTimeProvider for KakaoMobilityClient {
    fn mode(&self) -> TransportMode {
        TransportMode::Car
    }

    #[instrument(skip(self))]
    async fn estimate(
        &self,
        departure: NaiveDateTime,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Option<u64> {
        // Kakao wants "lon,lat"
        let url = format!(
            "{}/v1/future/directions?departure_time={}&origin={},{}&destination={},{}",
            self.base_url,
            departure.format("%Y%m%d%H%M"),
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude,
        );

        let auth = auth_header(&self.api_key);
        let response: DirectionsResponse = self
            .http
            .get_json(&url, &[("Authorization", auth.as_str())])
            .await?;

        let route = response.routes.into_iter().next()?;
        if route.result_code != 0 {
            debug!("No car route (result code {})", route.result_code);
            return None;
        }
        route.summary.map(|summary| summary.duration)
    }
}
