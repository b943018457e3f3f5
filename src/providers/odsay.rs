//! ODsay public-transit path search

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::TravelTimeProvider;
use crate::http::ProviderClient;
use crate::models::{GeoPoint, TransportMode};

#[derive(Debug, Deserialize)]
struct PathSearchResponse {
    result: Option<PathSearchResult>,
}

#[derive(Debug, Deserialize)]
struct PathSearchResult {
    #[serde(default)]
    path: Vec<TransitPath>,
}

#[derive(Debug, Deserialize)]
struct TransitPath {
    info: Option<PathInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PathInfo {
    /// One-way minutes
    total_time: Option<u64>,
}

impl PathSearchResponse {
    /// One-way minutes of the first (best) path
    fn best_total_minutes(self) -> Option<u64> {
        self.result?.path.into_iter().next()?.info?.total_time
    }
}

pub struct OdsayClient {
    http: ProviderClient,
    api_key: String,
    base_url: String,
}

impl OdsayClient {
    pub fn new(http: ProviderClient, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TravelTimeProvider for OdsayClient {
    fn mode(&self) -> TransportMode {
        TransportMode::Public
    }

    /// ODsay has no departure-time parameter; the best path is time independent
    #[instrument(skip(self, _departure))]
    async fn estimate(
        &self,
        _departure: NaiveDateTime,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Option<u64> {
        let url = format!(
            "{}/searchPubTransPathT?apiKey={}&SX={}&SY={}&EX={}&EY={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude,
        );

        let response: PathSearchResponse = self.http.get_json(&url, &[]).await?;
        let minutes = response.best_total_minutes();
        if minutes.is_none() {
            debug!("No transit path between {} and {}", origin, destination);
        }
        minutes.map(|m| m * 60)
    }
}
