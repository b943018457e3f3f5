//! Open-Meteo daily forecast

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::WeatherProvider;
use crate::http::ProviderClient;
use crate::models::{GeoPoint, WeatherDaySummary};

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    daily: Option<DailyData>,
}

/// Parallel arrays indexed by day
#[derive(Debug, Deserialize)]
struct DailyData {
    time: Vec<String>,
    weathercode: Vec<Option<u8>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
}

impl DailyData {
    /// Summary for `date`, or `None` when the day is missing or incomplete
    fn summary_for(&self, date: NaiveDate) -> Option<WeatherDaySummary> {
        let wanted = date.format("%Y-%m-%d").to_string();
        let index = self.time.iter().position(|day| *day == wanted)?;

        Some(WeatherDaySummary {
            condition_code: (*self.weathercode.get(index)?)?,
            high_c: (*self.temperature_2m_max.get(index)?)?,
            low_c: (*self.temperature_2m_min.get(index)?)?,
            precipitation_mm: self.precipitation_sum.get(index).copied().flatten().unwrap_or(0.0),
        })
    }
}

/// Open-Meteo forecast client
pub struct OpenMeteoClient {
    http: ProviderClient,
    base_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    pub fn new(http: ProviderClient, base_url: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timezone: timezone.into(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    #[instrument(skip(self))]
    async fn summarize(&self, location: GeoPoint, date: NaiveDate) -> Option<WeatherDaySummary> {
        let day = date.format("%Y-%m-%d");
        let url = format!(
            "{}/forecast?latitude={:.4}&longitude={:.4}\
             &daily=weathercode,temperature_2m_max,temperature_2m_min,precipitation_sum\
             &timezone={}&start_date={day}&end_date={day}",
            self.base_url,
            location.latitude,
            location.longitude,
            urlencoding::encode(&self.timezone),
        );

        let response: ForecastResponse = self.http.get_json(&url, &[]).await?;
        let summary = response.daily?.summary_for(date);
        if summary.is_none() {
            debug!("Forecast has no complete entry for {}", date);
        }
        summary
    }
}
