//! Persistent-cache decorators for slow-changing provider answers
//!
//! Only successful answers are stored. A cache failure is logged and treated as a
//! miss, so the wrapped provider is always the source of truth.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rand::RngExt;
use tracing::{instrument, warn};

use super::{Geocoder, TravelTimeProvider};
use crate::cache::PersistentCache;
use crate::models::{GeoPoint, TransportMode};

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

pub struct CachedGeocoder {
    inner: Arc<dyn Geocoder>,
    cache: PersistentCache,
    ttl: Duration,
}

impl CachedGeocoder {
    pub fn new(inner: Arc<dyn Geocoder>, cache: PersistentCache, ttl_days: u64) -> Self {
        Self {
            inner,
            cache,
            ttl: Duration::from_secs(ttl_days * SECONDS_PER_DAY),
        }
    }

    fn key(query: &str) -> String {
        format!("geocode:{}", query.trim().to_lowercase())
    }
}

#[async_trait]
impl Geocoder for CachedGeocoder {
    #[instrument(skip(self))]
    async fn resolve(&self, query: &str) -> Option<GeoPoint> {
        let key = Self::key(query);

        match self.cache.get::<GeoPoint>(&key).await {
            Ok(Some(cached)) => return Some(cached),
            Ok(None) => {}
            Err(e) => warn!("Geocode cache lookup failed: {e:#}"),
        }

        let point = self.inner.resolve(query).await?;
        if let Err(e) = self.cache.put(&key, point, self.ttl).await {
            warn!("Failed to cache geocode result: {e:#}");
        }
        Some(point)
    }
}

pub struct CachedTravelTime {
    inner: Arc<dyn TravelTimeProvider>,
    cache: PersistentCache,
    ttl_days: u64,
}

impl CachedTravelTime {
    pub fn new(inner: Arc<dyn TravelTimeProvider>, cache: PersistentCache, ttl_days: u64) -> Self {
        Self {
            inner,
            cache,
            ttl_days,
        }
    }

    /// Routes depend on the hour of departure, not the minute
    fn key(
        mode: TransportMode,
        departure: NaiveDateTime,
        origin: &GeoPoint,
        destination: &GeoPoint,
    ) -> String {
        format!(
            "travel:{mode}:{}:{}-{}",
            departure.format("%Y%m%d%H"),
            origin.to_key(),
            destination.to_key()
        )
    }

    /// Spread expiries so entries written together do not all expire together
    fn jittered_ttl(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        Duration::from_secs((self.ttl_days as f64 * SECONDS_PER_DAY as f64 * jitter) as u64)
    }
}

#[async_trait]
impl TravelTimeProvider for CachedTravelTime {
    fn mode(&self) -> TransportMode {
        self.inner.mode()
    }

    #[instrument(skip(self))]
    async fn estimate(
        &self,
        departure: NaiveDateTime,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Option<u64> {
        let key = Self::key(self.mode(), departure, &origin, &destination);

        match self.cache.get::<u64>(&key).await {
            Ok(Some(cached)) => return Some(cached),
            Ok(None) => {}
            Err(e) => warn!("Travel time cache lookup failed: {e:#}"),
        }

        let seconds = self.inner.estimate(departure, origin, destination).await?;
        if let Err(e) = self.cache.put(&key, seconds, self.jittered_ttl()).await {
            warn!("Failed to cache travel time: {e:#}");
        }
        Some(seconds)
    }
}
