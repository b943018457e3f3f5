//! Concurrent place search across every center of a search geometry

use std::collections::HashSet;

use futures::{StreamExt, stream};
use tracing::{info, instrument, warn};

use super::PlaceSearchGateway;
use crate::geo::SearchGeometry;
use crate::models::{PlaceCandidate, SearchCriterion};

/// Default bound on concurrent sub-region searches (origin plus six ring centers)
pub const DEFAULT_MAX_WORKERS: usize = 7;

/// Keep the first occurrence of every provider id, preserving order
#[must_use]
pub fn dedup_by_id(places: Vec<PlaceCandidate>) -> Vec<PlaceCandidate> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|place| seen.insert(place.id.clone()))
        .collect()
}

#[derive(Clone)]
pub struct FanOutSearcher {
    gateway: PlaceSearchGateway,
    max_workers: usize,
}

impl FanOutSearcher {
    pub fn new(gateway: PlaceSearchGateway, max_workers: usize) -> Self {
        Self {
            gateway,
            max_workers: max_workers.max(1),
        }
    }

    /// Largest radius the underlying provider accepts per query
    #[must_use]
    pub fn max_radius_m(&self) -> u32 {
        self.gateway.max_radius_m()
    }

    /// Search every center and merge the results.
    ///
    /// A worker that errors or panics is logged and contributes nothing; the
    /// remaining workers are unaffected.
    #[instrument(skip(self, geometry), fields(centers = geometry.centers.len(), criterion = %criterion))]
    pub async fn search(
        &self,
        geometry: &SearchGeometry,
        criterion: &SearchCriterion,
    ) -> Vec<PlaceCandidate> {
        if let [center] = geometry.centers.as_slice() {
            return match self.gateway.search(*center, geometry.radius_m, criterion).await {
                Ok(places) => dedup_by_id(places),
                Err(e) => {
                    warn!("Search around {} failed: {}", center, e);
                    Vec::new()
                }
            };
        }

        let radius_m = self.gateway.max_radius_m();
        let workers = self.max_workers.min(geometry.centers.len()).max(1);

        let outcomes: Vec<_> = stream::iter(geometry.centers.iter().copied().enumerate())
            .map(|(index, center)| {
                let gateway = self.gateway.clone();
                let criterion = criterion.clone();
                async move {
                    let handle = tokio::spawn(async move {
                        gateway.search(center, radius_m, &criterion).await
                    });
                    (index, center, handle.await)
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        let mut merged = Vec::new();
        let mut failed = 0usize;
        for (index, center, outcome) in outcomes {
            match outcome {
                Ok(Ok(places)) => merged.extend(places),
                Ok(Err(e)) => {
                    failed += 1;
                    warn!("Search worker {} around {} failed: {}", index, center, e);
                }
                Err(join_error) => {
                    failed += 1;
                    warn!(
                        "Search worker {} around {} aborted: {}",
                        index, center, join_error
                    );
                }
            }
        }

        let raw = merged.len();
        let places = dedup_by_id(merged);
        info!(
            "Fan-out finished: {} unique of {} places, {} of {} workers failed",
            places.len(),
            raw,
            failed,
            geometry.centers.len()
        );
        places
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeoPoint, PlaceCategory};
    use crate::providers::{PageQuery, PlacePage, PlaceSearchProvider};
    use crate::search::PageLimits;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn place(id: &str) -> PlaceCandidate {
        PlaceCandidate {
            id: id.to_string(),
            name: format!("Place {id}"),
            address: String::new(),
            location: GeoPoint::new(37.5, 127.0),
        }
    }

    /// Returns the same overlapping page everywhere and tracks peak concurrency
    struct OverlappingProvider {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        radii: std::sync::Mutex<Vec<u32>>,
    }

    #[async_trait]
    impl PlaceSearchProvider for OverlappingProvider {
        fn max_radius_m(&self) -> u32 {
            20_000
        }

        async fn search_page(&self, query: &PageQuery) -> Option<PlacePage> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.radii.lock().unwrap().push(query.radius_m);
            tokio::time::sleep(Duration::from_millis(20)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let lat_tag = format!("{:.3}", query.center.latitude);
            Some(PlacePage {
                items: vec![place("shared"), place(&lat_tag)],
                is_last_page: true,
            })
        }
    }

    /// Fails or panics depending on the center
    struct FlakyProvider;

    #[async_trait]
    impl PlaceSearchProvider for FlakyProvider {
        fn max_radius_m(&self) -> u32 {
            20_000
        }

        async fn search_page(&self, query: &PageQuery) -> Option<PlacePage> {
            if query.center.longitude > 127.05 {
                panic!("provider blew up");
            }
            if query.center.longitude < 126.99 {
                return None;
            }
            Some(PlacePage {
                items: vec![place("origin-only")],
                is_last_page: true,
            })
        }
    }

    struct DownProvider;

    #[async_trait]
    impl PlaceSearchProvider for DownProvider {
        fn max_radius_m(&self) -> u32 {
            20_000
        }

        async fn search_page(&self, _: &PageQuery) -> Option<PlacePage> {
            None
        }
    }

    fn searcher(provider: Arc<dyn PlaceSearchProvider>, workers: usize) -> FanOutSearcher {
        FanOutSearcher::new(
            PlaceSearchGateway::new(provider, PageLimits::default()),
            workers,
        )
    }

    fn tiled() -> SearchGeometry {
        crate::geo::tile_area(GeoPoint::new(37.48, 127.02), 40_000, 20_000)
    }

    fn criterion() -> SearchCriterion {
        SearchCriterion::Category(PlaceCategory::TouristSpot)
    }

    #[test]
    fn test_dedup_keeps_first_and_is_idempotent() {
        let mut first = place("a");
        first.name = "First".to_string();
        let places = vec![first, place("b"), place("a"), place("c"), place("b")];

        let once = dedup_by_id(places);
        assert_eq!(
            once.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        assert_eq!(once[0].name, "First");
        assert_eq!(dedup_by_id(once.clone()), once);
    }

    #[tokio::test]
    async fn test_fan_out_merges_and_deduplicates() {
        let provider = Arc::new(OverlappingProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            radii: std::sync::Mutex::new(Vec::new()),
        });
        let places = searcher(provider.clone(), DEFAULT_MAX_WORKERS)
            .search(&tiled(), &criterion())
            .await;

        let ids: HashSet<_> = places.iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids.len(), places.len());
        assert!(ids.contains("shared"));
        assert!(provider.radii.lock().unwrap().iter().all(|r| *r == 20_000));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let provider = Arc::new(OverlappingProvider {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            radii: std::sync::Mutex::new(Vec::new()),
        });
        searcher(provider.clone(), 2)
            .search(&tiled(), &criterion())
            .await;

        assert!(provider.peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(provider.radii.lock().unwrap().len(), 7);
    }

    #[tokio::test]
    async fn test_failures_and_panics_are_isolated() {
        let places = searcher(Arc::new(FlakyProvider), DEFAULT_MAX_WORKERS)
            .search(&tiled(), &criterion())
            .await;
        assert_eq!(places, vec![place("origin-only")]);
    }

    #[tokio::test]
    async fn test_all_workers_failing_yields_empty() {
        let places = searcher(Arc::new(DownProvider), DEFAULT_MAX_WORKERS)
            .search(&tiled(), &criterion())
            .await;
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn test_single_center_failure_yields_empty() {
        let geometry = crate::geo::tile_area(GeoPoint::new(37.48, 127.02), 5_000, 20_000);
        let places = searcher(Arc::new(DownProvider), DEFAULT_MAX_WORKERS)
            .search(&geometry, &criterion())
            .await;
        assert!(places.is_empty());
    }
}
