//! Paginated place search against a single sub-region

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::models::{GeoPoint, PlaceCandidate, SearchCriterion};
use crate::providers::{PageQuery, PlaceSearchProvider};
use crate::{DayTripError, Result};

/// How many pages to walk and how large each one is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLimits {
    pub max_pages: u32,
    pub page_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_pages: 5,
            page_size: 15,
        }
    }
}

#[derive(Clone)]
pub struct PlaceSearchGateway {
    provider: Arc<dyn PlaceSearchProvider>,
    limits: PageLimits,
}

impl PlaceSearchGateway {
    pub fn new(provider: Arc<dyn PlaceSearchProvider>, limits: PageLimits) -> Self {
        Self { provider, limits }
    }

    #[must_use]
    pub fn max_radius_m(&self) -> u32 {
        self.provider.max_radius_m()
    }

    /// Collect every page for one center.
    ///
    /// A failing first page is an error. A failing later page ends the walk and
    /// keeps what was already collected.
    #[instrument(skip(self), fields(criterion = %criterion))]
    pub async fn search(
        &self,
        center: GeoPoint,
        radius_m: u32,
        criterion: &SearchCriterion,
    ) -> Result<Vec<PlaceCandidate>> {
        let mut places = Vec::new();

        for page in 1..=self.limits.max_pages.max(1) {
            let query = PageQuery {
                center,
                radius_m,
                criterion: criterion.clone(),
                page,
                page_size: self.limits.page_size,
            };

            let Some(result) = self.provider.search_page(&query).await else {
                if page == 1 {
                    return Err(DayTripError::provider(
                        "place-search",
                        format!("first page failed for {criterion} around {center}"),
                    ));
                }
                warn!(
                    "Page {} failed around {}, keeping {} places from earlier pages",
                    page,
                    center,
                    places.len()
                );
                break;
            };

            if result.items.is_empty() {
                break;
            }
            places.extend(result.items);

            if result.is_last_page {
                break;
            }
        }

        debug!("Found {} places around {}", places.len(), center);
        Ok(places)
    }
}
