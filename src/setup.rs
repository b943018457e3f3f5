//! Wiring configuration into a ready-to-run pipeline

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::DayTripError;
use crate::cache::PersistentCache;
use crate::config::DayTripConfig;
use crate::enrichment::FeasibilityEnricher;
use crate::http::{ClientSettings, ProviderClient};
use crate::pipeline::{CandidatePipeline, PipelineSettings};
use crate::providers::{
    CachedGeocoder, CachedTravelTime, Geocoder, KakaoLocalClient, KakaoMobilityClient,
    OdsayClient, OpenMeteoClient, PlaceSearchProvider, TravelTimeProvider,
};
use crate::reasoning::{OpenAiReasoner, PassThroughReasoner, ReasoningCollaborator};
use crate::search::{FanOutSearcher, PageLimits, PlaceSearchGateway};

/// Build the pipeline with real providers
pub fn build_pipeline(config: &DayTripConfig) -> Result<CandidatePipeline> {
    let kakao_key = config.kakao.api_key.clone().ok_or_else(|| {
        DayTripError::config(
            "Kakao API key is required. Set kakao.api_key or DAYTRIP_KAKAO__API_KEY.",
        )
    })?;

    let http = ProviderClient::new("kakao-local", &ClientSettings::from(&config.http))?;

    let cache = if config.cache.enabled {
        Some(open_cache(Path::new(&config.cache.location))?)
    } else {
        None
    };

    let kakao_local = Arc::new(
        KakaoLocalClient::new(
            http.clone(),
            kakao_key.clone(),
            config.kakao.local_base_url.clone(),
        )
        .with_max_radius(config.search.provider_max_radius_m),
    );

    let geocoder: Arc<dyn Geocoder> = match &cache {
        Some(cache) => Arc::new(CachedGeocoder::new(
            kakao_local.clone(),
            cache.clone(),
            config.cache.geocode_ttl_days,
        )),
        None => kakao_local.clone(),
    };

    let place_search: Arc<dyn PlaceSearchProvider> = kakao_local;
    let gateway = PlaceSearchGateway::new(
        place_search,
        PageLimits {
            max_pages: config.search.max_pages,
            page_size: config.search.page_size,
        },
    );
    let searcher = FanOutSearcher::new(gateway, config.search.max_workers);

    let mut routers: Vec<Arc<dyn TravelTimeProvider>> = vec![Arc::new(KakaoMobilityClient::new(
        http.named("kakao-mobility"),
        kakao_key,
        config.kakao.mobility_base_url.clone(),
    ))];
    match &config.odsay.api_key {
        Some(key) => routers.push(Arc::new(OdsayClient::new(
            http.named("odsay"),
            key.clone(),
            config.odsay.base_url.clone(),
        ))),
        None => warn!("No ODsay API key configured, public transit times are unavailable"),
    }
    if let Some(cache) = &cache {
        routers = routers
            .into_iter()
            .map(|router| {
                Arc::new(CachedTravelTime::new(
                    router,
                    cache.clone(),
                    config.cache.travel_time_ttl_days,
                )) as Arc<dyn TravelTimeProvider>
            })
            .collect();
    }

    let weather = Arc::new(OpenMeteoClient::new(
        http.named("open-meteo"),
        config.weather.base_url.clone(),
        config.weather.timezone.clone(),
    ));
    let enricher = FeasibilityEnricher::new(routers, weather);

    let reasoner: Arc<dyn ReasoningCollaborator> = match &config.reasoning.api_key {
        Some(key) => Arc::new(OpenAiReasoner::new(
            http.named("reasoning"),
            key.clone(),
            config.reasoning.base_url.clone(),
            config.reasoning.model.clone(),
            config.reasoning.temperature,
        )),
        None => {
            warn!("No reasoning API key configured, filtering and ranking pass candidates through");
            Arc::new(PassThroughReasoner)
        }
    };

    Ok(CandidatePipeline::new(
        geocoder,
        searcher,
        enricher,
        reasoner,
        PipelineSettings {
            top_k: config.pipeline.top_k,
            filter_multiplier: config.pipeline.filter_multiplier,
        },
    ))
}

fn open_cache(location: &Path) -> Result<PersistentCache> {
    std::fs::create_dir_all(location)
        .with_context(|| format!("Failed to create cache directory: {}", location.display()))?;
    let cache = PersistentCache::open(location)
        .with_context(|| format!("Failed to open cache at {}", location.display()))?;
    info!("Using cache at {}", location.display());
    Ok(cache)
}
