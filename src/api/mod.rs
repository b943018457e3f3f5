use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::DayTripError;
use crate::models::TripRequest;
use crate::pipeline::{CandidatePipeline, Recommendation};

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<CandidatePipeline>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .route("/recommendations", post(recommend))
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

async fn recommend(
    State(state): State<ApiState>,
    Json(request): Json<TripRequest>,
) -> Result<Json<Recommendation>, (StatusCode, Json<ApiError>)> {
    state
        .pipeline
        .run(&request)
        .await
        .map(Json)
        .map_err(|e| {
            warn!("Recommendation request failed: {}", e);
            (
                status_for(&e),
                Json(ApiError {
                    error: e.user_message(),
                }),
            )
        })
}

fn status_for(error: &DayTripError) -> StatusCode {
    match error {
        DayTripError::GeocodeNotFound { .. } => StatusCode::NOT_FOUND,
        DayTripError::Validation { .. } => StatusCode::BAD_REQUEST,
        DayTripError::ProviderUnavailable { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&DayTripError::geocode_not_found("x")),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&DayTripError::validation("bad k")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DayTripError::cache("disk full")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
