mod advice;
mod crime_data;
mod routes;
mod scoring;
mod signals;
mod types;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use futures::future::join_all;
use geo::Point;
use geo::prelude::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::advice::recommendations;
use crate::crime_data::{
    CrimeDataProvider, DEFAULT_SEARCH_RADIUS, HttpCrimeProvider, SimulatedCrimeProvider,
    fetch_crime_estimate,
};
use crate::routes::generate_candidates;
use crate::scoring::{blend, score_route};
use crate::signals::RiskSignalStore;
use crate::types::{GeoPoint, RouteCandidate, ServiceCategory};

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_MS: u64 = 3000;

// Shared State for concurrency
struct AppState {
    signals: &'static RiskSignalStore,
    provider: Arc<dyn CrimeDataProvider>,
    deadline: Duration,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    // 1. Pick a crime data provider. Without a configured backend the
    // simulated one stands in.
    let provider: Arc<dyn CrimeDataProvider> = match std::env::var("CRIME_API_URL") {
        Ok(url) => {
            log::info!("using crime data endpoint at {url}");
            Arc::new(HttpCrimeProvider::new(url))
        }
        Err(_) => {
            log::info!("CRIME_API_URL not set, using simulated crime data");
            Arc::new(SimulatedCrimeProvider::new())
        }
    };

    let deadline = std::env::var("CRIME_API_TIMEOUT_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map_or(Duration::from_millis(DEFAULT_TIMEOUT_MS), Duration::from_millis);

    let signals = RiskSignalStore::default_dataset();
    log::info!(
        "signal store loaded: {} crime, {} lighting, {} service points",
        signals.crime_signals().len(),
        signals.lighting_signals().len(),
        signals.service_signals().len()
    );

    let shared_state = Arc::new(AppState {
        signals,
        provider,
        deadline,
    });

    // 2. Setup CORS (allows a local map frontend to talk to this API)
    let cors = CorsLayer::new()
        .allow_methods(tower_http::cors::Any)
        .allow_origin(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    // 3. Setup Router
    let app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/route", post(calculate_routes))
        .layer(cors)
        .with_state(shared_state);

    let bind = std::env::var("SAFEROUTE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
    log::info!("API server running on http://{bind}");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- API DTOs ---

#[derive(Deserialize)]
struct RouteRequest {
    origin: Option<[f64; 2]>,      // [lat, lng]
    destination: Option<[f64; 2]>, // [lat, lng]
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteResponse {
    routes: Vec<ScoredRoute>,
    nearby_services: Vec<NearbyService>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScoredRoute {
    #[serde(flatten)]
    candidate: RouteCandidate,
    length_meters: f64,
    recommendations: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NearbyService {
    name: String,
    category: ServiceCategory,
    location: GeoPoint,
    distance_meters: f64,
}

// --- Handler ---

async fn calculate_routes(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RouteRequest>,
) -> Json<RouteResponse> {
    let origin = payload.origin.map(|[lat, lng]| GeoPoint::new(lat, lng));
    let destination = payload.destination.map(|[lat, lng]| GeoPoint::new(lat, lng));

    // 1. Synthesize candidates; a missing endpoint just means no routes yet.
    let mut candidates = generate_candidates(origin, destination);
    if candidates.is_empty() {
        return Json(RouteResponse {
            routes: vec![],
            nearby_services: vec![],
        });
    }

    // 2. Score each candidate locally.
    for candidate in &mut candidates {
        candidate.safety_score = score_route(&candidate.path, state.signals);
    }

    // 3. Fetch one remote estimate per candidate midpoint, concurrently.
    // All outstanding estimates are joined before any blending happens.
    let estimates = join_all(candidates.iter().map(|candidate| {
        let midpoint = candidate.path[candidate.path.len() / 2];
        fetch_crime_estimate(
            state.provider.as_ref(),
            midpoint.lat,
            midpoint.lng,
            DEFAULT_SEARCH_RADIUS,
            state.deadline,
        )
    }))
    .await;

    // 4. Blend and attach guidance. A `None` estimate leaves the local
    // score untouched; the user just sees local-only scoring.
    let routes = candidates
        .into_iter()
        .zip(estimates)
        .map(|(mut candidate, estimate)| {
            candidate.safety_score = blend(&candidate.safety_score, estimate.as_ref());
            candidate.crime_data = estimate;
            let length_meters = path_length_meters(&candidate.path);
            let recommendations = recommendations(candidate.crime_data.as_ref());
            ScoredRoute {
                candidate,
                length_meters,
                recommendations,
            }
        })
        .collect();

    let nearby_services = destination
        .map(|dest| {
            state
                .signals
                .nearest_services(&dest, 3)
                .into_iter()
                .map(|(distance_meters, service)| NearbyService {
                    name: service.name.clone(),
                    category: service.category,
                    location: service.location,
                    distance_meters,
                })
                .collect()
        })
        .unwrap_or_default();

    Json(RouteResponse {
        routes,
        nearby_services,
    })
}

/// Ground length of the synthetic path, reported alongside the score.
fn path_length_meters(path: &[GeoPoint]) -> f64 {
    path.iter()
        .tuple_windows()
        .map(|(a, b)| Point::new(a.lng, a.lat).haversine_distance(&Point::new(b.lng, b.lat)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::REMOTE_BLEND_WEIGHT;
    use crate::types::SafetyScore;

    #[test]
    fn path_length_sums_segment_distances() {
        let path = vec![
            GeoPoint::new(37.774, -122.419),
            GeoPoint::new(37.780, -122.410),
            GeoPoint::new(37.790, -122.401),
        ];
        let total = path_length_meters(&path);
        let first = path_length_meters(&path[..2]);
        let second = path_length_meters(&path[1..]);
        assert!((total - (first + second)).abs() < 1e-6);
        assert!(total > 0.0);
    }

    #[test]
    fn degenerate_paths_have_zero_length() {
        assert_eq!(path_length_meters(&[]), 0.0);
        assert_eq!(path_length_meters(&[GeoPoint::new(37.774, -122.419)]), 0.0);
    }

    #[tokio::test]
    async fn pipeline_degrades_to_local_scores_when_estimates_are_absent() {
        let store = RiskSignalStore::default_dataset();
        let candidates = generate_candidates(
            Some(GeoPoint::new(37.774, -122.419)),
            Some(GeoPoint::new(37.790, -122.401)),
        );
        assert_eq!(candidates.len(), 3);
        for candidate in &candidates {
            let local = score_route(&candidate.path, store);
            let blended = blend(&local, None);
            assert_eq!(local, blended);
        }
    }

    #[tokio::test]
    async fn pipeline_blends_simulated_estimates() {
        let store = RiskSignalStore::default_dataset();
        let provider = SimulatedCrimeProvider::new();
        let candidates = generate_candidates(
            Some(GeoPoint::new(37.774, -122.419)),
            Some(GeoPoint::new(37.790, -122.401)),
        );
        for candidate in &candidates {
            let midpoint = candidate.path[candidate.path.len() / 2];
            let estimate = fetch_crime_estimate(
                &provider,
                midpoint.lat,
                midpoint.lng,
                DEFAULT_SEARCH_RADIUS,
                Duration::from_secs(1),
            )
            .await
            .expect("simulated provider never fails");

            let local = score_route(&candidate.path, store);
            let blended = blend(&local, Some(&estimate));
            let expected_crime = (f64::from(local.crime) * (1.0 - REMOTE_BLEND_WEIGHT)
                + f64::from(estimate.safety_score) * REMOTE_BLEND_WEIGHT)
                .round() as u8;
            assert_eq!(blended, SafetyScore::compose(expected_crime, local.lighting));
        }
    }
}
