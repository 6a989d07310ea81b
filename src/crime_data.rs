//! Crime-data providers and the failure boundary around them.
//!
//! Everything past [`fetch_crime_estimate`] is infallible from the caller's
//! point of view: a timeout, a bad status, or a malformed payload is logged
//! and surfaced as `None`, and the scoring pipeline falls back to local
//! signals only.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

use crate::types::{CrimeEstimate, GeoPoint};

/// Default search radius, in provider units.
pub const DEFAULT_SEARCH_RADIUS: f64 = 1.0;

/// Categories every estimate reports, regardless of search radius.
pub const CRIME_CATEGORIES: [&str; 5] = [
    "violent-crime",
    "property-crime",
    "robbery",
    "burglary",
    "assault",
];

#[derive(Debug, Error)]
pub enum CrimeDataError {
    /// HTTP request failed or returned a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected shape.
    #[error("malformed crime data payload: {message}")]
    MalformedPayload { message: String },
}

/// An opaque source of crime statistics around a coordinate.
#[async_trait]
pub trait CrimeDataProvider: Send + Sync {
    async fn estimate(
        &self,
        lat: f64,
        lng: f64,
        radius: f64,
    ) -> Result<CrimeEstimate, CrimeDataError>;
}

/// Calls the provider under a deadline and absorbs every failure mode.
///
/// Returns `None` on timeout, transport error, or malformed payload; the
/// failure is logged here and never propagates to the caller.
pub async fn fetch_crime_estimate(
    provider: &dyn CrimeDataProvider,
    lat: f64,
    lng: f64,
    radius: f64,
    deadline: Duration,
) -> Option<CrimeEstimate> {
    match tokio::time::timeout(deadline, provider.estimate(lat, lng, radius)).await {
        Ok(Ok(estimate)) => Some(estimate),
        Ok(Err(err)) => {
            log::warn!("crime data fetch failed for ({lat}, {lng}): {err}");
            None
        }
        Err(_) => {
            log::warn!(
                "crime data fetch for ({lat}, {lng}) exceeded {}ms deadline",
                deadline.as_millis()
            );
            None
        }
    }
}

/// Remote provider backed by a crime-data HTTP endpoint.
///
/// Expects a JSON object keyed by category name with numeric rates, e.g.
/// `{"violent-crime": 6.2, "robbery": 3.1}`.
pub struct HttpCrimeProvider {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCrimeProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CrimeDataProvider for HttpCrimeProvider {
    async fn estimate(
        &self,
        lat: f64,
        lng: f64,
        radius: f64,
    ) -> Result<CrimeEstimate, CrimeDataError> {
        let url = format!("{}/api/crime-data", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("lat", lat), ("lng", lng), ("radius", radius)])
            .send()
            .await?
            .error_for_status()?;
        let body: serde_json::Value = response.json().await?;

        let rates = body
            .as_object()
            .ok_or_else(|| CrimeDataError::MalformedPayload {
                message: "expected a JSON object of category rates".to_string(),
            })?;

        let mut crime_stats = HashMap::new();
        for (category, value) in rates {
            if let Some(rate) = value.as_f64() {
                crime_stats.insert(category.clone(), rate);
            }
        }
        if crime_stats.is_empty() {
            return Err(CrimeDataError::MalformedPayload {
                message: "no numeric category rates in response".to_string(),
            });
        }

        let total_crime_rate: f64 = crime_stats.values().sum();
        Ok(CrimeEstimate {
            coordinates: GeoPoint::new(lat, lng),
            safety_score: safety_from_total(total_crime_rate),
            crime_stats,
            total_crime_rate,
        })
    }
}

/// Local stand-in used when no live backend is configured.
///
/// Rates are a distance falloff toward a few named high-crime reference
/// areas, multiplied by bounded jitter, so repeated queries look like noisy
/// real data while staying in plausible ranges. The radius stretches the
/// falloff reach; the category list never changes.
pub struct SimulatedCrimeProvider {
    reference_points: Vec<(&'static str, GeoPoint)>,
}

/// Baseline rate per category at the center of a reference area.
const CATEGORY_BASE_RATES: [(&str, f64); 5] = [
    ("violent-crime", 9.0),
    ("property-crime", 24.0),
    ("robbery", 7.0),
    ("burglary", 11.0),
    ("assault", 8.0),
];

/// Degrees of falloff reach per radius unit.
const REACH_DEG_PER_UNIT: f64 = 0.05;

impl SimulatedCrimeProvider {
    pub fn new() -> Self {
        Self {
            reference_points: vec![
                ("Tenderloin", GeoPoint::new(37.7835, -122.4134)),
                ("SoMa", GeoPoint::new(37.7786, -122.4056)),
                ("Mission 16th St", GeoPoint::new(37.7648, -122.4194)),
                ("Bayview", GeoPoint::new(37.7299, -122.3893)),
            ],
        }
    }

    /// Falloff in [0.2, 1.0]: 1.0 at a reference point, decaying linearly
    /// to the 0.2 background level at the edge of the reach.
    fn proximity_factor(&self, point: &GeoPoint, radius: f64) -> f64 {
        let reach = REACH_DEG_PER_UNIT * radius.max(f64::EPSILON);
        let strongest = self
            .reference_points
            .iter()
            .map(|(_, reference)| (1.0 - point.degree_distance(reference) / reach).max(0.0))
            .fold(0.0, f64::max);
        0.2 + 0.8 * strongest
    }
}

impl Default for SimulatedCrimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrimeDataProvider for SimulatedCrimeProvider {
    async fn estimate(
        &self,
        lat: f64,
        lng: f64,
        radius: f64,
    ) -> Result<CrimeEstimate, CrimeDataError> {
        let point = GeoPoint::new(lat, lng);
        let factor = self.proximity_factor(&point, radius);

        let mut rng = rand::thread_rng();
        let mut crime_stats = HashMap::new();
        for (category, base) in CATEGORY_BASE_RATES {
            let jitter: f64 = rng.gen_range(0.7..=1.3);
            crime_stats.insert(category.to_string(), base * factor * jitter);
        }

        let total_crime_rate: f64 = crime_stats.values().sum();
        Ok(CrimeEstimate {
            coordinates: point,
            safety_score: safety_from_total(total_crime_rate),
            crime_stats,
            total_crime_rate,
        })
    }
}

fn safety_from_total(total_crime_rate: f64) -> u8 {
    (100.0 - total_crime_rate).round().clamp(0.0, 100.0) as u8
}
