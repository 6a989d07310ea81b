use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Euclidean distance in coordinate-degree space. This is the metric
    /// the proximity scorer thresholds are defined in (0.01 deg ~ 1 km at
    /// mid-latitudes), not a real ground distance.
    pub fn degree_distance(&self, other: &GeoPoint) -> f64 {
        let d_lat = self.lat - other.lat;
        let d_lng = self.lng - other.lng;
        (d_lat * d_lat + d_lng * d_lng).sqrt()
    }

    /// Coordinate equality within a floating tolerance.
    pub fn close_to(&self, other: &GeoPoint, tolerance: f64) -> bool {
        (self.lat - other.lat).abs() <= tolerance && (self.lng - other.lng).abs() <= tolerance
    }
}

/// Known brightness of a mapped lighting source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightLevel {
    Low,
    Medium,
    High,
}

impl LightLevel {
    /// Minimum lighting value (0-1 scale) a path point near this source is
    /// raised to. A brighter known source never lowers a better estimate.
    pub const fn floor(self) -> f64 {
        match self {
            LightLevel::Low => 0.3,
            LightLevel::Medium => 0.6,
            LightLevel::High => 0.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Police,
    Hospital,
    FireStation,
}

/// A geo-tagged crime-density proxy. Weight 0.0 = negligible, 1.0 = dense.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CrimeSignalPoint {
    pub location: GeoPoint,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LightingSignalPoint {
    pub location: GeoPoint,
    pub level: LightLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceSignalPoint {
    pub location: GeoPoint,
    pub category: ServiceCategory,
    pub name: String,
}

/// Composite 0-100 safety metric for one route.
///
/// Invariant: `overall` is always recomputed from the sub-scores through
/// [`SafetyScore::compose`], so `overall == round(crime*0.6 + lighting*0.4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyScore {
    pub overall: u8,
    pub crime: u8,
    pub lighting: u8,
}

/// Crime incidence dominates the composite; lighting is secondary.
pub const CRIME_COMPOSITE_WEIGHT: f64 = 0.6;
pub const LIGHTING_COMPOSITE_WEIGHT: f64 = 0.4;

impl SafetyScore {
    /// Builds a score from the two sub-scores, deriving `overall` from the
    /// fixed 60/40 composite weighting.
    pub fn compose(crime: u8, lighting: u8) -> Self {
        let overall = (f64::from(crime) * CRIME_COMPOSITE_WEIGHT
            + f64::from(lighting) * LIGHTING_COMPOSITE_WEIGHT)
            .round() as u8;
        Self {
            overall,
            crime,
            lighting,
        }
    }

    pub const fn zero() -> Self {
        Self {
            overall: 0,
            crime: 0,
            lighting: 0,
        }
    }
}

/// Aggregated crime statistics around a coordinate, as reported by a crime
/// data provider. Read-only once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeEstimate {
    pub coordinates: GeoPoint,
    /// Category name (e.g. `"violent-crime"`) to incidence rate.
    pub crime_stats: HashMap<String, f64>,
    pub total_crime_rate: f64,
    pub safety_score: u8,
}

impl CrimeEstimate {
    pub fn rate(&self, category: &str) -> f64 {
        self.crime_stats.get(category).copied().unwrap_or(0.0)
    }
}

/// One synthetic alternative between an origin and a destination.
///
/// Created by the candidate generator, then written once more to attach the
/// safety score and the optional remote estimate. Scoped to a single
/// origin/destination query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCandidate {
    pub id: String,
    pub name: String,
    pub duration: String,
    pub distance: String,
    pub path: Vec<GeoPoint>,
    pub safety_score: SafetyScore,
    pub crime_data: Option<CrimeEstimate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_holds_the_composite_invariant() {
        for (crime, lighting) in [(0u8, 0u8), (100, 100), (73, 41), (50, 51)] {
            let score = SafetyScore::compose(crime, lighting);
            let expected =
                (f64::from(crime) * 0.6 + f64::from(lighting) * 0.4).round() as u8;
            assert_eq!(score.overall, expected);
            assert_eq!(score.crime, crime);
            assert_eq!(score.lighting, lighting);
        }
    }

    #[test]
    fn degree_distance_is_symmetric() {
        let a = GeoPoint::new(37.774, -122.419);
        let b = GeoPoint::new(37.781, -122.411);
        assert!((a.degree_distance(&b) - b.degree_distance(&a)).abs() < 1e-12);
        assert_eq!(a.degree_distance(&a), 0.0);
    }

    #[test]
    fn close_to_respects_tolerance() {
        let a = GeoPoint::new(37.774, -122.419);
        let b = GeoPoint::new(37.7741, -122.4189);
        assert!(a.close_to(&b, 1e-3));
        assert!(!a.close_to(&b, 1e-6));
    }

    #[test]
    fn light_level_floors_are_ordered() {
        assert!(LightLevel::High.floor() > LightLevel::Medium.floor());
        assert!(LightLevel::Medium.floor() > LightLevel::Low.floor());
    }
}
