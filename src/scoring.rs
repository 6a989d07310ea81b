use crate::signals::RiskSignalStore;
use crate::types::{CrimeEstimate, GeoPoint, SafetyScore};

/// Crime signals farther than this (in degrees, ~1 km at mid-latitudes) do
/// not contribute to a path point's exposure.
pub const CRIME_PROXIMITY_DEG: f64 = 0.01;

/// Lighting sources use a tighter reach (~500 m).
pub const LIGHTING_PROXIMITY_DEG: f64 = 0.005;

/// Lighting assumed for a path point with no known source nearby.
const BASELINE_LIGHTING: f64 = 0.5;

/// Fraction of the crime sub-score replaced by a remote estimate when one
/// is available.
pub const REMOTE_BLEND_WEIGHT: f64 = 0.4;

/// Scores a path against the signal store.
///
/// Deterministic for a given path and store; no randomness. An empty path
/// scores zero across the board.
///
/// Crime sub-score: each path point accumulates `weight * (1 - d*100)` from
/// every crime signal within [`CRIME_PROXIMITY_DEG`] (contributions sum,
/// modelling cumulative exposure); the per-point sums are averaged over the
/// path and mapped to a 0-100 safety value via `100 - avg*100`.
///
/// Lighting sub-score: each path point starts at the 0.5 baseline and is
/// raised to the floor of any lighting source within
/// [`LIGHTING_PROXIMITY_DEG`]; a known source never lowers a better
/// estimate. Averaged and scaled to 0-100.
pub fn score_route(path: &[GeoPoint], signals: &RiskSignalStore) -> SafetyScore {
    if path.is_empty() {
        return SafetyScore::zero();
    }

    let mut crime_exposure = 0.0;
    let mut lighting_total = 0.0;

    for point in path {
        let mut exposure = 0.0;
        for (dist, signal) in signals.crime_within(point, CRIME_PROXIMITY_DEG) {
            exposure += signal.weight * (1.0 - dist * 100.0);
        }
        crime_exposure += exposure;

        let mut lighting = BASELINE_LIGHTING;
        for (_dist, signal) in signals.lighting_within(point, LIGHTING_PROXIMITY_DEG) {
            lighting = lighting.max(signal.level.floor());
        }
        lighting_total += lighting;
    }

    let n = path.len() as f64;
    let crime = clamp_score(100.0 - (crime_exposure / n) * 100.0);
    let lighting = clamp_score((lighting_total / n) * 100.0);

    SafetyScore::compose(crime, lighting)
}

/// Folds a remote crime estimate into a locally computed score.
///
/// With no estimate the local score passes through untouched. Otherwise the
/// crime sub-score is re-weighted toward the remote safety score by
/// [`REMOTE_BLEND_WEIGHT`] and the overall score recomposed; lighting is
/// purely local and never changes. Returns a new value, never mutates
/// `local`.
pub fn blend(local: &SafetyScore, estimate: Option<&CrimeEstimate>) -> SafetyScore {
    let Some(estimate) = estimate else {
        return *local;
    };

    let crime = (f64::from(local.crime) * (1.0 - REMOTE_BLEND_WEIGHT)
        + f64::from(estimate.safety_score) * REMOTE_BLEND_WEIGHT)
        .round() as u8;
    SafetyScore::compose(crime, local.lighting)
}

fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}
