use crate::types::{GeoPoint, RouteCandidate, SafetyScore};

/// Fixed interpolation fractions for the three intermediate waypoints.
const WAYPOINT_FRACTIONS: [f64; 3] = [0.25, 0.5, 0.75];

/// Per-slot (lat, lng) degree perturbations applied to every waypoint of
/// that candidate. Pairwise distinct, so the three paths never coincide.
const SLOT_OFFSETS: [(f64, f64); 3] = [
    (0.0008, -0.0005),
    (-0.0012, 0.0009),
    (0.0015, 0.0013),
];

/// Display metadata per candidate slot. Durations and distances are
/// placeholders, not derived from the synthetic geometry; slot 0 is the
/// caller's default selection.
const SLOT_LABELS: [(&str, &str, &str, &str); 3] = [
    ("route-1", "Recommended Route", "18 min", "1.4 km"),
    ("route-2", "Alternative Route 1", "22 min", "1.7 km"),
    ("route-3", "Alternative Route 2", "25 min", "1.9 km"),
];

/// Synthesizes three alternative paths between `origin` and `destination`.
///
/// A missing endpoint is a normal outcome (the user has not picked both
/// points yet) and yields an empty list, not an error. Each returned path
/// starts at `origin` and ends at `destination` exactly, with three
/// perturbed waypoints in between. Pure function; candidates come back
/// unscored (`SafetyScore::zero`, no crime data).
pub fn generate_candidates(
    origin: Option<GeoPoint>,
    destination: Option<GeoPoint>,
) -> Vec<RouteCandidate> {
    let (Some(origin), Some(destination)) = (origin, destination) else {
        return Vec::new();
    };

    SLOT_LABELS
        .iter()
        .zip(SLOT_OFFSETS.iter())
        .map(|(&(id, name, duration, distance), &(lat_off, lng_off))| {
            let mut path = Vec::with_capacity(WAYPOINT_FRACTIONS.len() + 2);
            path.push(origin);
            for fraction in WAYPOINT_FRACTIONS {
                path.push(GeoPoint::new(
                    origin.lat + (destination.lat - origin.lat) * fraction + lat_off,
                    origin.lng + (destination.lng - origin.lng) * fraction + lng_off,
                ));
            }
            path.push(destination);

            RouteCandidate {
                id: id.to_string(),
                name: name.to_string(),
                duration: duration.to_string(),
                distance: distance.to_string(),
                path,
                safety_score: SafetyScore::zero(),
                crime_data: None,
            }
        })
        .collect()
}
