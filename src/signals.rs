use geo::Point;
use geo::prelude::*;
use lazy_static::lazy_static;
use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::types::{
    CrimeSignalPoint, GeoPoint, LightLevel, LightingSignalPoint, ServiceCategory,
    ServiceSignalPoint,
};

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Immutable collection of the three risk signal layers, indexed for radius
/// queries in coordinate-degree space.
///
/// The store is passed explicitly into the scorer so tests can substitute
/// fixture data; nothing in the scoring pipeline reads global state.
pub struct RiskSignalStore {
    crime: Vec<CrimeSignalPoint>,
    lighting: Vec<LightingSignalPoint>,
    services: Vec<ServiceSignalPoint>,
    crime_index: RTree<IndexedPoint>,
    lighting_index: RTree<IndexedPoint>,
}

impl RiskSignalStore {
    /// Builds a store from raw signal records. Malformed records (non-finite
    /// coordinates, crime weight outside [0,1]) are dropped with a warning
    /// rather than poisoning the scoring pipeline.
    pub fn new(
        crime: Vec<CrimeSignalPoint>,
        lighting: Vec<LightingSignalPoint>,
        services: Vec<ServiceSignalPoint>,
    ) -> Self {
        let crime: Vec<_> = crime
            .into_iter()
            .filter(|c| {
                let ok = finite(&c.location) && (0.0..=1.0).contains(&c.weight);
                if !ok {
                    log::warn!(
                        "dropping malformed crime signal at ({}, {}) weight {}",
                        c.location.lat,
                        c.location.lng,
                        c.weight
                    );
                }
                ok
            })
            .collect();
        let lighting: Vec<_> = lighting
            .into_iter()
            .filter(|l| {
                let ok = finite(&l.location);
                if !ok {
                    log::warn!("dropping lighting signal with non-finite coordinates");
                }
                ok
            })
            .collect();

        let crime_index = RTree::bulk_load(
            crime
                .iter()
                .enumerate()
                .map(|(i, c)| IndexedPoint::new([c.location.lat, c.location.lng], i))
                .collect(),
        );
        let lighting_index = RTree::bulk_load(
            lighting
                .iter()
                .enumerate()
                .map(|(i, l)| IndexedPoint::new([l.location.lat, l.location.lng], i))
                .collect(),
        );

        Self {
            crime,
            lighting,
            services,
            crime_index,
            lighting_index,
        }
    }

    /// Crime signals within `radius_deg` of `point`, with their degree
    /// distances. `locate_within_distance` takes a squared radius, matching
    /// the scorer's Euclidean-degree metric.
    pub fn crime_within(
        &self,
        point: &GeoPoint,
        radius_deg: f64,
    ) -> impl Iterator<Item = (f64, &CrimeSignalPoint)> {
        let center = *point;
        self.crime_index
            .locate_within_distance([point.lat, point.lng], radius_deg * radius_deg)
            .map(move |hit| {
                let signal = &self.crime[hit.data];
                (center.degree_distance(&signal.location), signal)
            })
    }

    /// Lighting signals within `radius_deg` of `point`.
    pub fn lighting_within(
        &self,
        point: &GeoPoint,
        radius_deg: f64,
    ) -> impl Iterator<Item = (f64, &LightingSignalPoint)> {
        let center = *point;
        self.lighting_index
            .locate_within_distance([point.lat, point.lng], radius_deg * radius_deg)
            .map(move |hit| {
                let signal = &self.lighting[hit.data];
                (center.degree_distance(&signal.location), signal)
            })
    }

    /// The `n` closest emergency-service points, with haversine distances in
    /// meters. Used to list nearby police/hospital/fire stations alongside a
    /// scored route.
    pub fn nearest_services(&self, point: &GeoPoint, n: usize) -> Vec<(f64, &ServiceSignalPoint)> {
        let target = Point::new(point.lng, point.lat);
        let mut ranked: Vec<(f64, &ServiceSignalPoint)> = self
            .services
            .iter()
            .map(|s| {
                let p = Point::new(s.location.lng, s.location.lat);
                (p.haversine_distance(&target), s)
            })
            .collect();
        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(n);
        ranked
    }

    pub fn crime_signals(&self) -> &[CrimeSignalPoint] {
        &self.crime
    }

    pub fn lighting_signals(&self) -> &[LightingSignalPoint] {
        &self.lighting
    }

    pub fn service_signals(&self) -> &[ServiceSignalPoint] {
        &self.services
    }

    /// The built-in San Francisco dataset.
    pub fn default_dataset() -> &'static RiskSignalStore {
        &DEFAULT_STORE
    }
}

fn finite(p: &GeoPoint) -> bool {
    p.lat.is_finite() && p.lng.is_finite()
}

lazy_static! {
    static ref DEFAULT_STORE: RiskSignalStore = RiskSignalStore::new(
        vec![
            // Tenderloin / Civic Center
            CrimeSignalPoint { location: GeoPoint::new(37.7835, -122.4134), weight: 0.9 },
            CrimeSignalPoint { location: GeoPoint::new(37.7790, -122.4177), weight: 0.8 },
            // SoMa / 6th Street
            CrimeSignalPoint { location: GeoPoint::new(37.7786, -122.4056), weight: 0.7 },
            CrimeSignalPoint { location: GeoPoint::new(37.7749, -122.4094), weight: 0.6 },
            // Mission / 16th St BART
            CrimeSignalPoint { location: GeoPoint::new(37.7648, -122.4194), weight: 0.6 },
            // Bayview
            CrimeSignalPoint { location: GeoPoint::new(37.7299, -122.3893), weight: 0.7 },
        ],
        vec![
            LightingSignalPoint { location: GeoPoint::new(37.7879, -122.4075), level: LightLevel::High },
            LightingSignalPoint { location: GeoPoint::new(37.7765, -122.3942), level: LightLevel::High },
            LightingSignalPoint { location: GeoPoint::new(37.7835, -122.4134), level: LightLevel::Low },
            LightingSignalPoint { location: GeoPoint::new(37.7648, -122.4194), level: LightLevel::Medium },
            LightingSignalPoint { location: GeoPoint::new(37.7595, -122.4271), level: LightLevel::Medium },
            LightingSignalPoint { location: GeoPoint::new(37.7299, -122.3893), level: LightLevel::Low },
        ],
        vec![
            ServiceSignalPoint {
                location: GeoPoint::new(37.7837, -122.4128),
                category: ServiceCategory::Police,
                name: "Tenderloin Police Station".to_string(),
            },
            ServiceSignalPoint {
                location: GeoPoint::new(37.7725, -122.3892),
                category: ServiceCategory::Police,
                name: "Southern Police Station".to_string(),
            },
            ServiceSignalPoint {
                location: GeoPoint::new(37.7632, -122.4576),
                category: ServiceCategory::Hospital,
                name: "UCSF Medical Center".to_string(),
            },
            ServiceSignalPoint {
                location: GeoPoint::new(37.7558, -122.4050),
                category: ServiceCategory::Hospital,
                name: "Zuckerberg San Francisco General".to_string(),
            },
            ServiceSignalPoint {
                location: GeoPoint::new(37.7770, -122.4102),
                category: ServiceCategory::FireStation,
                name: "SFFD Station 36".to_string(),
            },
        ],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_one_crime_point() -> RiskSignalStore {
        RiskSignalStore::new(
            vec![CrimeSignalPoint {
                location: GeoPoint::new(37.774, -122.419),
                weight: 0.8,
            }],
            vec![],
            vec![],
        )
    }

    #[test]
    fn radius_query_includes_only_points_in_range() {
        let store = store_with_one_crime_point();
        let near = GeoPoint::new(37.774, -122.415);
        let far = GeoPoint::new(37.9, -122.419);

        assert_eq!(store.crime_within(&near, 0.01).count(), 1);
        assert_eq!(store.crime_within(&far, 0.01).count(), 0);
    }

    #[test]
    fn radius_query_reports_degree_distance() {
        let store = store_with_one_crime_point();
        let probe = GeoPoint::new(37.774, -122.414);
        let (dist, signal) = store.crime_within(&probe, 0.01).next().unwrap();
        assert!((dist - 0.005).abs() < 1e-9);
        assert!((signal.weight - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_records_are_dropped_at_construction() {
        let store = RiskSignalStore::new(
            vec![
                CrimeSignalPoint {
                    location: GeoPoint::new(37.774, -122.419),
                    weight: 1.7, // out of range
                },
                CrimeSignalPoint {
                    location: GeoPoint::new(f64::NAN, -122.419),
                    weight: 0.5,
                },
                CrimeSignalPoint {
                    location: GeoPoint::new(37.776, -122.417),
                    weight: 0.5,
                },
            ],
            vec![LightingSignalPoint {
                location: GeoPoint::new(f64::INFINITY, 0.0),
                level: LightLevel::High,
            }],
            vec![],
        );
        assert_eq!(store.crime_signals().len(), 1);
        assert!(store.lighting_signals().is_empty());
    }

    #[test]
    fn nearest_services_ranks_by_ground_distance() {
        let store = RiskSignalStore::new(
            vec![],
            vec![],
            vec![
                ServiceSignalPoint {
                    location: GeoPoint::new(37.80, -122.419),
                    category: ServiceCategory::Hospital,
                    name: "Far Hospital".to_string(),
                },
                ServiceSignalPoint {
                    location: GeoPoint::new(37.775, -122.419),
                    category: ServiceCategory::Police,
                    name: "Near Station".to_string(),
                },
            ],
        );
        let ranked = store.nearest_services(&GeoPoint::new(37.774, -122.419), 2);
        assert_eq!(ranked[0].1.name, "Near Station");
        assert_eq!(ranked[1].1.name, "Far Hospital");
        assert!(ranked[0].0 < ranked[1].0);
    }

    #[test]
    fn default_dataset_is_well_formed() {
        let store = RiskSignalStore::default_dataset();
        assert!(!store.crime_signals().is_empty());
        assert!(!store.lighting_signals().is_empty());
        assert!(!store.service_signals().is_empty());
        assert!(
            store
                .crime_signals()
                .iter()
                .all(|c| (0.0..=1.0).contains(&c.weight))
        );
    }
}
