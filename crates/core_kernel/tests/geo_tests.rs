//! Distance and radius tests

use core_kernel::{haversine_km, GeoPoint};
use proptest::prelude::*;

fn waterloo() -> GeoPoint {
    GeoPoint::new(43.4643, -80.5204).unwrap()
}

fn kitchener() -> GeoPoint {
    GeoPoint::new(43.4516, -80.4925).unwrap()
}

fn toronto() -> GeoPoint {
    GeoPoint::new(43.6532, -79.3832).unwrap()
}

#[test]
fn test_known_distance_waterloo_toronto() {
    let d = haversine_km(waterloo(), toronto());
    assert!((d - 94.0).abs() < 3.0, "distance was {}", d);
}

#[test]
fn test_neighbouring_cities_within_five_km() {
    assert!(waterloo().within_radius(&kitchener(), 5.0));
    assert!(!waterloo().within_radius(&toronto(), 5.0));
}

#[test]
fn test_antipodal_points() {
    let a = GeoPoint::new(0.0, 0.0).unwrap();
    let b = GeoPoint::new(0.0, 180.0).unwrap();
    let d = haversine_km(a, b);
    assert!((d - std::f64::consts::PI * 6371.0).abs() < 1e-6);
}

fn point() -> impl Strategy<Value = GeoPoint> {
    (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| GeoPoint { lat, lng })
}

proptest! {
    #[test]
    fn prop_distance_is_symmetric(a in point(), b in point()) {
        let ab = haversine_km(a, b);
        let ba = haversine_km(b, a);
        prop_assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn prop_distance_is_bounded(a in point(), b in point()) {
        let d = haversine_km(a, b);
        prop_assert!(d >= 0.0);
        prop_assert!(d <= std::f64::consts::PI * 6371.0 + 1e-6);
    }

    #[test]
    fn prop_radius_is_monotonic(a in point(), b in point(), r in 0.0f64..5000.0, extra in 0.0f64..5000.0) {
        if a.within_radius(&b, r) {
            prop_assert!(a.within_radius(&b, r + extra));
        }
    }
}
