//! Great-circle distance on a spherical Earth.

use rtcc_geo_models::{Coordinate, HasCoordinate};

/// Mean Earth radius used by every distance computation, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Slack added to bounding boxes so floating-point error in the envelope
/// math never excludes a point the exact haversine check would accept.
const ENVELOPE_SLACK_DEG: f64 = 1e-9;

/// Great-circle distance between two coordinates using the haversine
/// formula.
///
/// No range checking is performed; out-of-range input still yields a
/// number.
#[must_use]
pub fn haversine_distance_km(a: &impl HasCoordinate, b: &impl HasCoordinate) -> f64 {
    let a = a.coordinate();
    let b = b.coordinate();

    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = b.longitude.to_radians() - a.longitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `h` just past 1.0 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Latitude/longitude envelope that fully encloses the circle of
/// `radius_km` around `center`.
///
/// Returns `(min, max)` corners. When the circle reaches a pole or crosses
/// the antimeridian the longitude span widens to the full -180..=180 range.
#[must_use]
pub fn bounding_box_km(center: &impl HasCoordinate, radius_km: f64) -> (Coordinate, Coordinate) {
    let center = center.coordinate();
    let angular = radius_km / EARTH_RADIUS_KM;
    let d_lat = angular.to_degrees() + ENVELOPE_SLACK_DEG;

    let min_lat = center.latitude - d_lat;
    let max_lat = center.latitude + d_lat;

    if min_lat <= -90.0 || max_lat >= 90.0 || angular >= std::f64::consts::FRAC_PI_2 {
        return (
            Coordinate::new(min_lat.max(-90.0), -180.0),
            Coordinate::new(max_lat.min(90.0), 180.0),
        );
    }

    let ratio = angular.sin() / center.latitude.to_radians().cos();
    if ratio >= 1.0 {
        return (
            Coordinate::new(min_lat, -180.0),
            Coordinate::new(max_lat, 180.0),
        );
    }

    let d_lon = ratio.asin().to_degrees() + ENVELOPE_SLACK_DEG;
    let min_lon = center.longitude - d_lon;
    let max_lon = center.longitude + d_lon;

    if min_lon < -180.0 || max_lon > 180.0 {
        return (
            Coordinate::new(min_lat, -180.0),
            Coordinate::new(max_lat, 180.0),
        );
    }

    (
        Coordinate::new(min_lat, min_lon),
        Coordinate::new(max_lat, max_lon),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> Vec<Coordinate> {
        vec![
            Coordinate::new(26.7753, -80.0589),
            Coordinate::new(26.7912, -80.0345),
            Coordinate::new(38.8951, -77.0364),
            Coordinate::new(41.8827, -87.6278),
            Coordinate::new(-33.8688, 151.2093),
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 180.0),
            Coordinate::new(89.9, 45.0),
        ]
    }

    #[test]
    fn identity_is_exactly_zero() {
        for a in samples() {
            assert_eq!(haversine_distance_km(&a, &a).to_bits(), 0.0_f64.to_bits());
        }
    }

    #[test]
    fn distance_is_symmetric() {
        for a in samples() {
            for b in samples() {
                let ab = haversine_distance_km(&a, &b);
                let ba = haversine_distance_km(&b, &a);
                assert_eq!(
                    ab.to_bits(),
                    ba.to_bits(),
                    "asymmetric distance between {a:?} and {b:?}: {ab} vs {ba}"
                );
            }
        }
    }

    #[test]
    fn triangle_inequality_holds() {
        let points = samples();
        for a in &points {
            for b in &points {
                for c in &points {
                    let ac = haversine_distance_km(a, c);
                    let via = haversine_distance_km(a, b) + haversine_distance_km(b, c);
                    assert!(
                        ac <= via + 1e-9 * via.max(1.0),
                        "triangle inequality violated for {a:?} {b:?} {c:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn known_distances() {
        let dc = Coordinate::new(38.8951, -77.0364);
        let chicago = Coordinate::new(41.8827, -87.6278);
        let d = haversine_distance_km(&dc, &chicago);
        assert!((d - 955.75).abs() < 0.01, "DC to Chicago was {d} km");

        let equator_a = Coordinate::new(0.0, 0.0);
        let equator_b = Coordinate::new(0.0, 1.0);
        let one_degree = EARTH_RADIUS_KM.to_radians();
        assert!((haversine_distance_km(&equator_a, &equator_b) - one_degree).abs() < 1e-9);
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let d = haversine_distance_km(&a, &b);
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_input_still_computes() {
        let a = Coordinate::new(120.0, 400.0);
        let b = Coordinate::new(0.0, 0.0);
        assert!(haversine_distance_km(&a, &b).is_finite());
    }

    #[test]
    fn bounding_box_encloses_circle() {
        let center = Coordinate::new(26.78, -80.05);
        let (min, max) = bounding_box_km(&center, 2.0);
        assert!(min.latitude < center.latitude && max.latitude > center.latitude);
        assert!(min.longitude < center.longitude && max.longitude > center.longitude);

        let east = Coordinate::new(center.latitude, max.longitude);
        assert!(haversine_distance_km(&center, &east) >= 2.0 - 1e-6);
        let north = Coordinate::new(max.latitude, center.longitude);
        assert!(haversine_distance_km(&center, &north) >= 2.0 - 1e-6);
    }

    #[test]
    fn bounding_box_widens_near_pole_and_antimeridian() {
        let (min, max) = bounding_box_km(&Coordinate::new(89.99, 10.0), 5.0);
        assert_eq!(min.longitude, -180.0);
        assert_eq!(max.longitude, 180.0);
        assert_eq!(max.latitude, 90.0);

        let (min, max) = bounding_box_km(&Coordinate::new(10.0, 179.99), 5.0);
        assert_eq!(min.longitude, -180.0);
        assert_eq!(max.longitude, 180.0);
    }
}
