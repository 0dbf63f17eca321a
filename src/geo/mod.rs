use serde::{Deserialize, Serialize};

use crate::models::coordinate::Coordinate;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Flat 20 km/h heuristic, no routing involved.
pub const MINUTES_PER_KM: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    pub distance_km: f64,
    pub eta_minutes: i64,
}

pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude().to_radians();
    let lat2 = b.latitude().to_radians();
    let delta_lat = (b.latitude() - a.latitude()).to_radians();
    let delta_lng = (b.longitude() - a.longitude()).to_radians();

    let sin_lat = (delta_lat / 2.0).sin();
    let sin_lng = (delta_lng / 2.0).sin();

    let haversine = sin_lat * sin_lat + lat1.cos() * lat2.cos() * sin_lng * sin_lng;
    let central_angle = 2.0 * haversine.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * central_angle
}

/// Great-circle distance rounded to one decimal.
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    round_to(haversine_km(a, b), 1)
}

pub fn estimate(from: &Coordinate, to: &Coordinate) -> Estimate {
    let eta_minutes = (distance_km(from, to) * MINUTES_PER_KM).round() as i64;

    Estimate {
        distance_km: round_to(haversine_km(from, to), 2),
        eta_minutes,
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::{distance_km, estimate, haversine_km};
    use crate::models::coordinate::Coordinate;

    fn point(lat: f64, lng: f64) -> Coordinate {
        Coordinate::new(lat, lng).unwrap()
    }

    fn samples() -> Vec<Coordinate> {
        vec![
            point(13.0827, 80.2707),
            point(12.9716, 77.5946),
            point(51.5074, -0.1278),
            point(48.8566, 2.3522),
            point(-33.8688, 151.2093),
            point(0.0, 0.0),
            point(89.9, -179.9),
        ]
    }

    #[test]
    fn zero_distance_for_same_point() {
        let p = point(53.5511, 9.9937);
        assert!(haversine_km(&p, &p) < 1e-9);
        assert_eq!(distance_km(&p, &p), 0.0);
    }

    #[test]
    fn london_to_paris_is_around_343_km() {
        let distance = haversine_km(&point(51.5074, -0.1278), &point(48.8566, 2.3522));
        assert!((distance - 343.0).abs() < 5.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let points = samples();
        for a in &points {
            for b in &points {
                assert_eq!(distance_km(a, b), distance_km(b, a));
            }
        }
    }

    #[test]
    fn distance_respects_triangle_inequality() {
        let points = samples();
        for a in &points {
            for b in &points {
                for c in &points {
                    assert!(distance_km(a, c) <= distance_km(a, b) + distance_km(b, c) + 0.2);
                }
            }
        }
    }

    #[test]
    fn chennai_to_bengaluru_estimate() {
        let chennai = point(13.0827, 80.2707);
        let bengaluru = point(12.9716, 77.5946);

        let result = estimate(&chennai, &bengaluru);
        assert!((result.distance_km - 290.0).abs() <= 2.0);
        assert!((result.eta_minutes - 870).abs() <= 6);
    }

    #[test]
    fn eta_is_three_minutes_per_rounded_kilometre() {
        let points = samples();
        for a in &points {
            for b in &points {
                let expected = (distance_km(a, b) * 3.0).round() as i64;
                assert_eq!(estimate(a, b).eta_minutes, expected);
            }
        }
    }

    #[test]
    fn estimate_distance_has_two_decimals() {
        let result = estimate(&point(10.0, 10.0), &point(10.5, 10.5));
        let scaled = result.distance_km * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    #[test]
    fn eta_rounds_from_one_decimal_distance_not_the_returned_one() {
        // ~0.160 km along a meridian: 0.2 km at one decimal, 0.16 at two
        let result = estimate(&point(0.0, 0.0), &point(0.00144, 0.0));
        assert_eq!(result.distance_km, 0.16);
        assert_eq!(distance_km(&point(0.0, 0.0), &point(0.00144, 0.0)), 0.2);
        assert_eq!(result.eta_minutes, 1);
        assert_eq!((result.distance_km * 3.0).round() as i64, 0);
    }
}
