//! Geographic helpers for geofencing.
//!
//! Provides great-circle distances between WGS84 positions and the table of
//! fixed sites (depots) that a tracked vehicle can arrive at.

mod site;

pub use site::{NearestSite, Site, SiteTable};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;

/// Calculate the great-circle distance between two positions.
///
/// Uses the haversine formula, which stays accurate at the short distances
/// geofencing cares about.
///
/// # Arguments
///
/// * `from` - First position as (latitude, longitude) in degrees
/// * `to` - Second position as (latitude, longitude) in degrees
///
/// # Returns
///
/// Distance in meters.
///
/// # Example
///
/// ```
/// use fleettrack::geo::distance_m;
///
/// // One degree of latitude is roughly 111 km
/// let dist = distance_m((0.0, 0.0), (1.0, 0.0));
/// assert!((dist - 111_195.0).abs() < 1.0);
/// ```
pub fn distance_m(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let delta_lat = (lat2 - lat1) * DEG_TO_RAD;
    let delta_lng = (lng2 - lng1) * DEG_TO_RAD;

    // Rounding can push `a` just past 1 for near-antipodal points.
    let a = ((delta_lat / 2.0).sin().powi(2)
        + (lat1 * DEG_TO_RAD).cos() * (lat2 * DEG_TO_RAD).cos() * (delta_lng / 2.0).sin().powi(2))
    .min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_distance_same_point_is_zero() {
        assert_eq!(distance_m((-34.36, -59.0), (-34.36, -59.0)), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = (-34.3601, -59.0099);
        let b = (-34.5629, -58.5293);
        let ab = distance_m(a, b);
        let ba = distance_m(b, a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_distance_between_depots() {
        // Los Cardales to Villa Maipú is roughly 49 km
        let dist = distance_m(
            (-34.36014566238795, -59.00991328060013),
            (-34.56297844053954, -58.52935080773911),
        );
        assert!(dist > 45_000.0 && dist < 52_000.0, "got {dist}");
    }

    #[test]
    fn test_distance_short_hop() {
        // 0.0001 degrees in each axis at this latitude is ~14 m
        let dist = distance_m((-34.3601, -59.0099), (-34.3602, -59.0100));
        assert!(dist > 10.0 && dist < 20.0, "got {dist}");
    }

    proptest! {
        /// Property: distance is non-negative and symmetric.
        #[test]
        fn prop_distance_symmetric(
            lat1 in -89.0f64..89.0f64,
            lng1 in -180.0f64..180.0f64,
            lat2 in -89.0f64..89.0f64,
            lng2 in -180.0f64..180.0f64,
        ) {
            let ab = distance_m((lat1, lng1), (lat2, lng2));
            let ba = distance_m((lat2, lng2), (lat1, lng1));
            prop_assert!(ab >= 0.0);
            prop_assert!((ab - ba).abs() <= 1e-9 * ab.max(1.0));
        }

        /// Property: no two points are further apart than half the circumference.
        #[test]
        fn prop_distance_bounded(
            lat1 in -90.0f64..90.0f64,
            lng1 in -180.0f64..180.0f64,
            lat2 in -90.0f64..90.0f64,
            lng2 in -180.0f64..180.0f64,
        ) {
            let dist = distance_m((lat1, lng1), (lat2, lng2));
            prop_assert!(dist <= std::f64::consts::PI * EARTH_RADIUS_M + 1e-6);
        }
    }
}
