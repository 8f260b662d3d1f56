//! Great-circle geometry over WGS84 coordinates.
//!
//! Coordinates follow the `geo` convention: `x` is longitude and `y` is
//! latitude, both in degrees. Distances are reported in statute miles.

use geo::Coord;

/// Earth radius used by every distance in the engine, in miles.
pub const EARTH_RADIUS_MILES: f64 = 3956.0;

/// Great-circle distance between two points in miles.
///
/// Uses the haversine formula. The result is symmetric and exactly zero for
/// identical points. Non-finite input yields a non-finite result; callers
/// validate coordinates with [`is_finite_coord`] first.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use ridepool_core::haversine_miles;
///
/// let downtown = Coord { x: -94.209, y: 36.373 };
/// let airport = Coord { x: -94.220, y: 36.385 };
/// let miles = haversine_miles(downtown, airport);
/// assert!(miles > 0.9 && miles < 1.1);
/// assert_eq!(haversine_miles(downtown, downtown), 0.0);
/// ```
#[must_use]
pub fn haversine_miles(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let lat_a = a.y.to_radians();
    let lat_b = b.y.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lng = (b.x - a.x).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push `h` marginally past 1.0 for antipodal points.
    2.0 * h.clamp(0.0, 1.0).sqrt().asin() * EARTH_RADIUS_MILES
}

/// Arithmetic midpoint of two coordinates.
///
/// Adequate for the short urban legs the engine deals with; it is not the
/// great-circle midpoint.
#[must_use]
pub fn midpoint(a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    Coord {
        x: (a.x + b.x) / 2.0,
        y: (a.y + b.y) / 2.0,
    }
}

/// Return `true` when both components are finite and inside WGS84 bounds.
#[must_use]
pub fn is_finite_coord(c: Coord<f64>) -> bool {
    c.x.is_finite() && c.y.is_finite() && (-180.0..=180.0).contains(&c.x) && (-90.0..=90.0).contains(&c.y)
}

/// Sum of haversine distances between consecutive points.
#[must_use]
pub fn path_miles<I>(points: I) -> f64
where
    I: IntoIterator<Item = Coord<f64>>,
{
    let mut total = 0.0;
    let mut previous: Option<Coord<f64>> = None;
    for point in points {
        if let Some(prev) = previous {
            total += haversine_miles(prev, point);
        }
        previous = Some(point);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Coord { x: 0.0, y: 0.0 })]
    #[case(Coord { x: -94.209, y: 36.373 })]
    #[case(Coord { x: 179.9, y: -89.0 })]
    fn distance_to_self_is_zero(#[case] point: Coord<f64>) {
        assert_eq!(haversine_miles(point, point), 0.0);
    }

    #[rstest]
    #[case(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 1.0 })]
    #[case(Coord { x: -94.209, y: 36.373 }, Coord { x: -94.195, y: 36.380 })]
    #[case(Coord { x: 10.0, y: 50.0 }, Coord { x: -3.0, y: -20.0 })]
    fn distance_is_symmetric(#[case] a: Coord<f64>, #[case] b: Coord<f64>) {
        assert_eq!(haversine_miles(a, b), haversine_miles(b, a));
    }

    #[rstest]
    fn one_degree_of_latitude_matches_radius() {
        let miles = haversine_miles(Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 1.0 });
        let expected = EARTH_RADIUS_MILES * 1.0_f64.to_radians();
        assert!((miles - expected).abs() < 1e-9);
    }

    #[rstest]
    fn path_sums_consecutive_legs() {
        let a = Coord { x: 0.0, y: 0.0 };
        let b = Coord { x: 0.0, y: 1.0 };
        let c = Coord { x: 1.0, y: 1.0 };
        let total = path_miles([a, b, c]);
        let expected = haversine_miles(a, b) + haversine_miles(b, c);
        assert!((total - expected).abs() < 1e-9);
        assert_eq!(path_miles([a]), 0.0);
        assert_eq!(path_miles(std::iter::empty()), 0.0);
    }

    #[rstest]
    #[case(Coord { x: f64::NAN, y: 0.0 }, false)]
    #[case(Coord { x: 0.0, y: f64::INFINITY }, false)]
    #[case(Coord { x: 0.0, y: 91.0 }, false)]
    #[case(Coord { x: -94.2, y: 36.3 }, true)]
    fn finite_coordinate_check(#[case] point: Coord<f64>, #[case] expected: bool) {
        assert_eq!(is_finite_coord(point), expected);
    }
}
