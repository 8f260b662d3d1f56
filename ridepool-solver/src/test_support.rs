//! Test-only request and waypoint generators for `ridepool-solver`.
//!
//! The helpers are available to unit tests, behaviour tests and benches.
//! They are gated behind the `test-support` feature (and `cfg(test)`).

use chrono::{DateTime, TimeDelta, Utc};
use geo::Coord;
use ridepool_core::test_support::{AIRPORT, BUSINESS, DOWNTOWN, RESIDENTIAL, RETAIL, dropoff, pickup};
use ridepool_core::{RideRequest, Waypoint};

/// Zone centroids visited in turn by the generators.
pub const CENTROIDS: [Coord<f64>; 5] = [DOWNTOWN, AIRPORT, BUSINESS, RESIDENTIAL, RETAIL];

/// Offset between successive points around the same centroid, in degrees.
const STEP_DEGREES: f64 = 0.0015;

/// `count` requests spread over the zone centroids, one minute apart.
///
/// Request `i` has id `req_{i}` and passenger `pass_{i}`.
///
/// # Examples
/// ```rust
/// use ridepool_solver::test_support::request_batch;
/// use ridepool_core::test_support::instant;
///
/// let batch = request_batch(7, instant(9, 0));
/// assert_eq!(batch.len(), 7);
/// assert_eq!(batch[6].passenger_id, "pass_6");
/// ```
#[must_use]
pub fn request_batch(count: usize, at: DateTime<Utc>) -> Vec<RideRequest> {
    spread(count)
        .map(|(step, location)| {
            RideRequest::new(
                format!("req_{step}"),
                format!("pass_{step}"),
                location,
                at + TimeDelta::minutes(i64::from(step)),
            )
        })
        .collect()
}

/// `trips` pickup and dropoff pairs, pickups first.
///
/// Passenger `i` is `p{i}` and travels to the centroid after its pickup's.
#[must_use]
pub fn trip_waypoints(trips: usize, at: DateTime<Utc>) -> Vec<Waypoint> {
    let legs: Vec<(String, Coord<f64>, Coord<f64>)> = spread(trips)
        .zip(CENTROIDS.iter().cycle().skip(1))
        .map(|((step, from), to)| (format!("p{step}"), from, *to))
        .collect();
    let pickups = legs.iter().map(|(passenger, from, _)| pickup(passenger, *from, at));
    let dropoffs = legs.iter().map(|(passenger, _, to)| dropoff(passenger, *to, at));
    pickups.chain(dropoffs).collect()
}

/// Points cycling through [`CENTROIDS`], each lap pushed a little further
/// north-east.
fn spread(count: usize) -> impl Iterator<Item = (u32, Coord<f64>)> {
    (0_u32..)
        .zip(CENTROIDS.iter().cycle())
        .take(count)
        .scan(0.0_f64, |offset, (step, centroid)| {
            if step > 0 && centroid == &DOWNTOWN {
                *offset += STEP_DEGREES;
            }
            Some((
                step,
                Coord {
                    x: centroid.x + *offset,
                    y: centroid.y + *offset,
                },
            ))
        })
}
