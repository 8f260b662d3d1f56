//! Ranking groups of requests that could share a vehicle.
//!
//! Every combination of two up to `max_pool_passengers` requests is scored;
//! enumeration is exponential in the number of requests, so callers bucket
//! requests (same zone, same time slot) before matching.

use geo::Coord;
use itertools::Itertools;
use ridepool_core::{
    EngineConfig, OptimizationError, PoolMatch, RideRequest, Waypoint,
    ZoneSpeedEstimator, haversine_miles, is_finite_coord, path_miles,
};

use crate::sequencer::nearest_neighbor_order;

/// Weight of geometric overlap in the compatibility score.
pub const OVERLAP_WEIGHT: f64 = 0.6;
/// Weight of pickup-window alignment in the compatibility score.
pub const ALIGNMENT_WEIGHT: f64 = 0.4;

/// The signals behind a compatibility score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Compatibility {
    /// `1 − widest pickup spread / max spread`, in `[0, 1]`.
    pub pickup_proximity: f64,
    /// Mean pairwise heading agreement, when every request has a destination.
    pub heading_alignment: Option<f64>,
    /// Shared share of the pickup windows, in `[0, 1]`.
    pub window_alignment: f64,
    /// Widest distance between two pickups, in miles.
    pub max_pickup_spread_miles: f64,
}

impl Compatibility {
    /// Pickup proximity, averaged with heading alignment when known.
    #[must_use]
    pub fn overlap(&self) -> f64 {
        self.heading_alignment
            .map_or(self.pickup_proximity, |heading| {
                (self.pickup_proximity + heading) / 2.0
            })
    }

    /// Weighted score in `[0, 1]`.
    ///
    /// Zero when the pickup windows share no time, however close the
    /// pickups are.
    #[must_use]
    pub fn score(&self) -> f64 {
        if self.window_alignment <= 0.0 {
            return 0.0;
        }
        (OVERLAP_WEIGHT * self.overlap() + ALIGNMENT_WEIGHT * self.window_alignment).clamp(0.0, 1.0)
    }

    fn reasoning(&self) -> String {
        let heading = self
            .heading_alignment
            .map_or_else(|| "headings unknown".to_owned(), |h| format!("heading alignment {h:.2}"));
        format!(
            "pickups within {spread:.2} mi, {heading}, pickup windows {window:.0}% aligned",
            spread = self.max_pickup_spread_miles,
            window = self.window_alignment * 100.0,
        )
    }
}

/// Scores and ranks pooling candidates.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use chrono::Utc;
/// use geo::Coord;
/// use ridepool_core::{EngineConfig, RideRequest, ZoneSpeedEstimator};
/// use ridepool_solver::PoolMatcher;
///
/// let config = Arc::new(EngineConfig::default());
/// let travel = ZoneSpeedEstimator::new(Arc::clone(&config));
/// let now = Utc::now();
/// let requests = [
///     RideRequest::new("a", "pa", Coord { x: -94.209, y: 36.373 }, now),
///     RideRequest::new("b", "pb", Coord { x: -94.208, y: 36.374 }, now),
/// ];
/// let matches = PoolMatcher::new(&config, &travel).find_matches(&requests, 5)?;
/// assert_eq!(matches.len(), 1);
/// assert_eq!(matches[0].match_id, "pool-pa-pb");
/// # Ok::<(), ridepool_core::OptimizationError>(())
/// ```
#[derive(Debug)]
pub struct PoolMatcher<'a> {
    config: &'a EngineConfig,
    travel: &'a ZoneSpeedEstimator,
}

impl<'a> PoolMatcher<'a> {
    /// Matcher over borrowed engine components.
    #[must_use]
    pub const fn new(config: &'a EngineConfig, travel: &'a ZoneSpeedEstimator) -> Self {
        Self { config, travel }
    }

    /// Up to `max_matches` groups scoring at least the configured minimum,
    /// best first.
    ///
    /// Groups are enumerated by size, then in lexicographic index order;
    /// equal scores keep that order.
    ///
    /// # Errors
    /// Returns [`OptimizationError::NonFiniteCoordinate`] when a request has
    /// an unusable pickup or dropoff.
    pub fn find_matches(
        &self,
        requests: &[RideRequest],
        max_matches: usize,
    ) -> Result<Vec<PoolMatch>, OptimizationError> {
        for request in requests {
            let dropoff_ok = request.dropoff.is_none_or(is_finite_coord);
            if !is_finite_coord(request.pickup) || !dropoff_ok {
                return Err(OptimizationError::non_finite(request.id.as_str()));
            }
        }
        if requests.len() < 2 || max_matches == 0 {
            return Ok(Vec::new());
        }

        let largest = self.config.max_pool_passengers.min(requests.len());
        let mut matches = Vec::new();
        for size in 2..=largest {
            for group in requests.iter().combinations(size) {
                let compatibility = self.compatibility(&group);
                if compatibility.score() >= self.config.min_pool_compatibility {
                    matches.push(self.build_match(&group, &compatibility));
                }
            }
        }
        matches.sort_by(|a, b| b.compatibility_score.total_cmp(&a.compatibility_score));
        matches.truncate(max_matches);
        log::debug!(
            "{} pool candidates from {} requests",
            matches.len(),
            requests.len()
        );
        Ok(matches)
    }

    /// Score one group of requests.
    #[must_use]
    pub fn compatibility(&self, group: &[&RideRequest]) -> Compatibility {
        let spread = group
            .iter()
            .tuple_combinations()
            .map(|(a, b)| haversine_miles(a.pickup, b.pickup))
            .fold(0.0, f64::max);
        let limit = self.config.max_pickup_spread_miles;
        let pickup_proximity = if limit > 0.0 {
            (1.0 - spread / limit).clamp(0.0, 1.0)
        } else if spread > 0.0 {
            0.0
        } else {
            1.0
        };

        Compatibility {
            pickup_proximity,
            heading_alignment: heading_alignment(group),
            window_alignment: self.window_alignment(group),
            max_pickup_spread_miles: spread,
        }
    }

    fn window_alignment(&self, group: &[&RideRequest]) -> f64 {
        let mut windows = group.iter().map(|request| request.pickup_window(self.config));
        let Some(first) = windows.next() else {
            return 0.0;
        };
        let full = first.length_minutes();
        let shared = windows.try_fold(first, |acc, window| acc.intersect(&window));
        match shared {
            None => 0.0,
            Some(_) if full <= 0.0 => 1.0,
            Some(window) => (window.length_minutes() / full).clamp(0.0, 1.0),
        }
    }

    fn build_match(&self, group: &[&RideRequest], compatibility: &Compatibility) -> PoolMatch {
        let pickups: Vec<Waypoint> = group
            .iter()
            .map(|request| request.pickup_waypoint(self.config))
            .collect();
        let pickup_sequence = visit_nearest_first(&pickups, |first| first.location);

        let dropoffs: Vec<Waypoint> = group
            .iter()
            .filter_map(|request| {
                let dropoff = request.dropoff?;
                let trip = self.travel.base_minutes(request.pickup, dropoff);
                request.dropoff_waypoint(self.config, trip)
            })
            .collect();
        let last_pickup = pickup_sequence.last().map(|w| w.location);
        let dropoff_sequence = visit_nearest_first(&dropoffs, |first| {
            last_pickup.unwrap_or(first.location)
        });

        let path: Vec<Coord<f64>> = pickup_sequence
            .iter()
            .chain(&dropoff_sequence)
            .map(|w| w.location)
            .collect();
        let shared_distance_miles = path_miles(path.iter().copied());
        let travel_minutes: f64 = path
            .iter()
            .tuple_windows()
            .map(|(a, b)| self.travel.base_minutes(*a, *b))
            .sum();
        let service_minutes: f64 = pickup_sequence
            .iter()
            .chain(&dropoff_sequence)
            .map(Waypoint::service_minutes)
            .sum();

        let all_destinations = dropoffs.len() == group.len();
        let solo_miles: f64 = group
            .iter()
            .filter_map(|request| request.dropoff.map(|d| haversine_miles(request.pickup, d)))
            .sum();
        let savings_percent = if all_destinations && solo_miles > 0.0 {
            ((solo_miles - shared_distance_miles) / solo_miles * 100.0).max(0.0)
        } else {
            0.0
        };

        let passenger_ids: Vec<String> = group.iter().map(|r| r.passenger_id.clone()).collect();
        PoolMatch {
            match_id: format!("pool-{}", passenger_ids.join("-")),
            driver_id: None,
            passenger_ids,
            pickup_sequence,
            dropoff_sequence,
            shared_distance_miles,
            savings_percent,
            total_time_minutes: travel_minutes + service_minutes,
            compatibility_score: compatibility.score(),
            reasoning: compatibility.reasoning(),
        }
    }
}

/// Order `waypoints` greedily by distance from the point `origin` picks.
fn visit_nearest_first<F>(waypoints: &[Waypoint], origin: F) -> Vec<Waypoint>
where
    F: FnOnce(&Waypoint) -> Coord<f64>,
{
    let Some(first) = waypoints.first() else {
        return Vec::new();
    };
    let locations: Vec<Coord<f64>> = waypoints.iter().map(|w| w.location).collect();
    nearest_neighbor_order(origin(first), &locations)
        .into_iter()
        .filter_map(|index| waypoints.get(index).cloned())
        .collect()
}

/// Mean pairwise `(1 + cos θ) / 2` of trip headings; `None` unless every
/// request has a destination.
fn heading_alignment(group: &[&RideRequest]) -> Option<f64> {
    let headings: Vec<f64> = group
        .iter()
        .map(|request| request.dropoff.map(|to| bearing(request.pickup, to)))
        .collect::<Option<_>>()?;
    let (sum, pairs) = headings
        .iter()
        .tuple_combinations()
        .fold((0.0, 0_u32), |(sum, pairs), (a, b)| {
            (sum + (1.0 + (a - b).cos()) / 2.0, pairs + 1)
        });
    (pairs > 0).then(|| sum / f64::from(pairs))
}

/// Planar heading from `from` to `to` in radians, longitude scaled by
/// latitude.
fn bearing(from: Coord<f64>, to: Coord<f64>) -> f64 {
    let east = (to.x - from.x) * from.y.to_radians().cos();
    let north = to.y - from.y;
    north.atan2(east)
}
