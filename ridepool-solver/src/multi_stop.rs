//! Multi-stop sequencing under capacity and precedence constraints.
//!
//! Waypoints are trimmed to the vehicle capacity first. Small sets are then
//! ordered by depth-first branch-and-bound, which returns the cheapest
//! feasible order (base travel plus service minutes). Larger sets, and sets
//! for which no feasible order exists, fall back to nearest-neighbor over the
//! stops that are eligible at each step.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use geo::Coord;
use ridepool_core::{
    OptimizationError, Waypoint, WaypointKind, ZoneSpeedEstimator, haversine_miles,
    is_finite_coord,
};

use crate::validator::{onboard_at_start, pending_pickups, trim_to_capacity};

/// How a multi-stop order was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiStopMethod {
    /// Branch-and-bound found the cheapest feasible order.
    Exact,
    /// Nearest eligible stop at every step.
    Heuristic,
}

/// Result of multi-stop sequencing.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiStopPlan {
    /// Waypoints in visiting order, start first when one was given.
    pub waypoints: Vec<Waypoint>,
    /// How the order was produced.
    pub method: MultiStopMethod,
    /// Identifiers removed by capacity trimming.
    pub dropped: Vec<String>,
}

/// Sequencer for mixed pickup and dropoff sets.
#[derive(Debug, Clone)]
pub struct MultiStopSequencer<'a> {
    travel: &'a ZoneSpeedEstimator,
    exact_limit: usize,
}

/// Mutable search state shared by the exact and heuristic tiers.
struct Progress<'w> {
    pending: HashMap<&'w str, usize>,
    load: usize,
    capacity: usize,
}

impl<'w> Progress<'w> {
    fn new(stops: &[&'w Waypoint], capacity: usize) -> Self {
        Self {
            pending: pending_pickups(stops.iter().copied()),
            load: onboard_at_start(stops.iter().copied()),
            capacity,
        }
    }

    fn precedence_allows(&self, stop: &Waypoint) -> bool {
        stop.kind != WaypointKind::Dropoff
            || self
                .pending
                .get(stop.passenger_id.as_str())
                .is_none_or(|count| *count == 0)
    }

    fn allows(&self, stop: &Waypoint) -> bool {
        match stop.kind {
            WaypointKind::Pickup => self.load < self.capacity,
            WaypointKind::Dropoff => self.precedence_allows(stop),
            WaypointKind::Start => true,
        }
    }

    fn visit(&mut self, stop: &Waypoint) {
        match stop.kind {
            WaypointKind::Pickup => {
                if let Some(count) = self.pending.get_mut(stop.passenger_id.as_str()) {
                    *count = count.saturating_sub(1);
                }
                self.load += 1;
            }
            WaypointKind::Dropoff => self.load = self.load.saturating_sub(1),
            WaypointKind::Start => {}
        }
    }

    fn undo(&mut self, stop: &Waypoint) {
        match stop.kind {
            WaypointKind::Pickup => {
                if let Some(count) = self.pending.get_mut(stop.passenger_id.as_str()) {
                    *count += 1;
                }
                self.load = self.load.saturating_sub(1);
            }
            WaypointKind::Dropoff => self.load += 1,
            WaypointKind::Start => {}
        }
    }
}

/// Branch-and-bound search over stop orders.
struct Search<'m> {
    /// `travel[i][j]` between stops; row `n` is the pinned start, if any.
    travel: &'m [Vec<f64>],
    service: &'m [f64],
    origin: Option<usize>,
    best_cost: f64,
    best_order: Option<Vec<usize>>,
}

impl Search<'_> {
    fn leg(&self, from: Option<usize>, to: usize) -> f64 {
        from.or(self.origin)
            .and_then(|i| self.travel.get(i))
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0.0)
    }

    fn explore<'w>(
        &mut self,
        stops: &[&'w Waypoint],
        progress: &mut Progress<'w>,
        visited: &mut [bool],
        order: &mut Vec<usize>,
        cost: f64,
    ) {
        if cost >= self.best_cost {
            return;
        }
        if order.len() == stops.len() {
            self.best_cost = cost;
            self.best_order = Some(order.clone());
            return;
        }
        let last = order.last().copied();
        for (index, stop) in stops.iter().enumerate() {
            let seen = visited.get(index).copied().unwrap_or(true);
            if seen || !progress.allows(stop) {
                continue;
            }
            let step = self.leg(last, index) + self.service.get(index).copied().unwrap_or(0.0);
            if let Some(flag) = visited.get_mut(index) {
                *flag = true;
            }
            progress.visit(stop);
            order.push(index);
            self.explore(stops, progress, visited, order, cost + step);
            order.pop();
            progress.undo(stop);
            if let Some(flag) = visited.get_mut(index) {
                *flag = false;
            }
        }
    }
}

impl<'a> MultiStopSequencer<'a> {
    /// Sequencer using `travel` for leg costs and exact search up to
    /// `exact_limit` stops.
    #[must_use]
    pub const fn new(travel: &'a ZoneSpeedEstimator, exact_limit: usize) -> Self {
        Self {
            travel,
            exact_limit,
        }
    }

    /// Trim `waypoints` to `capacity` and order what remains.
    ///
    /// The first `start` waypoint, if any, is pinned first. A passenger's
    /// dropoff never precedes their pickup, and the on-board count never
    /// exceeds `capacity` when any such order exists.
    ///
    /// # Errors
    /// Returns [`OptimizationError::NonFiniteCoordinate`] when a waypoint has
    /// an unusable coordinate.
    pub fn optimize(
        &self,
        waypoints: &[Waypoint],
        capacity: usize,
        now: DateTime<Utc>,
    ) -> Result<MultiStopPlan, OptimizationError> {
        if let Some(bad) = waypoints.iter().find(|w| !is_finite_coord(w.location)) {
            return Err(OptimizationError::non_finite(bad.id.clone()));
        }
        let trimmed = trim_to_capacity(waypoints, capacity, now);
        let start_index = trimmed
            .kept
            .iter()
            .position(|w| w.kind == WaypointKind::Start);
        let start = start_index.and_then(|i| trimmed.kept.get(i));
        let stops: Vec<&Waypoint> = trimmed
            .kept
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != start_index)
            .map(|(_, w)| w)
            .collect();

        let exact = if stops.len() <= self.exact_limit {
            let order = self.exact_order(start, &stops, capacity);
            if order.is_none() && !stops.is_empty() {
                log::warn!(
                    "no order of {} stops satisfies capacity {capacity}; using nearest-neighbor",
                    stops.len()
                );
            }
            order
        } else {
            None
        };
        let (order, method) = match exact {
            Some(order) => (order, MultiStopMethod::Exact),
            None => (
                heuristic_order(start.map(|w| w.location), &stops, capacity),
                MultiStopMethod::Heuristic,
            ),
        };

        let mut sequenced: Vec<Waypoint> = Vec::with_capacity(trimmed.kept.len());
        sequenced.extend(start.cloned());
        sequenced.extend(order.iter().filter_map(|i| stops.get(*i).map(|w| (*w).clone())));
        Ok(MultiStopPlan {
            waypoints: sequenced,
            method,
            dropped: trimmed.dropped,
        })
    }

    fn exact_order(
        &self,
        start: Option<&Waypoint>,
        stops: &[&Waypoint],
        capacity: usize,
    ) -> Option<Vec<usize>> {
        let n = stops.len();
        let mut travel: Vec<Vec<f64>> = stops
            .iter()
            .map(|from| {
                stops
                    .iter()
                    .map(|to| self.travel.base_minutes(from.location, to.location))
                    .collect()
            })
            .collect();
        let origin = start.map(|s| {
            travel.push(
                stops
                    .iter()
                    .map(|to| self.travel.base_minutes(s.location, to.location))
                    .collect(),
            );
            n
        });
        let service: Vec<f64> = stops.iter().map(|w| w.service_minutes()).collect();

        let mut search = Search {
            travel: &travel,
            service: &service,
            origin,
            best_cost: f64::INFINITY,
            best_order: None,
        };
        let mut progress = Progress::new(stops, capacity);
        let mut visited = vec![false; n];
        let mut order = Vec::with_capacity(n);
        search.explore(stops, &mut progress, &mut visited, &mut order, 0.0);
        search.best_order
    }
}

/// Nearest eligible stop at every step, ties by input order.
///
/// When no stop satisfies both precedence and capacity, precedence alone is
/// required; when even that fails, any remaining stop is taken.
fn heuristic_order(origin: Option<Coord<f64>>, stops: &[&Waypoint], capacity: usize) -> Vec<usize> {
    let mut progress = Progress::new(stops, capacity);
    let mut remaining: Vec<usize> = (0..stops.len()).collect();
    let mut order = Vec::with_capacity(stops.len());
    let mut current = origin;

    while !remaining.is_empty() {
        let pick = nearest_where(current, stops, &remaining, |w| progress.allows(w))
            .or_else(|| nearest_where(current, stops, &remaining, |w| progress.precedence_allows(w)))
            .or_else(|| nearest_where(current, stops, &remaining, |_| true));
        let Some(position) = pick else {
            break;
        };
        let index = remaining.remove(position);
        if let Some(stop) = stops.get(index) {
            progress.visit(stop);
            current = Some(stop.location);
        }
        order.push(index);
    }
    order
}

fn nearest_where<F>(
    from: Option<Coord<f64>>,
    stops: &[&Waypoint],
    candidates: &[usize],
    eligible: F,
) -> Option<usize>
where
    F: Fn(&Waypoint) -> bool,
{
    let mut best: Option<(usize, f64)> = None;
    for (position, index) in candidates.iter().enumerate() {
        let Some(stop) = stops.get(*index) else {
            continue;
        };
        if !eligible(stop) {
            continue;
        }
        // Without an origin the first eligible stop leads.
        let distance = from.map_or(0.0, |origin| haversine_miles(origin, stop.location));
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((position, distance));
        }
    }
    best.map(|(position, _)| position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::validate_route;
    use ridepool_core::EngineConfig;
    use ridepool_core::test_support::{
        AIRPORT, BUSINESS, DOWNTOWN, RESIDENTIAL, RETAIL, dropoff, instant, pickup,
    };
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    #[fixture]
    fn travel() -> ZoneSpeedEstimator {
        ZoneSpeedEstimator::new(Arc::new(EngineConfig::default()))
    }

    fn ids(waypoints: &[Waypoint]) -> Vec<&str> {
        waypoints.iter().map(|w| w.id.as_str()).collect()
    }

    #[rstest]
    fn start_is_pinned_and_dropoffs_follow_pickups(travel: ZoneSpeedEstimator) {
        let now = instant(9, 0);
        let waypoints = vec![
            dropoff("a", AIRPORT, now),
            pickup("a", RETAIL, now),
            Waypoint::driver_start(DOWNTOWN, now),
            pickup("b", BUSINESS, now),
            dropoff("b", RESIDENTIAL, now),
        ];
        let plan = MultiStopSequencer::new(&travel, 8)
            .optimize(&waypoints, 2, now)
            .expect("finite input");
        assert_eq!(plan.method, MultiStopMethod::Exact);
        assert_eq!(plan.waypoints.first().map(|w| w.id.as_str()), Some("driver_start"));
        let check = validate_route(&plan.waypoints, 2, now, &travel);
        assert!(check.precedence_ok);
        assert!(check.within_capacity);
        assert_eq!(plan.waypoints.len(), 5);
    }

    #[rstest]
    fn onboard_passengers_leave_before_new_pickups(travel: ZoneSpeedEstimator) {
        let now = instant(9, 0);
        let waypoints = vec![
            pickup("a", DOWNTOWN, now),
            dropoff("a", AIRPORT, now),
            dropoff("z", RETAIL, now),
        ];
        let plan = MultiStopSequencer::new(&travel, 8)
            .optimize(&waypoints, 1, now)
            .expect("finite input");
        assert_eq!(
            ids(&plan.waypoints),
            vec!["z_dropoff", "a_pickup", "a_dropoff"]
        );
        let check = validate_route(&plan.waypoints, 1, now, &travel);
        assert_eq!(check.peak_load, 1);
        assert!(check.precedence_ok);
    }

    #[rstest]
    fn excess_pickups_are_trimmed_with_their_dropoffs(travel: ZoneSpeedEstimator) {
        let now = instant(9, 0);
        let waypoints = vec![
            pickup("a", DOWNTOWN, now).with_priority(1),
            pickup("b", RETAIL, now).with_priority(5),
            dropoff("a", AIRPORT, now),
            dropoff("b", AIRPORT, now),
        ];
        let plan = MultiStopSequencer::new(&travel, 8)
            .optimize(&waypoints, 1, now)
            .expect("finite input");
        assert_eq!(ids(&plan.waypoints), vec!["b_pickup", "b_dropoff"]);
        assert_eq!(plan.dropped, vec!["a_pickup", "a_dropoff"]);
    }

    #[rstest]
    fn large_sets_use_the_heuristic(travel: ZoneSpeedEstimator) {
        let now = instant(9, 0);
        let trips = [
            ("p0", DOWNTOWN, BUSINESS),
            ("p1", AIRPORT, RESIDENTIAL),
            ("p2", BUSINESS, RETAIL),
            ("p3", RESIDENTIAL, DOWNTOWN),
            ("p4", RETAIL, AIRPORT),
        ];
        let waypoints: Vec<Waypoint> = trips
            .iter()
            .flat_map(|(passenger, from, to)| {
                [pickup(passenger, *from, now), dropoff(passenger, *to, now)]
            })
            .collect();
        let plan = MultiStopSequencer::new(&travel, 8)
            .optimize(&waypoints, 5, now)
            .expect("finite input");
        assert_eq!(plan.method, MultiStopMethod::Heuristic);
        assert_eq!(plan.waypoints.len(), 10);
        let check = validate_route(&plan.waypoints, 5, now, &travel);
        assert!(check.precedence_ok);
        assert!(check.within_capacity);
    }

    #[rstest]
    fn exact_search_beats_input_order(travel: ZoneSpeedEstimator) {
        let now = instant(9, 0);
        let far = Coord { x: -94.15, y: 36.42 };
        let waypoints = vec![
            Waypoint::driver_start(DOWNTOWN, now),
            pickup("a", far, now),
            pickup("b", RETAIL, now),
        ];
        let plan = MultiStopSequencer::new(&travel, 8)
            .optimize(&waypoints, 4, now)
            .expect("finite input");
        assert_eq!(ids(&plan.waypoints), vec!["driver_start", "b_pickup", "a_pickup"]);
    }

    #[rstest]
    fn non_finite_coordinates_are_rejected(travel: ZoneSpeedEstimator) {
        let now = instant(9, 0);
        let waypoints = vec![pickup("a", Coord { x: f64::NAN, y: 0.0 }, now)];
        let err = MultiStopSequencer::new(&travel, 8)
            .optimize(&waypoints, 4, now)
            .expect_err("NaN coordinate");
        assert_eq!(err, OptimizationError::non_finite("a_pickup"));
    }
}
