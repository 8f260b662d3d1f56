//! Capacity and time-window checks.
//!
//! Trimming keeps the most urgent pickups when a vehicle cannot carry every
//! passenger, and removes the dropoffs of passengers whose pickups were cut so
//! a route never drops off someone it never collected.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use ridepool_core::{Waypoint, WaypointKind, ZoneSpeedEstimator, minutes_delta, saturating_add};

/// Urgency used when trimming pickups: `priority × 10 − hours to deadline`.
#[must_use]
pub fn priority_score(waypoint: &Waypoint, now: DateTime<Utc>) -> f64 {
    f64::from(waypoint.priority) * 10.0 - waypoint.hours_until_deadline(now)
}

/// Outcome of capacity trimming.
#[derive(Debug, Clone, PartialEq)]
pub struct Trimmed {
    /// Surviving waypoints, in input order.
    pub kept: Vec<Waypoint>,
    /// Identifiers of removed waypoints, in input order.
    pub dropped: Vec<String>,
}

/// Keep at most `capacity` pickups, preferring higher [`priority_score`].
///
/// Equal scores keep the pickup listed first. Dropoffs of passengers left
/// with no pickup are removed too; dropoffs of passengers who never had a
/// pickup in the set are kept.
#[must_use]
pub fn trim_to_capacity(waypoints: &[Waypoint], capacity: usize, now: DateTime<Utc>) -> Trimmed {
    let pickups: Vec<(usize, f64)> = waypoints
        .iter()
        .enumerate()
        .filter(|(_, w)| w.kind == WaypointKind::Pickup)
        .map(|(i, w)| (i, priority_score(w, now)))
        .collect();
    if pickups.len() <= capacity {
        return Trimmed {
            kept: waypoints.to_vec(),
            dropped: Vec::new(),
        };
    }

    let mut ranked = pickups;
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    let cut: HashSet<usize> = ranked.iter().skip(capacity).map(|(i, _)| *i).collect();

    let still_collected: HashSet<&str> = waypoints
        .iter()
        .enumerate()
        .filter(|(i, w)| w.kind == WaypointKind::Pickup && !cut.contains(i))
        .map(|(_, w)| w.passenger_id.as_str())
        .collect();
    let stranded: HashSet<&str> = waypoints
        .iter()
        .enumerate()
        .filter(|(i, _)| cut.contains(i))
        .map(|(_, w)| w.passenger_id.as_str())
        .filter(|p| !still_collected.contains(p))
        .collect();

    let mut kept = Vec::with_capacity(waypoints.len());
    let mut dropped = Vec::new();
    for (i, waypoint) in waypoints.iter().enumerate() {
        let remove = cut.contains(&i)
            || (waypoint.kind == WaypointKind::Dropoff
                && stranded.contains(waypoint.passenger_id.as_str()));
        if remove {
            dropped.push(waypoint.id.clone());
        } else {
            kept.push(waypoint.clone());
        }
    }
    log::debug!(
        "trimmed {} waypoint(s) to respect capacity {capacity}",
        dropped.len()
    );
    Trimmed { kept, dropped }
}

/// Per-passenger pickup counts for precedence tracking.
pub(crate) fn pending_pickups<'w, I>(waypoints: I) -> HashMap<&'w str, usize>
where
    I: IntoIterator<Item = &'w Waypoint>,
{
    let mut pending: HashMap<&'w str, usize> = HashMap::new();
    for waypoint in waypoints
        .into_iter()
        .filter(|w| w.kind == WaypointKind::Pickup)
    {
        *pending.entry(waypoint.passenger_id.as_str()).or_default() += 1;
    }
    pending
}

/// Dropoffs whose passenger has no pickup in the set: already on board.
pub(crate) fn onboard_at_start<'w, I>(waypoints: I) -> usize
where
    I: IntoIterator<Item = &'w Waypoint> + Clone,
{
    let pending = pending_pickups(waypoints.clone());
    waypoints
        .into_iter()
        .filter(|w| {
            w.kind == WaypointKind::Dropoff && !pending.contains_key(w.passenger_id.as_str())
        })
        .count()
}

/// Feasibility report for a sequenced route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteCheck {
    /// Most passengers on board at once.
    pub peak_load: usize,
    /// Whether the load never exceeded capacity.
    pub within_capacity: bool,
    /// Whether every dropoff came after its passenger's pickups.
    pub precedence_ok: bool,
    /// Waypoints reached after their window closed.
    pub late_waypoints: Vec<String>,
}

impl RouteCheck {
    /// No violations of any kind.
    #[must_use]
    pub fn is_feasible(&self) -> bool {
        self.within_capacity && self.precedence_ok && self.late_waypoints.is_empty()
    }
}

/// Check `sequence` against `capacity` and each waypoint's window.
///
/// Arrival times start at `departure` on the first waypoint and advance by
/// base travel time between consecutive waypoints. Arriving before a window
/// opens waits for it; service time follows.
#[must_use]
pub fn validate_route(
    sequence: &[Waypoint],
    capacity: usize,
    departure: DateTime<Utc>,
    travel: &ZoneSpeedEstimator,
) -> RouteCheck {
    let mut pending = pending_pickups(sequence);
    let mut load = onboard_at_start(sequence);
    let mut peak_load = load;
    let mut precedence_ok = true;
    let mut late_waypoints = Vec::new();
    let mut clock = departure;
    let mut previous: Option<&Waypoint> = None;

    for waypoint in sequence {
        if let Some(prev) = previous {
            let leg = minutes_delta(travel.base_minutes(prev.location, waypoint.location));
            clock = saturating_add(clock, leg);
        }
        if clock > waypoint.window.end() {
            late_waypoints.push(waypoint.id.clone());
        }
        clock = saturating_add(
            clock.max(waypoint.window.start()),
            minutes_delta(waypoint.service_minutes()),
        );

        match waypoint.kind {
            WaypointKind::Pickup => {
                if let Some(count) = pending.get_mut(waypoint.passenger_id.as_str()) {
                    *count = count.saturating_sub(1);
                }
                load += 1;
            }
            WaypointKind::Dropoff => {
                if pending
                    .get(waypoint.passenger_id.as_str())
                    .is_some_and(|count| *count > 0)
                {
                    precedence_ok = false;
                }
                load = load.saturating_sub(1);
            }
            WaypointKind::Start => {}
        }
        peak_load = peak_load.max(load);
        previous = Some(waypoint);
    }

    RouteCheck {
        peak_load,
        within_capacity: peak_load <= capacity,
        precedence_ok,
        late_waypoints,
    }
}
