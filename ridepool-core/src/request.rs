//! Pending ride requests and their conversion into waypoints.

use std::collections::BTreeSet;

use chrono::{DateTime, TimeDelta, Utc};
use geo::Coord;

use crate::config::EngineConfig;
use crate::waypoint::{TimeWindow, Waypoint, WaypointKind};

/// A ride request waiting for dispatch.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use geo::Coord;
/// use ridepool_core::{EngineConfig, RideRequest, WaypointKind};
///
/// let request = RideRequest::new("req_1", "pass_1", Coord { x: -94.21, y: 36.375 }, Utc::now())
///     .with_priority(2);
/// let pickup = request.pickup_waypoint(&EngineConfig::default());
/// assert_eq!(pickup.id, "req_1_pickup");
/// assert_eq!(pickup.kind, WaypointKind::Pickup);
/// assert_eq!(pickup.priority, 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RideRequest {
    /// Request identifier.
    pub id: String,
    /// Passenger who made the request.
    pub passenger_id: String,
    /// Pickup position.
    pub pickup: Coord<f64>,
    /// Destination, when known.
    #[cfg_attr(feature = "serde", serde(default))]
    pub dropoff: Option<Coord<f64>>,
    /// When the passenger wants to be collected.
    pub requested_pickup_time: DateTime<Utc>,
    /// Higher values are more urgent.
    #[cfg_attr(feature = "serde", serde(default = "default_priority"))]
    pub priority: i32,
    /// Requirement tags such as `"wheelchair"`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub special_requirements: BTreeSet<String>,
}

#[cfg(feature = "serde")]
const fn default_priority() -> i32 {
    1
}

impl RideRequest {
    /// Construct a request with priority 1, no destination and no
    /// requirements.
    pub fn new(
        id: impl Into<String>,
        passenger_id: impl Into<String>,
        pickup: Coord<f64>,
        requested_pickup_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            passenger_id: passenger_id.into(),
            pickup,
            dropoff: None,
            requested_pickup_time,
            priority: 1,
            special_requirements: BTreeSet::new(),
        }
    }

    /// Set the destination.
    #[must_use]
    pub const fn with_dropoff(mut self, dropoff: Coord<f64>) -> Self {
        self.dropoff = Some(dropoff);
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Replace the requirement tags.
    #[must_use]
    pub fn with_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.special_requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    /// Pickup window: the requested time plus or minus the pickup tolerance.
    #[must_use]
    pub fn pickup_window(&self, config: &EngineConfig) -> TimeWindow {
        TimeWindow::around(
            self.requested_pickup_time,
            minutes_delta(config.pickup_tolerance_minutes),
        )
    }

    /// Pickup waypoint with id `"{id}_pickup"`.
    #[must_use]
    pub fn pickup_waypoint(&self, config: &EngineConfig) -> Waypoint {
        Waypoint::new(
            format!("{}_pickup", self.id),
            WaypointKind::Pickup,
            self.pickup,
            self.passenger_id.clone(),
            self.pickup_window(config),
        )
        .with_service_time(minutes_duration(config.pickup_service_minutes))
        .with_priority(self.priority)
        .with_requirements(self.special_requirements.iter().cloned())
    }

    /// Dropoff waypoint with id `"{id}_dropoff"`, if a destination is known.
    ///
    /// The window opens at the requested pickup time and closes the dropoff
    /// tolerance after the direct trip of `trip_minutes` would arrive.
    #[must_use]
    pub fn dropoff_waypoint(&self, config: &EngineConfig, trip_minutes: f64) -> Option<Waypoint> {
        let dropoff = self.dropoff?;
        let length = minutes_delta(trip_minutes.max(0.0) + config.dropoff_tolerance_minutes);
        Some(
            Waypoint::new(
                format!("{}_dropoff", self.id),
                WaypointKind::Dropoff,
                dropoff,
                self.passenger_id.clone(),
                TimeWindow::starting_at(self.requested_pickup_time, length),
            )
            .with_service_time(minutes_duration(config.dropoff_service_minutes))
            .with_priority(self.priority)
            .with_requirements(self.special_requirements.iter().cloned()),
        )
    }
}

/// Fractional minutes to a [`TimeDelta`], saturating on overflow and treating
/// non-finite or negative input as zero.
#[must_use]
pub fn minutes_delta(minutes: f64) -> TimeDelta {
    if !minutes.is_finite() || minutes <= 0.0 {
        return TimeDelta::zero();
    }
    let rounded = (minutes * 60_000.0).round().min(9.0e15);
    #[expect(
        clippy::cast_possible_truncation,
        reason = "value is clamped to the i64 range before the cast"
    )]
    let millis = rounded as i64;
    TimeDelta::milliseconds(millis)
}

/// Fractional minutes to a [`std::time::Duration`]; non-finite or negative
/// input yields zero.
#[must_use]
pub fn minutes_duration(minutes: f64) -> std::time::Duration {
    if !minutes.is_finite() || minutes <= 0.0 {
        return std::time::Duration::ZERO;
    }
    std::time::Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(std::time::Duration::MAX)
}
