//! Waypoints: the start, pickup and dropoff stops a route is made of.

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use geo::Coord;
use thiserror::Error;

/// Errors returned when constructing waypoint parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaypointError {
    /// The window closes before it opens.
    #[error("time window ends at {end} before it starts at {start}")]
    InvertedWindow {
        /// Requested opening instant.
        start: DateTime<Utc>,
        /// Requested closing instant.
        end: DateTime<Utc>,
    },
}

/// What happens at a waypoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WaypointKind {
    /// The driver's position when the optimization starts.
    Start,
    /// A passenger boards.
    Pickup,
    /// A passenger alights.
    Dropoff,
}

impl WaypointKind {
    /// Lower-case tag used in logs and identifiers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
        }
    }

    /// Whether the stop serves a passenger (pickup or dropoff).
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Pickup | Self::Dropoff)
    }
}

impl fmt::Display for WaypointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed interval `[start, end]` within which a stop should be served.
///
/// # Examples
/// ```
/// use chrono::{TimeDelta, Utc};
/// use ridepool_core::TimeWindow;
///
/// let now = Utc::now();
/// let window = TimeWindow::around(now, TimeDelta::minutes(5));
/// assert_eq!(window.length().num_minutes(), 10);
/// assert!(TimeWindow::new(now, now - TimeDelta::minutes(1)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "TimeWindowRepr"))]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct TimeWindowRepr {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[cfg(feature = "serde")]
impl TryFrom<TimeWindowRepr> for TimeWindow {
    type Error = WaypointError;

    fn try_from(value: TimeWindowRepr) -> Result<Self, Self::Error> {
        Self::new(value.start, value.end)
    }
}

impl TimeWindow {
    /// Validate and construct a window.
    ///
    /// # Errors
    /// Returns [`WaypointError::InvertedWindow`] when `end < start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WaypointError> {
        if end < start {
            return Err(WaypointError::InvertedWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window centred on `at`, `tolerance` either side.
    ///
    /// Negative tolerances are treated as zero. Bounds clamp to the
    /// representable range of [`DateTime`].
    #[must_use]
    pub fn around(at: DateTime<Utc>, tolerance: TimeDelta) -> Self {
        let half = tolerance.max(TimeDelta::zero());
        Self {
            start: at.checked_sub_signed(half).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: saturating_add(at, half),
        }
    }

    /// Window opening at `start` and lasting `length` (negative means zero).
    #[must_use]
    pub fn starting_at(start: DateTime<Utc>, length: TimeDelta) -> Self {
        Self {
            start,
            end: saturating_add(start, length.max(TimeDelta::zero())),
        }
    }

    /// Opening instant.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Closing instant.
    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// `end - start`; never negative.
    #[must_use]
    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Window length in fractional minutes.
    #[must_use]
    pub fn length_minutes(&self) -> f64 {
        delta_minutes(self.length())
    }

    /// Intersection with another window, if they overlap.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }
}

/// `at + delta`, clamped to `DateTime::<Utc>::MIN_UTC` and
/// `DateTime::<Utc>::MAX_UTC` instead of overflowing.
///
/// # Examples
/// ```
/// use chrono::{DateTime, TimeDelta, Utc};
/// use ridepool_core::saturating_add;
///
/// let end = DateTime::<Utc>::MAX_UTC;
/// assert_eq!(saturating_add(end, TimeDelta::hours(1)), end);
/// ```
#[must_use]
pub fn saturating_add(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Convert a [`TimeDelta`] to fractional minutes.
#[must_use]
pub fn delta_minutes(delta: TimeDelta) -> f64 {
    // Millisecond precision is ample for dispatch windows.
    #[expect(
        clippy::cast_precision_loss,
        reason = "window lengths are far below 2^52 milliseconds"
    )]
    let millis = delta.num_milliseconds() as f64;
    millis / 60_000.0
}

/// A stop on a route.
///
/// Waypoints are built per optimization call and treated as immutable.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use chrono::{TimeDelta, Utc};
/// use geo::Coord;
/// use ridepool_core::{TimeWindow, Waypoint, WaypointKind};
///
/// let window = TimeWindow::around(Utc::now(), TimeDelta::minutes(5));
/// let pickup = Waypoint::new(
///     "r1_pickup",
///     WaypointKind::Pickup,
///     Coord { x: -94.209, y: 36.373 },
///     "p1",
///     window,
/// )
/// .with_service_time(Duration::from_secs(120))
/// .with_priority(2);
/// assert_eq!(pickup.service_minutes(), 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Waypoint {
    /// Unique identifier, e.g. `"req_1_pickup"`.
    pub id: String,
    /// Kind of stop.
    pub kind: WaypointKind,
    /// Position (`x = longitude`, `y = latitude`).
    pub location: Coord<f64>,
    /// Passenger served here; `"driver"` for start points.
    pub passenger_id: String,
    /// When the stop should be served.
    pub window: TimeWindow,
    /// Dwell time at the stop.
    pub service_time: Duration,
    /// Higher values are more urgent.
    pub priority: i32,
    /// Requirement tags such as `"wheelchair"` or `"child_seat"`.
    pub special_requirements: BTreeSet<String>,
}

impl Waypoint {
    /// Construct a waypoint with no service time, priority 1 and no
    /// requirements.
    pub fn new(
        id: impl Into<String>,
        kind: WaypointKind,
        location: Coord<f64>,
        passenger_id: impl Into<String>,
        window: TimeWindow,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            location,
            passenger_id: passenger_id.into(),
            window,
            service_time: Duration::ZERO,
            priority: 1,
            special_requirements: BTreeSet::new(),
        }
    }

    /// Driver start point valid for one hour from `now`.
    #[must_use]
    pub fn driver_start(location: Coord<f64>, now: DateTime<Utc>) -> Self {
        Self::new(
            "driver_start",
            WaypointKind::Start,
            location,
            "driver",
            TimeWindow::starting_at(now, TimeDelta::hours(1)),
        )
    }

    /// Set the dwell time.
    #[must_use]
    pub const fn with_service_time(mut self, service_time: Duration) -> Self {
        self.service_time = service_time;
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

    /// Dwell time in fractional minutes.
    #[must_use]
    pub fn service_minutes(&self) -> f64 {
        self.service_time.as_secs_f64() / 60.0
    }

    /// Hours from `now` until the window closes; negative once it has closed.
    #[must_use]
    pub fn hours_until_deadline(&self, now: DateTime<Utc>) -> f64 {
        delta_minutes(self.window.end() - now) / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::{fixture, rstest};

    #[fixture]
    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0)
            .single()
            .expect("valid instant")
    }

    #[rstest]
    fn inverted_window_is_rejected(noon: DateTime<Utc>) {
        let err = TimeWindow::new(noon, noon - TimeDelta::minutes(1)).expect_err("inverted");
        assert!(matches!(err, WaypointError::InvertedWindow { .. }));
    }

    #[rstest]
    fn zero_length_window_is_allowed(noon: DateTime<Utc>) {
        let window = TimeWindow::new(noon, noon).expect("degenerate window");
        assert_eq!(window.length_minutes(), 0.0);
    }

    #[rstest]
    fn around_spans_twice_the_tolerance(noon: DateTime<Utc>) {
        let window = TimeWindow::around(noon, TimeDelta::minutes(5));
        assert_eq!(window.start(), noon - TimeDelta::minutes(5));
        assert_eq!(window.length_minutes(), 10.0);
    }

    #[rstest]
    fn intersection_of_disjoint_windows_is_none(noon: DateTime<Utc>) {
        let a = TimeWindow::starting_at(noon, TimeDelta::minutes(5));
        let b = TimeWindow::starting_at(noon + TimeDelta::minutes(6), TimeDelta::minutes(5));
        assert!(a.intersect(&b).is_none());
        let c = TimeWindow::starting_at(noon + TimeDelta::minutes(3), TimeDelta::minutes(5));
        let overlap = a.intersect(&c).expect("overlap");
        assert_eq!(overlap.length_minutes(), 2.0);
    }

    #[rstest]
    fn windows_clamp_at_the_ends_of_time() {
        let last = DateTime::<Utc>::MAX_UTC;
        let first = DateTime::<Utc>::MIN_UTC;
        let late = TimeWindow::around(last, TimeDelta::minutes(5));
        assert_eq!(late.end(), last);
        assert_eq!(late.start(), last - TimeDelta::minutes(5));
        assert_eq!(TimeWindow::around(first, TimeDelta::minutes(5)).start(), first);
        assert_eq!(TimeWindow::starting_at(last, TimeDelta::hours(1)).end(), last);
        assert_eq!(saturating_add(first, TimeDelta::minutes(-1)), first);
    }

    #[rstest]
    fn deadline_hours_are_signed(noon: DateTime<Utc>) {
        let wp = Waypoint::new(
            "w",
            WaypointKind::Pickup,
            Coord { x: 0.0, y: 0.0 },
            "p",
            TimeWindow::starting_at(noon, TimeDelta::minutes(30)),
        );
        assert!((wp.hours_until_deadline(noon) - 0.5).abs() < 1e-9);
        assert!(wp.hours_until_deadline(noon + TimeDelta::hours(1)) < 0.0);
    }

    #[rstest]
    fn driver_start_has_no_service_time(noon: DateTime<Utc>) {
        let start = Waypoint::driver_start(Coord { x: 1.0, y: 2.0 }, noon);
        assert_eq!(start.kind, WaypointKind::Start);
        assert_eq!(start.service_minutes(), 0.0);
        assert!(!start.kind.is_stop());
    }
}
