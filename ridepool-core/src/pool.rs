//! Candidate pooled rides.

use crate::waypoint::Waypoint;

/// A group of passengers who could share one vehicle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolMatch {
    /// Match identifier, `pool-{passenger ids joined by '-'}`.
    pub match_id: String,
    /// Driver chosen by an external dispatcher; `None` until assigned.
    pub driver_id: Option<String>,
    /// Pooled passengers, in request order.
    pub passenger_ids: Vec<String>,
    /// Pickups in visiting order.
    pub pickup_sequence: Vec<Waypoint>,
    /// Dropoffs in visiting order; empty when destinations are unknown.
    pub dropoff_sequence: Vec<Waypoint>,
    /// Distance driven for the whole pooled trip, in miles.
    pub shared_distance_miles: f64,
    /// Distance saved versus separate direct trips, in percent.
    pub savings_percent: f64,
    /// Estimated pooled trip minutes, including service time.
    pub total_time_minutes: f64,
    /// Compatibility in `[0, 1]`.
    pub compatibility_score: f64,
    /// Human-readable explanation of the score.
    pub reasoning: String,
}

impl PoolMatch {
    /// Assigned driver, or `"TBD"`.
    #[must_use]
    pub fn driver_label(&self) -> &str {
        self.driver_id.as_deref().unwrap_or("TBD")
    }

    /// Number of pooled passengers.
    #[must_use]
    pub fn size(&self) -> usize {
        self.passenger_ids.len()
    }
}
