//! Arrival-time predictions.

use geo::Coord;

/// Predicted travel time between two points with a confidence interval.
///
/// `confidence_interval_min <= estimated_time_minutes <= confidence_interval_max`
/// always holds.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EtaPrediction {
    /// Destination of the trip.
    pub destination: Coord<f64>,
    /// Best estimate in minutes: base plus traffic and weather delays.
    pub estimated_time_minutes: f64,
    /// Lower bound of the interval.
    pub confidence_interval_min: f64,
    /// Upper bound of the interval.
    pub confidence_interval_max: f64,
    /// Traffic contribution in minutes.
    pub traffic_delay_minutes: f64,
    /// Weather contribution in minutes.
    pub weather_delay_minutes: f64,
    /// Undisturbed travel time in minutes.
    pub base_time_minutes: f64,
    /// Trust in the estimate, in `[0, 1]`.
    pub confidence_score: f64,
    /// Notable contributors, e.g. `"heavy traffic (+6.0 min)"`.
    pub factors: Vec<String>,
}

impl EtaPrediction {
    /// Interval width in minutes.
    #[must_use]
    pub fn interval_width(&self) -> f64 {
        self.confidence_interval_max - self.confidence_interval_min
    }
}
