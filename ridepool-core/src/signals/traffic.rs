/// Coarse traffic severity reported by a traffic feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrafficSeverity {
    /// Free-flowing.
    Light,
    /// Some slowdowns.
    Moderate,
    /// Widespread congestion.
    Heavy,
    /// Gridlock or closures.
    Severe,
}

/// Traffic observed in a zone.
///
/// # Examples
/// ```
/// use ridepool_core::TrafficReport;
///
/// assert_eq!(TrafficReport::new(4.0).effective_delay_minutes(), 4.0);
/// assert_eq!(TrafficReport::new(-2.0).effective_delay_minutes(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TrafficReport {
    /// Expected extra minutes on a typical trip through the zone.
    pub delay_minutes: f64,
    /// Coarse severity, if the feed supplies one.
    pub severity: Option<TrafficSeverity>,
    /// Congestion ratio, if the feed supplies one.
    pub congestion_level: Option<f64>,
    /// Active incidents in the zone.
    pub incident_count: u32,
}

impl TrafficReport {
    /// Report carrying only a delay.
    #[must_use]
    pub fn new(delay_minutes: f64) -> Self {
        Self {
            delay_minutes,
            ..Self::default()
        }
    }

    /// Set the severity.
    #[must_use]
    pub const fn with_severity(mut self, severity: TrafficSeverity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Delay clamped to a finite, non-negative value.
    #[must_use]
    pub fn effective_delay_minutes(&self) -> f64 {
        if self.delay_minutes.is_finite() {
            self.delay_minutes.max(0.0)
        } else {
            0.0
        }
    }
}
