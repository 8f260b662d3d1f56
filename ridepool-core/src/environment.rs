//! Environmental impact estimation.
//!
//! Converts weather and traffic reports into delay minutes and route-time
//! multipliers. Failed lookups never propagate: the neutral value (delay 0,
//! multiplier 1.0) is used and the failure is reported alongside the value so
//! callers can mark their result as degraded.

use std::sync::Arc;

use geo::Coord;

use crate::config::EngineConfig;
use crate::signals::{SignalError, TrafficProvider, WeatherProvider};

/// Traffic period derived from the service-local hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    /// 07:00-09:59 and 17:00-19:59.
    RushHour,
    /// 10:00-16:59.
    Daytime,
    /// Every other hour.
    OffPeak,
}

impl TimeOfDay {
    /// Classify an hour of day (0-23).
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            7..=9 | 17..=19 => Self::RushHour,
            10..=16 => Self::Daytime,
            _ => Self::OffPeak,
        }
    }

    /// Scale applied to reported traffic delay.
    #[must_use]
    pub const fn traffic_factor(self) -> f64 {
        match self {
            Self::RushHour => 1.5,
            Self::Daytime => 1.0,
            Self::OffPeak => 0.5,
        }
    }
}

/// A signal-derived value and the lookup failure, if any, behind it.
///
/// When `unavailable` is set, `value` is the neutral default.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Derived value.
    pub value: f64,
    /// Failure that forced the neutral value.
    pub unavailable: Option<SignalError>,
}

impl Reading {
    const fn ok(value: f64) -> Self {
        Self {
            value,
            unavailable: None,
        }
    }

    const fn neutral(value: f64, error: SignalError) -> Self {
        Self {
            value,
            unavailable: Some(error),
        }
    }
}

/// Route-level impact multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteImpact {
    /// Mean traffic multiplier over the route's points.
    pub traffic: f64,
    /// Mean weather multiplier over the route's points.
    pub weather: f64,
    /// First lookup failure encountered, if any.
    pub unavailable: Option<SignalError>,
}

impl RouteImpact {
    /// Impact with both multipliers at 1.0.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            traffic: 1.0,
            weather: 1.0,
            unavailable: None,
        }
    }

    /// Product of the two multipliers.
    #[must_use]
    pub fn combined(&self) -> f64 {
        self.traffic * self.weather
    }
}

/// Estimator over a weather feed and a traffic feed.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use geo::Coord;
/// use ridepool_core::{EngineConfig, EnvironmentalImpactEstimator, NoSignals};
///
/// let estimator =
///     EnvironmentalImpactEstimator::new(NoSignals, NoSignals, Arc::new(EngineConfig::default()));
/// let impact = estimator.route_impact(&[Coord { x: -94.209, y: 36.373 }]);
/// assert_eq!(impact.combined(), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct EnvironmentalImpactEstimator<W, T> {
    weather: W,
    traffic: T,
    config: Arc<EngineConfig>,
}

impl<W, T> EnvironmentalImpactEstimator<W, T>
where
    W: WeatherProvider,
    T: TrafficProvider,
{
    /// Combine two feeds with the engine configuration.
    pub const fn new(weather: W, traffic: T, config: Arc<EngineConfig>) -> Self {
        Self {
            weather,
            traffic,
            config,
        }
    }

    /// Weather delay at `location`, in minutes.
    pub fn weather_delay_minutes(&self, location: Coord<f64>) -> Reading {
        match self.weather.weather_at(location) {
            Ok(report) => Reading::ok(report.map_or(0.0, |r| r.condition.delay_minutes())),
            Err(err) => {
                log::warn!("weather unavailable; assuming no delay: {err}");
                Reading::neutral(0.0, err)
            }
        }
    }

    /// Weather multiplier at `location`.
    pub fn weather_multiplier(&self, location: Coord<f64>) -> Reading {
        match self.weather.weather_at(location) {
            Ok(report) => Reading::ok(report.map_or(1.0, |r| r.condition.multiplier())),
            Err(err) => {
                log::warn!("weather unavailable; assuming neutral multiplier: {err}");
                Reading::neutral(1.0, err)
            }
        }
    }

    /// Reported traffic delay in the zone containing `location`, unscaled.
    ///
    /// Points outside every zone have no traffic feed and read zero.
    pub fn raw_traffic_delay_minutes(&self, location: Coord<f64>) -> Reading {
        let matched = self
            .config
            .zones
            .classify(location, self.config.zone_match_radius_miles);
        let Some(zone) = matched.zone() else {
            return Reading::ok(0.0);
        };
        match self.traffic.traffic_in(&zone.id) {
            Ok(report) => Reading::ok(report.map_or(0.0, |r| r.effective_delay_minutes())),
            Err(err) => {
                log::warn!("traffic unavailable in {}; assuming no delay: {err}", zone.id);
                Reading::neutral(0.0, err)
            }
        }
    }

    /// Traffic delay at `location` scaled for the local `hour`.
    pub fn traffic_delay_minutes(&self, location: Coord<f64>, hour: u32) -> Reading {
        let mut reading = self.raw_traffic_delay_minutes(location);
        reading.value *= TimeOfDay::from_hour(hour).traffic_factor();
        reading
    }

    /// Traffic multiplier at `location`: `1 + delay / 30`.
    pub fn traffic_multiplier(&self, location: Coord<f64>) -> Reading {
        let mut reading = self.raw_traffic_delay_minutes(location);
        reading.value = 1.0 + reading.value / 30.0;
        reading
    }

    /// Mean traffic and weather multipliers over `points`.
    ///
    /// An empty slice is neutral. Each point is looked up once per feed; the
    /// first failure is kept.
    pub fn route_impact(&self, points: &[Coord<f64>]) -> RouteImpact {
        if points.is_empty() {
            return RouteImpact::neutral();
        }
        let mut traffic_sum = 0.0;
        let mut weather_sum = 0.0;
        let mut unavailable = None;
        for point in points {
            let traffic = self.traffic_multiplier(*point);
            let weather = self.weather_multiplier(*point);
            traffic_sum += traffic.value;
            weather_sum += weather.value;
            unavailable = unavailable.or(traffic.unavailable).or(weather.unavailable);
        }
        #[expect(
            clippy::cast_precision_loss,
            reason = "route point counts are tiny"
        )]
        let count = points.len() as f64;
        RouteImpact {
            traffic: traffic_sum / count,
            weather: weather_sum / count,
            unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{NoSignals, SignalKind, WeatherCondition};
    use crate::test_support::{FailingSignals, FixedTraffic, FixedWeather, ZoneTraffic};
    use rstest::{fixture, rstest};

    const DOWNTOWN: Coord<f64> = Coord { x: -94.209, y: 36.373 };
    const AIRPORT: Coord<f64> = Coord { x: -94.220, y: 36.385 };

    #[fixture]
    fn config() -> Arc<EngineConfig> {
        Arc::new(EngineConfig::default())
    }

    #[rstest]
    #[case(8, TimeOfDay::RushHour)]
    #[case(18, TimeOfDay::RushHour)]
    #[case(12, TimeOfDay::Daytime)]
    #[case(16, TimeOfDay::Daytime)]
    #[case(20, TimeOfDay::OffPeak)]
    #[case(3, TimeOfDay::OffPeak)]
    fn classifies_hours(#[case] hour: u32, #[case] expected: TimeOfDay) {
        assert_eq!(TimeOfDay::from_hour(hour), expected);
    }

    #[rstest]
    #[case(8, 6.0)]
    #[case(12, 4.0)]
    #[case(22, 2.0)]
    fn traffic_delay_scales_by_time_of_day(
        config: Arc<EngineConfig>,
        #[case] hour: u32,
        #[case] expected: f64,
    ) {
        let estimator = EnvironmentalImpactEstimator::new(NoSignals, FixedTraffic::new(4.0), config);
        let reading = estimator.traffic_delay_minutes(DOWNTOWN, hour);
        assert_eq!(reading.value, expected);
        assert!(reading.unavailable.is_none());
    }

    #[rstest]
    fn route_impact_averages_points(config: Arc<EngineConfig>) {
        let traffic = ZoneTraffic::new([("downtown", 6.0), ("airport", 0.0)]);
        let estimator =
            EnvironmentalImpactEstimator::new(FixedWeather::new(WeatherCondition::Rain), traffic, config);
        let impact = estimator.route_impact(&[DOWNTOWN, AIRPORT]);
        assert!((impact.traffic - 1.1).abs() < 1e-12);
        assert_eq!(impact.weather, 1.5);
        assert!(impact.unavailable.is_none());
    }

    #[rstest]
    fn failures_are_neutral_and_reported(config: Arc<EngineConfig>) {
        let estimator = EnvironmentalImpactEstimator::new(FailingSignals, FailingSignals, config);
        let delay = estimator.weather_delay_minutes(DOWNTOWN);
        assert_eq!(delay.value, 0.0);
        assert_eq!(
            delay.unavailable.as_ref().map(SignalError::signal),
            Some(SignalKind::Weather)
        );
        let impact = estimator.route_impact(&[DOWNTOWN]);
        assert_eq!(impact.combined(), 1.0);
        assert!(impact.unavailable.is_some());
    }

    #[rstest]
    fn unclassified_points_have_no_traffic() {
        let config = Arc::new(EngineConfig {
            zone_match_radius_miles: Some(1.0),
            ..EngineConfig::default()
        });
        let estimator = EnvironmentalImpactEstimator::new(NoSignals, FailingSignals, config);
        let reading = estimator.traffic_multiplier(Coord { x: 0.0, y: 0.0 });
        assert_eq!(reading.value, 1.0);
        assert!(reading.unavailable.is_none());
    }

    #[rstest]
    fn empty_route_is_neutral(config: Arc<EngineConfig>) {
        let estimator = EnvironmentalImpactEstimator::new(FailingSignals, FailingSignals, config);
        assert_eq!(estimator.route_impact(&[]), RouteImpact::neutral());
    }
}
