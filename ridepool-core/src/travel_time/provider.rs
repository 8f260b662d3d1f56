//! Travel-time provider trait and the zone-speed estimator.

use std::sync::Arc;

use geo::Coord;

use super::error::TravelTimeError;
use crate::config::EngineConfig;
use crate::spatial::{haversine_miles, is_finite_coord};

/// Adjacency matrix of travel times in minutes.
pub type TravelTimeMatrix = Vec<Vec<f64>>;

/// Estimate travel minutes between coordinates.
///
/// `travel_time_matrix` must return a square `n×n` matrix where
/// `n == points.len()` and `matrix[i][j]` is the time from `points[i]` to
/// `points[j]`.
///
/// # Examples
///
/// ```rust
/// use geo::Coord;
/// use ridepool_core::{TravelTimeError, TravelTimeProvider};
///
/// struct FiveMinutes;
///
/// impl TravelTimeProvider for FiveMinutes {
///     fn travel_minutes(&self, _: Coord<f64>, _: Coord<f64>) -> Result<f64, TravelTimeError> {
///         Ok(5.0)
///     }
/// }
///
/// let points = [Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }];
/// let matrix = FiveMinutes.travel_time_matrix(&points)?;
/// assert_eq!(matrix, vec![vec![0.0, 5.0], vec![5.0, 0.0]]);
/// # Ok::<(), TravelTimeError>(())
/// ```
pub trait TravelTimeProvider {
    /// Minutes to travel from `from` to `to`.
    ///
    /// # Errors
    /// Implementations reject coordinates they cannot route.
    fn travel_minutes(&self, from: Coord<f64>, to: Coord<f64>) -> Result<f64, TravelTimeError>;

    /// Pairwise travel minutes for `points`; the diagonal is zero.
    ///
    /// # Errors
    /// Returns `Err(TravelTimeError::EmptyInput)` when `points` is empty, and
    /// propagates any error from [`Self::travel_minutes`].
    fn travel_time_matrix(&self, points: &[Coord<f64>]) -> Result<TravelTimeMatrix, TravelTimeError> {
        if points.is_empty() {
            return Err(TravelTimeError::EmptyInput);
        }
        points
            .iter()
            .enumerate()
            .map(|(i, from)| {
                points
                    .iter()
                    .enumerate()
                    .map(|(j, to)| {
                        if i == j {
                            Ok(0.0)
                        } else {
                            self.travel_minutes(*from, *to)
                        }
                    })
                    .collect()
            })
            .collect()
    }
}

/// Base travel-time estimator driven by zone average speeds.
///
/// The speed for a leg is the mean of the average speeds of the zones that
/// contain each end (the configured default for unclassified ends). Times are
/// floored at one minute. If the speed is unusable the estimate falls back to
/// two minutes per mile.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use geo::Coord;
/// use ridepool_core::{EngineConfig, ZoneSpeedEstimator};
///
/// let estimator = ZoneSpeedEstimator::new(Arc::new(EngineConfig::default()));
/// let downtown = Coord { x: -94.209, y: 36.373 };
/// assert_eq!(estimator.base_minutes(downtown, downtown), 1.0);
/// ```
#[derive(Debug, Clone)]
pub struct ZoneSpeedEstimator {
    config: Arc<EngineConfig>,
}

impl ZoneSpeedEstimator {
    /// Build an estimator over the configured zone table.
    #[must_use]
    pub const fn new(config: Arc<EngineConfig>) -> Self {
        Self { config }
    }

    /// Mean zone speed for a leg, in miles per hour.
    #[must_use]
    pub fn speed_between(&self, from: Coord<f64>, to: Coord<f64>) -> f64 {
        let radius = self.config.zone_match_radius_miles;
        let default = self.config.default_speed_mph;
        let zones = &self.config.zones;
        let from_speed = zones.classify(from, radius).speed_or(default);
        let to_speed = zones.classify(to, radius).speed_or(default);
        (from_speed + to_speed) / 2.0
    }

    /// Base minutes for a leg, before traffic and weather.
    #[must_use]
    pub fn base_minutes(&self, from: Coord<f64>, to: Coord<f64>) -> f64 {
        let distance = haversine_miles(from, to);
        let speed = self.speed_between(from, to);
        if !(speed.is_finite() && speed > 0.0) {
            log::warn!("unusable average speed {speed} mph; using 2 min/mile");
            return distance * 2.0;
        }
        let minutes = distance / speed * 60.0;
        if minutes.is_finite() {
            minutes.max(1.0)
        } else {
            minutes
        }
    }
}

impl TravelTimeProvider for ZoneSpeedEstimator {
    fn travel_minutes(&self, from: Coord<f64>, to: Coord<f64>) -> Result<f64, TravelTimeError> {
        if !is_finite_coord(from) {
            return Err(TravelTimeError::NonFiniteCoordinate { index: 0 });
        }
        if !is_finite_coord(to) {
            return Err(TravelTimeError::NonFiniteCoordinate { index: 1 });
        }
        Ok(self.base_minutes(from, to))
    }

    fn travel_time_matrix(&self, points: &[Coord<f64>]) -> Result<TravelTimeMatrix, TravelTimeError> {
        if points.is_empty() {
            return Err(TravelTimeError::EmptyInput);
        }
        if let Some(index) = points.iter().position(|p| !is_finite_coord(*p)) {
            return Err(TravelTimeError::NonFiniteCoordinate { index });
        }
        Ok(points
            .iter()
            .enumerate()
            .map(|(i, from)| {
                points
                    .iter()
                    .enumerate()
                    .map(|(j, to)| if i == j { 0.0 } else { self.base_minutes(*from, *to) })
                    .collect()
            })
            .collect())
    }
}
