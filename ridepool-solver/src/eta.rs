//! Point-to-point arrival predictions.

use chrono::{DateTime, Utc};
use geo::Coord;
use ridepool_core::{
    EngineConfig, EnvironmentalImpactEstimator, EtaPrediction, OptimizationError, SignalError,
    TrafficProvider, WeatherProvider, ZoneSpeedEstimator, haversine_miles, is_finite_coord,
    midpoint,
};

use crate::planner::FALLBACK_MINUTES_PER_MILE;

/// Factor recorded on fallback predictions.
pub const FALLBACK_FACTOR: &str = "fallback estimation";

/// A prediction and the signal failure, if any, behind its delays.
#[derive(Debug, Clone, PartialEq)]
pub struct EtaEstimate {
    /// The prediction.
    pub prediction: EtaPrediction,
    /// First weather or traffic lookup that failed.
    pub unavailable: Option<SignalError>,
}

/// Predicts travel time between two points.
///
/// Traffic is read in the origin's zone and scaled for the departure hour;
/// weather is read at the trip midpoint. The estimate is exactly
/// `base + traffic + weather`.
#[derive(Debug)]
pub struct EtaPredictor<'a, W, T> {
    config: &'a EngineConfig,
    travel: &'a ZoneSpeedEstimator,
    environment: &'a EnvironmentalImpactEstimator<W, T>,
}

impl<'a, W, T> EtaPredictor<'a, W, T>
where
    W: WeatherProvider,
    T: TrafficProvider,
{
    /// Predictor over borrowed engine components.
    #[must_use]
    pub const fn new(
        config: &'a EngineConfig,
        travel: &'a ZoneSpeedEstimator,
        environment: &'a EnvironmentalImpactEstimator<W, T>,
    ) -> Self {
        Self {
            config,
            travel,
            environment,
        }
    }

    /// Predict the trip from `from` to `to` leaving at `departure`.
    ///
    /// # Errors
    /// Returns [`OptimizationError`] for unusable coordinates or non-finite
    /// results.
    pub fn predict(
        &self,
        from: Coord<f64>,
        to: Coord<f64>,
        departure: DateTime<Utc>,
    ) -> Result<EtaEstimate, OptimizationError> {
        if !is_finite_coord(from) {
            return Err(OptimizationError::non_finite("origin"));
        }
        if !is_finite_coord(to) {
            return Err(OptimizationError::non_finite("destination"));
        }
        let distance = haversine_miles(from, to);
        let base = OptimizationError::ensure_finite("base_time", self.travel.base_minutes(from, to))?;
        let hour = self.config.local_hour(departure);
        let traffic = self.environment.traffic_delay_minutes(from, hour);
        let weather = self.environment.weather_delay_minutes(midpoint(from, to));

        let estimate = base + traffic.value + weather.value;
        let prediction = EtaPrediction {
            destination: to,
            estimated_time_minutes: estimate,
            confidence_interval_min: (base * 0.5).max(estimate * 0.8),
            confidence_interval_max: estimate * 1.2,
            traffic_delay_minutes: traffic.value,
            weather_delay_minutes: weather.value,
            base_time_minutes: base,
            confidence_score: eta_confidence(distance, traffic.value, weather.value),
            factors: eta_factors(distance, traffic.value, weather.value),
        };
        OptimizationError::ensure_finite("estimated_time", prediction.estimated_time_minutes)?;
        log::debug!("predicted {estimate:.1} min over {distance:.2} mi");
        Ok(EtaEstimate {
            prediction,
            unavailable: traffic.unavailable.or(weather.unavailable),
        })
    }
}

/// Confidence for a prediction, in `[0.3, 0.95]`.
///
/// Distance sets the starting point (`1 − miles / 20`); traffic and weather
/// delays each subtract a capped penalty.
#[must_use]
pub fn eta_confidence(distance_miles: f64, traffic_minutes: f64, weather_minutes: f64) -> f64 {
    let by_distance = (1.0 - distance_miles / 20.0).clamp(0.3, 0.95);
    let traffic_penalty = (traffic_minutes / 20.0).min(0.3);
    let weather_penalty = (weather_minutes / 10.0).min(0.2);
    (by_distance - traffic_penalty - weather_penalty).clamp(0.3, 0.95)
}

/// Human-readable contributors worth surfacing.
#[must_use]
pub fn eta_factors(distance_miles: f64, traffic_minutes: f64, weather_minutes: f64) -> Vec<String> {
    let mut factors = Vec::new();
    if traffic_minutes > 2.0 {
        factors.push(format!("traffic delay (+{traffic_minutes:.1} min)"));
    }
    if weather_minutes > 1.0 {
        factors.push(format!("weather delay (+{weather_minutes:.1} min)"));
    }
    if distance_miles > 10.0 {
        factors.push(format!("long distance ({distance_miles:.1} mi)"));
    }
    factors
}

/// Distance-proportional prediction used when [`EtaPredictor::predict`]
/// fails.
///
/// # Errors
/// Returns [`OptimizationError::NonFiniteMetric`] when the distance itself
/// cannot be computed.
pub fn fallback_eta(from: Coord<f64>, to: Coord<f64>) -> Result<EtaPrediction, OptimizationError> {
    let distance = OptimizationError::ensure_finite("distance", haversine_miles(from, to))?;
    let minutes = distance * FALLBACK_MINUTES_PER_MILE;
    Ok(EtaPrediction {
        destination: to,
        estimated_time_minutes: minutes,
        confidence_interval_min: minutes * 0.8,
        confidence_interval_max: minutes * 1.5,
        traffic_delay_minutes: 0.0,
        weather_delay_minutes: 0.0,
        base_time_minutes: minutes,
        confidence_score: 0.5,
        factors: vec![FALLBACK_FACTOR.to_owned()],
    })
}

/// Zero-minute prediction with confidence 0.3, for when even the fallback
/// cannot be computed.
#[must_use]
pub fn emergency_eta(to: Coord<f64>) -> EtaPrediction {
    EtaPrediction {
        destination: to,
        estimated_time_minutes: 0.0,
        confidence_interval_min: 0.0,
        confidence_interval_max: 0.0,
        traffic_delay_minutes: 0.0,
        weather_delay_minutes: 0.0,
        base_time_minutes: 0.0,
        confidence_score: 0.3,
        factors: vec![FALLBACK_FACTOR.to_owned()],
    }
}
