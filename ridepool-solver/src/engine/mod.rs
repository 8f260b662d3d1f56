//! `RouteOptimizationEngine`: the four dispatch operations behind one value.
//!
//! Each operation catches failures at a single point and returns an
//! [`Outcome`]: the primary result, a fallback marked
//! [`DegradeReason::Optimization`], or a last-resort value marked
//! [`DegradeReason::FallbackFailed`]. Signal failures never abort an
//! operation; they surface as [`DegradeReason::SignalUnavailable`] unless an
//! optimization failure outranks them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use geo::Coord;
use ridepool_core::{
    ConfigError, Deadline, DegradeReason, EngineConfig, EnvironmentalImpactEstimator,
    EtaPrediction, NoSignals, Outcome, PoolMatch, RideRequest, Route, TrafficProvider, Waypoint,
    WeatherProvider, ZoneSpeedEstimator,
};

use crate::eta::{EtaEstimate, EtaPredictor, emergency_eta, fallback_eta};
use crate::multi_stop::MultiStopSequencer;
use crate::planner::{PickupPlanner, PlannedRoute};
use crate::pool::PoolMatcher;
use crate::validator::{RouteCheck, trim_to_capacity, validate_route};

/// Route and pooling optimization over a zone table and two signal feeds.
///
/// The engine holds only read-only state, so it is `Send + Sync` whenever
/// its providers are and every operation takes `&self`.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use geo::Coord;
/// use ridepool_core::{RideRequest, RouteStrategy};
/// use ridepool_solver::RouteOptimizationEngine;
///
/// let engine = RouteOptimizationEngine::default();
/// let driver = Coord { x: -94.209, y: 36.373 };
/// let request = RideRequest::new("r1", "p1", Coord { x: -94.22, y: 36.385 }, Utc::now());
///
/// let route = engine.optimize_pickup_route("d1", driver, &[request]).into_value();
/// assert_eq!(route.strategy, RouteStrategy::DirectPickup);
/// assert_eq!(route.waypoints.len(), 1);
/// ```
#[derive(Debug)]
pub struct RouteOptimizationEngine<W = NoSignals, T = NoSignals> {
    config: Arc<EngineConfig>,
    travel: ZoneSpeedEstimator,
    environment: EnvironmentalImpactEstimator<W, T>,
}

impl RouteOptimizationEngine {
    /// Engine without weather or traffic feeds.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        Self::with_signals(config, NoSignals, NoSignals)
    }
}

impl Default for RouteOptimizationEngine {
    fn default() -> Self {
        Self::assemble(Arc::new(EngineConfig::default()), NoSignals, NoSignals)
    }
}

impl<W, T> RouteOptimizationEngine<Deadline<W>, Deadline<T>>
where
    W: WeatherProvider + Send + Sync + 'static,
    T: TrafficProvider + Send + Sync + 'static,
{
    /// Engine whose signal lookups give up after the configured timeout.
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn with_bounded_signals(
        config: EngineConfig,
        weather: W,
        traffic: T,
    ) -> Result<Self, ConfigError> {
        let timeout = config.signal_timeout();
        Self::with_signals(
            config,
            Deadline::new(weather, timeout),
            Deadline::new(traffic, timeout),
        )
    }
}

impl<W, T> RouteOptimizationEngine<W, T>
where
    W: WeatherProvider,
    T: TrafficProvider,
{
    /// Engine over the given feeds. Lookups are not time-bounded; see
    /// [`RouteOptimizationEngine::with_bounded_signals`].
    ///
    /// # Errors
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn with_signals(config: EngineConfig, weather: W, traffic: T) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "route engine ready: {} zones, {} ms signal timeout",
            config.zones.len(),
            config.signal_timeout_ms
        );
        Ok(Self::assemble(Arc::new(config), weather, traffic))
    }

    fn assemble(config: Arc<EngineConfig>, weather: W, traffic: T) -> Self {
        Self {
            travel: ZoneSpeedEstimator::new(Arc::clone(&config)),
            environment: EnvironmentalImpactEstimator::new(weather, traffic, Arc::clone(&config)),
            config,
        }
    }

    /// Configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn planner(&self) -> PickupPlanner<'_, W, T> {
        PickupPlanner::new(&self.config, &self.travel, &self.environment)
    }

    /// Order pickups for a driver, as of now.
    pub fn optimize_pickup_route(
        &self,
        driver_id: &str,
        driver_location: Coord<f64>,
        requests: &[RideRequest],
    ) -> Outcome<Route> {
        self.optimize_pickup_route_at(driver_id, driver_location, requests, Utc::now())
    }

    /// Order pickups for a driver as of `now`.
    ///
    /// No requests yield an empty `no_requests` route with confidence 1.0.
    /// When planning fails the requests are kept in input order with rough
    /// estimates; when that fails too an empty `emergency_fallback` route is
    /// returned.
    pub fn optimize_pickup_route_at(
        &self,
        driver_id: &str,
        driver_location: Coord<f64>,
        requests: &[RideRequest],
        now: DateTime<Utc>,
    ) -> Outcome<Route> {
        log::debug!(
            "optimizing pickup route for driver {driver_id} with {} requests",
            requests.len()
        );
        if requests.is_empty() {
            return Outcome::Full(Route::no_requests(driver_id, now));
        }
        let planner = self.planner();
        match planner.plan(driver_id, driver_location, requests, now) {
            Ok(PlannedRoute { route, unavailable }) => {
                if let Some(error) = &unavailable {
                    log::warn!("route for driver {driver_id} uses neutral multipliers: {error}");
                }
                Outcome::new(route, unavailable.map(DegradeReason::SignalUnavailable))
            }
            Err(error) => {
                log::warn!("pickup planning for driver {driver_id} failed: {error}; using fallback route");
                match planner.fallback(driver_id, requests, now) {
                    Ok(route) => Outcome::Degraded {
                        value: route,
                        reason: DegradeReason::Optimization(error),
                    },
                    Err(fallback_error) => {
                        log::warn!(
                            "fallback route for driver {driver_id} failed: {fallback_error}; returning emergency route"
                        );
                        Outcome::Degraded {
                            value: Route::emergency(driver_id, now),
                            reason: DegradeReason::FallbackFailed(fallback_error),
                        }
                    }
                }
            }
        }
    }

    /// Up to `max_matches` pooling candidates, best first.
    ///
    /// Fewer than two requests yield an empty list. A request with an
    /// unusable coordinate degrades the whole call to an empty list.
    pub fn find_pool_ride_matches(
        &self,
        requests: &[RideRequest],
        max_matches: usize,
    ) -> Outcome<Vec<PoolMatch>> {
        log::debug!(
            "matching pools across {} requests (limit {max_matches})",
            requests.len()
        );
        match PoolMatcher::new(&self.config, &self.travel).find_matches(requests, max_matches) {
            Ok(matches) => Outcome::Full(matches),
            Err(error) => {
                log::warn!("pool matching failed: {error}; returning no matches");
                Outcome::Degraded {
                    value: Vec::new(),
                    reason: DegradeReason::Optimization(error),
                }
            }
        }
    }

    /// Predict travel from `from` to `to`, leaving at `departure` or now.
    ///
    /// The prediction always satisfies `min <= estimate <= max`. When the
    /// primary estimate fails a distance-proportional fallback is returned
    /// with the single factor `"fallback estimation"`.
    pub fn predict_eta(
        &self,
        from: Coord<f64>,
        to: Coord<f64>,
        departure: Option<DateTime<Utc>>,
    ) -> Outcome<EtaPrediction> {
        let leaving = departure.unwrap_or_else(Utc::now);
        log::debug!("predicting arrival at ({:.5}, {:.5})", to.y, to.x);
        let predictor = EtaPredictor::new(&self.config, &self.travel, &self.environment);
        match predictor.predict(from, to, leaving) {
            Ok(EtaEstimate {
                prediction,
                unavailable,
            }) => {
                if let Some(error) = &unavailable {
                    log::warn!("arrival prediction uses neutral delays: {error}");
                }
                Outcome::new(prediction, unavailable.map(DegradeReason::SignalUnavailable))
            }
            Err(error) => {
                log::warn!("arrival prediction failed: {error}; using fallback estimate");
                match fallback_eta(from, to) {
                    Ok(prediction) => Outcome::Degraded {
                        value: prediction,
                        reason: DegradeReason::Optimization(error),
                    },
                    Err(fallback_error) => {
                        log::warn!("fallback estimate failed: {fallback_error}");
                        Outcome::Degraded {
                            value: emergency_eta(to),
                            reason: DegradeReason::FallbackFailed(fallback_error),
                        }
                    }
                }
            }
        }
    }

    /// Order a mixed set of waypoints for one vehicle, as of now.
    pub fn optimize_multi_stop_route(
        &self,
        waypoints: &[Waypoint],
        vehicle_capacity: usize,
    ) -> Outcome<Vec<Waypoint>> {
        self.optimize_multi_stop_route_at(waypoints, vehicle_capacity, Utc::now())
    }

    /// Order a mixed set of waypoints for one vehicle as of `now`.
    ///
    /// Pickups beyond `vehicle_capacity` are dropped by priority score along
    /// with their dropoffs. On failure the trimmed input order is returned.
    pub fn optimize_multi_stop_route_at(
        &self,
        waypoints: &[Waypoint],
        vehicle_capacity: usize,
        now: DateTime<Utc>,
    ) -> Outcome<Vec<Waypoint>> {
        log::debug!(
            "optimizing {} waypoints for capacity {vehicle_capacity}",
            waypoints.len()
        );
        let sequencer = MultiStopSequencer::new(&self.travel, self.config.exact_multi_stop_limit);
        match sequencer.optimize(waypoints, vehicle_capacity, now) {
            Ok(plan) => {
                if !plan.dropped.is_empty() {
                    log::info!(
                        "capacity {vehicle_capacity} dropped {}",
                        plan.dropped.join(", ")
                    );
                }
                Outcome::Full(plan.waypoints)
            }
            Err(error) => {
                log::warn!("multi-stop sequencing failed: {error}; keeping input order");
                Outcome::Degraded {
                    value: trim_to_capacity(waypoints, vehicle_capacity, now).kept,
                    reason: DegradeReason::Optimization(error),
                }
            }
        }
    }

    /// Check a sequence against capacity and time windows.
    #[must_use]
    pub fn validate_route(
        &self,
        sequence: &[Waypoint],
        vehicle_capacity: usize,
        departure: DateTime<Utc>,
    ) -> RouteCheck {
        validate_route(sequence, vehicle_capacity, departure, &self.travel)
    }
}
