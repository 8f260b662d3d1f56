//! Pickup route planning for one driver.

use chrono::{DateTime, Utc};
use geo::Coord;
use ridepool_core::{
    EngineConfig, EnvironmentalImpactEstimator, OptimizationError, RideRequest, Route,
    RouteStrategy, SignalError, TrafficProvider, TravelTimeProvider, Waypoint, WaypointKind,
    WeatherProvider, ZoneSpeedEstimator, is_finite_coord, path_miles,
};

use crate::scoring::{efficiency_score, estimated_earnings, round_cents, route_confidence};
use crate::sequencer::{RouteSequencer, order_cost};

/// Rough pace assumed by the fallback route.
pub const FALLBACK_MINUTES_PER_MILE: f64 = 2.5;
/// Flat earnings per request assumed by the fallback route.
pub const FALLBACK_FARE_PER_REQUEST: f64 = 12.0;

/// A planned route and the signal failure, if any, behind its multipliers.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    /// The route.
    pub route: Route,
    /// First weather or traffic lookup that failed.
    pub unavailable: Option<SignalError>,
}

/// Builds scored pickup routes from pending requests.
#[derive(Debug)]
pub struct PickupPlanner<'a, W, T> {
    config: &'a EngineConfig,
    travel: &'a ZoneSpeedEstimator,
    environment: &'a EnvironmentalImpactEstimator<W, T>,
}

impl<'a, W, T> PickupPlanner<'a, W, T>
where
    W: WeatherProvider,
    T: TrafficProvider,
{
    /// Planner over borrowed engine components.
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

    /// Sequence and score pickups for `requests`.
    ///
    /// # Errors
    /// Returns [`OptimizationError`] when a coordinate is unusable or a metric
    /// comes out non-finite.
    pub fn plan(
        &self,
        driver_id: &str,
        driver_location: Coord<f64>,
        requests: &[RideRequest],
        now: DateTime<Utc>,
    ) -> Result<PlannedRoute, OptimizationError> {
        if !is_finite_coord(driver_location) {
            return Err(OptimizationError::non_finite("driver_start"));
        }
        let stops = self.pickups(requests)?;
        if stops.is_empty() {
            return Ok(PlannedRoute {
                route: Route::no_requests(driver_id, now),
                unavailable: None,
            });
        }

        let stop_points: Vec<Coord<f64>> = stops.iter().map(|w| w.location).collect();
        let points: Vec<Coord<f64>> = std::iter::once(driver_location)
            .chain(stop_points.iter().copied())
            .collect();
        let matrix = self
            .travel
            .travel_time_matrix(&points)
            .map_err(|err| OptimizationError::InvalidInput {
                reason: err.to_string(),
            })?;
        let service: Vec<f64> = stops.iter().map(Waypoint::service_minutes).collect();

        let sequence = RouteSequencer::new(self.config.exhaustive_search_limit).sequence(
            driver_location,
            &stop_points,
            &matrix,
            &service,
        )?;
        let unadjusted_minutes = order_cost(&matrix, &service, &sequence.order)?;
        let ordered: Vec<Waypoint> = sequence
            .order
            .iter()
            .filter_map(|i| stops.get(*i).cloned())
            .collect();
        let full: Vec<Waypoint> = std::iter::once(Waypoint::driver_start(driver_location, now))
            .chain(ordered.iter().cloned())
            .collect();
        let full_points: Vec<Coord<f64>> = full.iter().map(|w| w.location).collect();

        let distance = OptimizationError::ensure_finite(
            "total_distance",
            path_miles(full_points.iter().copied()),
        )?;
        let impact = self.environment.route_impact(&full_points);
        let total_time = OptimizationError::ensure_finite(
            "total_time",
            unadjusted_minutes * impact.traffic * impact.weather,
        )?;
        let pickups = ordered
            .iter()
            .filter(|w| w.kind == WaypointKind::Pickup)
            .count();

        log::debug!(
            "planned {} pickup(s) for {driver_id} using {}",
            ordered.len(),
            sequence.strategy
        );
        let route = Route {
            driver_id: driver_id.to_owned(),
            efficiency_score: efficiency_score(
                &full,
                distance,
                total_time,
                &self.config.efficiency,
            ),
            estimated_earnings: estimated_earnings(pickups, distance, &self.config.fares),
            confidence_score: route_confidence(&ordered),
            waypoints: ordered,
            total_distance_miles: distance,
            total_time_minutes: total_time,
            passenger_count: pickups,
            traffic_impact: impact.traffic,
            weather_impact: impact.weather,
            strategy: sequence.strategy,
            created_at: now,
        };
        Ok(PlannedRoute {
            route,
            unavailable: impact.unavailable,
        })
    }

    /// Requests in input order with rough estimates.
    ///
    /// # Errors
    /// Returns [`OptimizationError`] when a request coordinate is unusable.
    pub fn fallback(
        &self,
        driver_id: &str,
        requests: &[RideRequest],
        now: DateTime<Utc>,
    ) -> Result<Route, OptimizationError> {
        let stops = self.pickups(requests)?;
        let distance = OptimizationError::ensure_finite(
            "total_distance",
            path_miles(stops.iter().map(|w| w.location)),
        )?;
        let service: f64 = stops.iter().map(Waypoint::service_minutes).sum();
        #[expect(clippy::cast_precision_loss, reason = "request counts are tiny")]
        let count = stops.len() as f64;
        Ok(Route {
            driver_id: driver_id.to_owned(),
            total_distance_miles: distance,
            total_time_minutes: distance * FALLBACK_MINUTES_PER_MILE + service,
            passenger_count: stops.len(),
            efficiency_score: 0.6,
            estimated_earnings: round_cents(count * FALLBACK_FARE_PER_REQUEST),
            traffic_impact: 1.2,
            weather_impact: 1.1,
            confidence_score: 0.5,
            strategy: RouteStrategy::Fallback,
            created_at: now,
            waypoints: stops,
        })
    }

    fn pickups(&self, requests: &[RideRequest]) -> Result<Vec<Waypoint>, OptimizationError> {
        requests
            .iter()
            .map(|request| {
                let waypoint = request.pickup_waypoint(self.config);
                if is_finite_coord(waypoint.location) {
                    Ok(waypoint)
                } else {
                    Err(OptimizationError::non_finite(waypoint.id))
                }
            })
            .collect()
    }
}
