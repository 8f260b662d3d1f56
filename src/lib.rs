//! Facade crate for the ridepool route optimization engine.
//!
//! This crate re-exports the domain types from `ridepool-core` and the
//! [`RouteOptimizationEngine`] from `ridepool-solver`, so dispatch services
//! depend on a single crate.
//!
//! ```
//! use ridepool_engine::{Coord, RouteOptimizationEngine, RouteStrategy};
//!
//! let engine = RouteOptimizationEngine::default();
//! let route = engine
//!     .optimize_pickup_route("driver_1", Coord { x: -94.209, y: 36.373 }, &[])
//!     .into_value();
//! assert_eq!(route.strategy, RouteStrategy::NoRequests);
//! assert_eq!(route.confidence_score, 1.0);
//! ```

#![forbid(unsafe_code)]

pub use geo::Coord;

pub use ridepool_core::{
    ConfigError, Deadline, DegradeReason, EfficiencyWeights, EngineConfig, EtaPrediction,
    FareSchedule, NoSignals, OptimizationError, Outcome, PoolMatch, RideRequest, Route,
    RouteStrategy, SignalError, SignalKind, TimeWindow, TrafficProvider, TrafficReport,
    TrafficSeverity, Waypoint, WaypointKind, WeatherCondition, WeatherProvider, WeatherReport,
    Zone, ZoneId, ZoneTable, haversine_miles,
};
pub use ridepool_solver::{RouteCheck, RouteOptimizationEngine};
