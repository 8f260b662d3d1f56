//! Core domain types for the ridepool engine.
//!
//! This crate holds the records the engine exchanges with its callers
//! ([`Waypoint`], [`Route`], [`PoolMatch`], [`EtaPrediction`],
//! [`RideRequest`]), the reference data it reads ([`ZoneTable`],
//! [`EngineConfig`]), and the estimators shared by every solver:
//!
//! - great-circle distance and zone classification ([`haversine_miles`],
//!   [`ZoneTable::classify`]);
//! - base travel time from zone speeds ([`ZoneSpeedEstimator`]);
//! - traffic and weather impact from pluggable feeds
//!   ([`EnvironmentalImpactEstimator`], [`WeatherProvider`],
//!   [`TrafficProvider`]).
//!
//! Public engine operations never fail outright. They return an [`Outcome`],
//! which is either a full result or a degraded one carrying a
//! [`DegradeReason`].

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod config;
mod environment;
mod error;
mod eta;
mod outcome;
mod pool;
mod request;
mod route;
pub mod signals;
mod spatial;
pub mod travel_time;
mod waypoint;
mod zone;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use config::{
    ConfigError, EfficiencyWeights, EngineConfig, FareSchedule, MAX_EXACT_MULTI_STOP_LIMIT,
    MAX_EXHAUSTIVE_SEARCH_LIMIT,
};
pub use environment::{EnvironmentalImpactEstimator, Reading, RouteImpact, TimeOfDay};
pub use error::OptimizationError;
pub use eta::EtaPrediction;
pub use outcome::{DegradeReason, Outcome};
pub use pool::PoolMatch;
pub use request::{RideRequest, minutes_delta, minutes_duration};
pub use route::{Route, RouteStrategy};
pub use signals::{
    Deadline, NoSignals, SignalError, SignalKind, TrafficProvider, TrafficReport, TrafficSeverity,
    WeatherCondition, WeatherProvider, WeatherReport,
};
pub use spatial::{EARTH_RADIUS_MILES, haversine_miles, is_finite_coord, midpoint, path_miles};
pub use travel_time::{TravelTimeError, TravelTimeMatrix, TravelTimeProvider, ZoneSpeedEstimator};
pub use waypoint::{
    TimeWindow, Waypoint, WaypointError, WaypointKind, delta_minutes, saturating_add,
};
pub use zone::{Zone, ZoneId, ZoneMatch, ZoneTable};
