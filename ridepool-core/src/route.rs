//! Optimized routes.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::waypoint::Waypoint;

/// How a route's order was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RouteStrategy {
    /// Nothing to sequence.
    NoRequests,
    /// A single pickup, driven to directly.
    DirectPickup,
    /// Every ordering was evaluated.
    ExhaustiveSearch,
    /// Greedy nearest-neighbor ordering.
    NearestNeighborHeuristic,
    /// Input order with rough estimates, after optimization failed.
    Fallback,
    /// Empty last-resort route, after the fallback failed too.
    EmergencyFallback,
}

impl RouteStrategy {
    /// Snake-case tag, e.g. `"exhaustive_search"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoRequests => "no_requests",
            Self::DirectPickup => "direct_pickup",
            Self::ExhaustiveSearch => "exhaustive_search",
            Self::NearestNeighborHeuristic => "nearest_neighbor_heuristic",
            Self::Fallback => "fallback",
            Self::EmergencyFallback => "emergency_fallback",
        }
    }
}

impl fmt::Display for RouteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered sequence of stops assigned to one driver.
///
/// `waypoints` never includes the driver's own start point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Driver the route belongs to.
    pub driver_id: String,
    /// Stops in visiting order.
    pub waypoints: Vec<Waypoint>,
    /// Total driven distance in miles.
    pub total_distance_miles: f64,
    /// Travel plus service minutes, adjusted for traffic and weather.
    pub total_time_minutes: f64,
    /// Passengers picked up along the route.
    pub passenger_count: usize,
    /// Efficiency in `[0, 1]`.
    pub efficiency_score: f64,
    /// Estimated driver earnings in dollars.
    pub estimated_earnings: f64,
    /// Route-level traffic multiplier.
    pub traffic_impact: f64,
    /// Route-level weather multiplier.
    pub weather_impact: f64,
    /// Trust in the estimate, in `[0, 1]`.
    pub confidence_score: f64,
    /// How the order was chosen.
    pub strategy: RouteStrategy,
    /// When the route was produced.
    pub created_at: DateTime<Utc>,
}

impl Route {
    /// Route with no stops for a driver with nothing to do.
    #[must_use]
    pub fn no_requests(driver_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            driver_id: driver_id.into(),
            waypoints: Vec::new(),
            total_distance_miles: 0.0,
            total_time_minutes: 0.0,
            passenger_count: 0,
            efficiency_score: 1.0,
            estimated_earnings: 0.0,
            traffic_impact: 1.0,
            weather_impact: 1.0,
            confidence_score: 1.0,
            strategy: RouteStrategy::NoRequests,
            created_at: now,
        }
    }

    /// Last-resort empty route with confidence 0.3.
    #[must_use]
    pub fn emergency(driver_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            efficiency_score: 0.0,
            confidence_score: 0.3,
            strategy: RouteStrategy::EmergencyFallback,
            ..Self::no_requests(driver_id, now)
        }
    }

    /// Sum of service minutes over the route's stops.
    #[must_use]
    pub fn service_minutes(&self) -> f64 {
        self.waypoints.iter().map(Waypoint::service_minutes).sum()
    }

    /// Stop identifiers in visiting order.
    pub fn waypoint_ids(&self) -> impl Iterator<Item = &str> {
        self.waypoints.iter().map(|w| w.id.as_str())
    }
}
