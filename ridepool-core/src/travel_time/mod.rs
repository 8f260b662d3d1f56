//! Compute travel times between coordinates.
//!
//! The `TravelTimeProvider` trait abstracts pairwise travel-time estimates.
//! [`ZoneSpeedEstimator`] is the engine's base estimator: haversine distance
//! over the mean zone speed of both ends, before any traffic or weather
//! adjustment.

mod error;
mod provider;

pub use error::TravelTimeError;
pub use provider::{TravelTimeMatrix, TravelTimeProvider, ZoneSpeedEstimator};
