//! Typed weather and traffic signals.
//!
//! The engine never fetches conditions itself. Callers plug in a
//! [`WeatherProvider`] and a [`TrafficProvider`]; each lookup returns
//! `Ok(Some(report))`, `Ok(None)` when the feed has no coverage (treated as
//! neutral), or a [`SignalError`] when the feed failed. Failures degrade the
//! result but are never retried. Wrap a provider in [`Deadline`] to bound how
//! long a lookup may take.

mod deadline;
mod error;
mod traffic;
mod weather;

use std::sync::Arc;

use geo::Coord;

pub use deadline::Deadline;
pub use error::{SignalError, SignalKind};
pub use traffic::{TrafficReport, TrafficSeverity};
pub use weather::{WeatherCondition, WeatherReport};

use crate::zone::ZoneId;

/// Source of weather conditions at a coordinate.
pub trait WeatherProvider {
    /// Weather at `location`, `Ok(None)` when the feed has no coverage there.
    ///
    /// # Errors
    /// Returns [`SignalError`] when the feed cannot answer.
    fn weather_at(&self, location: Coord<f64>) -> Result<Option<WeatherReport>, SignalError>;
}

/// Source of traffic delay for a zone.
pub trait TrafficProvider {
    /// Traffic in `zone`, `Ok(None)` when the feed has no coverage there.
    ///
    /// # Errors
    /// Returns [`SignalError`] when the feed cannot answer.
    fn traffic_in(&self, zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError>;
}

impl<P: WeatherProvider + ?Sized> WeatherProvider for &P {
    fn weather_at(&self, location: Coord<f64>) -> Result<Option<WeatherReport>, SignalError> {
        (**self).weather_at(location)
    }
}

impl<P: WeatherProvider + ?Sized> WeatherProvider for Arc<P> {
    fn weather_at(&self, location: Coord<f64>) -> Result<Option<WeatherReport>, SignalError> {
        (**self).weather_at(location)
    }
}

impl<P: TrafficProvider + ?Sized> TrafficProvider for &P {
    fn traffic_in(&self, zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        (**self).traffic_in(zone)
    }
}

impl<P: TrafficProvider + ?Sized> TrafficProvider for Arc<P> {
    fn traffic_in(&self, zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        (**self).traffic_in(zone)
    }
}

/// Provider with no coverage anywhere: every lookup is neutral.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NoSignals;

impl WeatherProvider for NoSignals {
    fn weather_at(&self, _location: Coord<f64>) -> Result<Option<WeatherReport>, SignalError> {
        Ok(None)
    }
}

impl TrafficProvider for NoSignals {
    fn traffic_in(&self, _zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        Ok(None)
    }
}
