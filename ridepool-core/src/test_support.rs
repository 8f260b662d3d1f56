//! Deterministic signal providers and record builders for unit and behaviour
//! tests.

use std::collections::BTreeMap;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use geo::Coord;

use crate::{
    RideRequest, SignalError, SignalKind, TimeWindow, TrafficProvider, TrafficReport, Waypoint,
    WaypointKind, WeatherCondition, WeatherProvider, WeatherReport, ZoneId,
};

/// Centroid of the `downtown` zone.
pub const DOWNTOWN: Coord<f64> = Coord { x: -94.209, y: 36.373 };
/// Centroid of the `airport` zone.
pub const AIRPORT: Coord<f64> = Coord { x: -94.220, y: 36.385 };
/// Centroid of the `business` zone.
pub const BUSINESS: Coord<f64> = Coord { x: -94.200, y: 36.365 };
/// Centroid of the `residential` zone.
pub const RESIDENTIAL: Coord<f64> = Coord { x: -94.195, y: 36.380 };
/// Centroid of the `retail` zone.
pub const RETAIL: Coord<f64> = Coord { x: -94.208, y: 36.368 };

/// Weather provider reporting the same condition everywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedWeather {
    report: WeatherReport,
}

impl FixedWeather {
    /// Report `condition` at every coordinate.
    #[must_use]
    pub fn new(condition: WeatherCondition) -> Self {
        Self {
            report: WeatherReport::new(condition),
        }
    }
}

impl WeatherProvider for FixedWeather {
    fn weather_at(&self, _location: Coord<f64>) -> Result<Option<WeatherReport>, SignalError> {
        Ok(Some(self.report.clone()))
    }
}

/// Traffic provider reporting the same delay in every zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedTraffic {
    delay_minutes: f64,
}

impl FixedTraffic {
    /// Report `delay_minutes` in every zone.
    #[must_use]
    pub const fn new(delay_minutes: f64) -> Self {
        Self { delay_minutes }
    }
}

impl TrafficProvider for FixedTraffic {
    fn traffic_in(&self, _zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        Ok(Some(TrafficReport::new(self.delay_minutes)))
    }
}

/// Traffic provider with per-zone delays; other zones have no coverage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ZoneTraffic {
    delays: BTreeMap<ZoneId, f64>,
}

impl ZoneTraffic {
    /// Build from `(zone, delay_minutes)` pairs.
    pub fn new<I, Z>(delays: I) -> Self
    where
        I: IntoIterator<Item = (Z, f64)>,
        Z: Into<ZoneId>,
    {
        Self {
            delays: delays.into_iter().map(|(z, d)| (z.into(), d)).collect(),
        }
    }
}

impl TrafficProvider for ZoneTraffic {
    fn traffic_in(&self, zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        Ok(self.delays.get(zone).map(|delay| TrafficReport::new(*delay)))
    }
}

/// Provider whose every lookup fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FailingSignals;

impl WeatherProvider for FailingSignals {
    fn weather_at(&self, _location: Coord<f64>) -> Result<Option<WeatherReport>, SignalError> {
        Err(SignalError::Unavailable {
            signal: SignalKind::Weather,
            reason: "feed offline".to_owned(),
        })
    }
}

impl TrafficProvider for FailingSignals {
    fn traffic_in(&self, _zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        Err(SignalError::Unavailable {
            signal: SignalKind::Traffic,
            reason: "feed offline".to_owned(),
        })
    }
}

/// Provider that sleeps before delegating.
#[derive(Debug, Clone)]
pub struct SlowSignals<P> {
    delay: Duration,
    inner: P,
}

impl<P> SlowSignals<P> {
    /// Delay every lookup on `inner` by `delay`.
    #[must_use]
    pub const fn new(delay: Duration, inner: P) -> Self {
        Self { delay, inner }
    }
}

impl<P: WeatherProvider> WeatherProvider for SlowSignals<P> {
    fn weather_at(&self, location: Coord<f64>) -> Result<Option<WeatherReport>, SignalError> {
        thread::sleep(self.delay);
        self.inner.weather_at(location)
    }
}

impl<P: TrafficProvider> TrafficProvider for SlowSignals<P> {
    fn traffic_in(&self, zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        thread::sleep(self.delay);
        self.inner.traffic_in(zone)
    }
}

/// 1 September 2025 at `hour:minute` UTC.
#[must_use]
pub fn instant(hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2025, 9, 1)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .map_or(DateTime::UNIX_EPOCH, |naive| naive.and_utc())
}

/// Ride request `id` for passenger `pass_{id}`.
#[must_use]
pub fn ride_request(id: &str, pickup: Coord<f64>, at: DateTime<Utc>) -> RideRequest {
    RideRequest::new(id, format!("pass_{id}"), pickup, at)
}

/// Pickup for `passenger` with a ±5 minute window and two minutes of service.
#[must_use]
pub fn pickup(passenger: &str, location: Coord<f64>, at: DateTime<Utc>) -> Waypoint {
    Waypoint::new(
        format!("{passenger}_pickup"),
        WaypointKind::Pickup,
        location,
        passenger,
        TimeWindow::around(at, TimeDelta::minutes(5)),
    )
    .with_service_time(Duration::from_secs(120))
}

/// Dropoff for `passenger` with a one-hour window and one minute of service.
#[must_use]
pub fn dropoff(passenger: &str, location: Coord<f64>, at: DateTime<Utc>) -> Waypoint {
    Waypoint::new(
        format!("{passenger}_dropoff"),
        WaypointKind::Dropoff,
        location,
        passenger,
        TimeWindow::starting_at(at, TimeDelta::hours(1)),
    )
    .with_service_time(Duration::from_secs(60))
}
