use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use geo::Coord;

use super::{SignalError, SignalKind, TrafficProvider, TrafficReport, WeatherProvider, WeatherReport};
use crate::zone::ZoneId;

/// Bound every lookup on a provider by a timeout.
///
/// Each call runs once on a short-lived helper thread. If the answer does not
/// arrive in time the call fails with [`SignalError::TimedOut`]; the helper is
/// left to finish on its own and its late answer is discarded. There are no
/// retries.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use geo::Coord;
/// use ridepool_core::{Deadline, NoSignals, WeatherProvider};
///
/// let bounded = Deadline::new(NoSignals, Duration::from_millis(50));
/// assert_eq!(bounded.weather_at(Coord { x: 0.0, y: 0.0 }), Ok(None));
/// ```
#[derive(Debug)]
pub struct Deadline<P> {
    inner: Arc<P>,
    timeout: Duration,
}

impl<P> Clone for Deadline<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            timeout: self.timeout,
        }
    }
}

impl<P> Deadline<P> {
    /// Wrap `provider`, allowing each lookup at most `timeout`.
    #[must_use]
    pub fn new(provider: P, timeout: Duration) -> Self {
        Self::from_arc(Arc::new(provider), timeout)
    }

    /// Wrap an already shared provider.
    #[must_use]
    pub const fn from_arc(provider: Arc<P>, timeout: Duration) -> Self {
        Self {
            inner: provider,
            timeout,
        }
    }

    /// Configured timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    fn bounded<T, F>(&self, signal: SignalKind, call: F) -> Result<T, SignalError>
    where
        P: Send + Sync + 'static,
        T: Send + 'static,
        F: FnOnce(&P) -> Result<T, SignalError> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let provider = Arc::clone(&self.inner);
        thread::Builder::new()
            .name(format!("{signal}-signal"))
            .spawn(move || {
                if tx.send(call(&provider)).is_err() {
                    log::debug!("{signal} answer arrived after the deadline");
                }
            })
            .map_err(|err| SignalError::ProviderFailed {
                signal,
                message: format!("could not start lookup: {err}"),
            })?;

        match rx.recv_timeout(self.timeout) {
            Ok(answer) => answer,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("{signal} lookup exceeded {:?}", self.timeout);
                Err(SignalError::TimedOut {
                    signal,
                    after: self.timeout,
                })
            }
            Err(RecvTimeoutError::Disconnected) => Err(SignalError::ProviderFailed {
                signal,
                message: "lookup ended without an answer".to_owned(),
            }),
        }
    }
}

impl<P> WeatherProvider for Deadline<P>
where
    P: WeatherProvider + Send + Sync + 'static,
{
    fn weather_at(&self, location: Coord<f64>) -> Result<Option<WeatherReport>, SignalError> {
        self.bounded(SignalKind::Weather, move |provider| {
            provider.weather_at(location)
        })
    }
}

impl<P> TrafficProvider for Deadline<P>
where
    P: TrafficProvider + Send + Sync + 'static,
{
    fn traffic_in(&self, zone: &ZoneId) -> Result<Option<TrafficReport>, SignalError> {
        let zone = zone.clone();
        self.bounded(SignalKind::Traffic, move |provider| provider.traffic_in(&zone))
    }
}
