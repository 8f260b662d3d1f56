use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Which environmental feed a signal came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// Weather conditions at a coordinate.
    Weather,
    /// Traffic delay in a zone.
    Traffic,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Weather => "weather",
            Self::Traffic => "traffic",
        })
    }
}

/// Errors from [`WeatherProvider`](super::WeatherProvider) and
/// [`TrafficProvider`](super::TrafficProvider) lookups.
///
/// Callers never retry: any of these substitutes the neutral signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    /// The provider reported that it cannot serve the request.
    #[error("{signal} signal unavailable: {reason}")]
    Unavailable {
        /// Feed that failed.
        signal: SignalKind,
        /// Provider-supplied description.
        reason: String,
    },
    /// The lookup did not finish within the configured timeout.
    #[error("{signal} lookup timed out after {after:?}")]
    TimedOut {
        /// Feed that failed.
        signal: SignalKind,
        /// Timeout that elapsed.
        after: Duration,
    },
    /// The provider failed while answering, e.g. its worker went away.
    #[error("{signal} provider failed: {message}")]
    ProviderFailed {
        /// Feed that failed.
        signal: SignalKind,
        /// Failure description.
        message: String,
    },
}

impl SignalError {
    /// Feed the error belongs to.
    #[must_use]
    pub const fn signal(&self) -> SignalKind {
        match self {
            Self::Unavailable { signal, .. }
            | Self::TimedOut { signal, .. }
            | Self::ProviderFailed { signal, .. } => *signal,
        }
    }
}
