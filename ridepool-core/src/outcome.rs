//! Full or degraded results.
//!
//! Every public engine operation returns an [`Outcome`]. The wrapped value is
//! always well-formed; a [`Outcome::Degraded`] result additionally names why
//! the engine had to fall back, so the policy is visible in the signature
//! instead of being buried in error handling.

use thiserror::Error;

use crate::error::OptimizationError;
use crate::signals::SignalError;

/// Why a result is degraded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DegradeReason {
    /// A weather or traffic lookup failed or timed out; neutral values were
    /// substituted.
    #[error("environmental signal unavailable")]
    SignalUnavailable(#[source] SignalError),
    /// The primary computation failed and a fallback result was produced.
    #[error("optimization failed; fallback used")]
    Optimization(#[source] OptimizationError),
    /// Both the primary computation and its fallback failed; the value is the
    /// last-resort default.
    #[error("fallback failed; emergency result used")]
    FallbackFailed(#[source] OptimizationError),
}

/// Result of a public engine operation.
///
/// # Examples
/// ```
/// use ridepool_core::{DegradeReason, OptimizationError, Outcome};
///
/// let full = Outcome::Full(3);
/// assert!(!full.is_degraded());
///
/// let degraded = Outcome::Degraded {
///     value: 0,
///     reason: DegradeReason::Optimization(OptimizationError::NonFiniteMetric {
///         metric: "total_time",
///     }),
/// };
/// assert!(degraded.is_degraded());
/// assert_eq!(degraded.into_value(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum Outcome<T> {
    /// The primary computation succeeded with every signal available.
    Full(T),
    /// A usable but degraded result.
    Degraded {
        /// The degraded value.
        value: T,
        /// Cause of the degradation.
        reason: DegradeReason,
    },
}

impl<T> Outcome<T> {
    /// Wrap `value`, degrading it when `reason` is present.
    pub fn new(value: T, reason: Option<DegradeReason>) -> Self {
        match reason {
            Some(reason) => Self::Degraded { value, reason },
            None => Self::Full(value),
        }
    }

    /// Borrow the value.
    #[must_use]
    pub const fn value(&self) -> &T {
        match self {
            Self::Full(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Take the value, discarding the degradation reason.
    #[must_use]
    pub fn into_value(self) -> T {
        match self {
            Self::Full(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Split into the value and the optional reason.
    #[must_use]
    pub fn into_parts(self) -> (T, Option<DegradeReason>) {
        match self {
            Self::Full(value) => (value, None),
            Self::Degraded { value, reason } => (value, Some(reason)),
        }
    }

    /// Whether the result is degraded.
    #[must_use]
    pub const fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Degradation reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<&DegradeReason> {
        match self {
            Self::Full(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }

    /// Transform the value, keeping the reason.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Self::Full(value) => Outcome::Full(f(value)),
            Self::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }
}
