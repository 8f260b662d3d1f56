//! Internal optimization faults.
//!
//! These never reach callers as `Err`: each public operation catches them and
//! returns a degraded [`Outcome`](crate::Outcome) carrying the error as its
//! reason.

use thiserror::Error;

/// A sequencing or scoring step could not produce a trustworthy result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizationError {
    /// A waypoint, request or query point had a non-finite or out-of-range
    /// coordinate.
    #[error("{id} has a non-finite or out-of-range coordinate")]
    NonFiniteCoordinate {
        /// Identifier of the offending record.
        id: String,
    },
    /// A computed metric came out as NaN or infinity.
    #[error("computed {metric} is not finite")]
    NonFiniteMetric {
        /// Name of the metric, e.g. `"total_time"`.
        metric: &'static str,
    },
    /// An input record was structurally unusable.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable description.
        reason: String,
    },
}

impl OptimizationError {
    /// Shorthand for [`OptimizationError::NonFiniteCoordinate`].
    pub fn non_finite(id: impl Into<String>) -> Self {
        Self::NonFiniteCoordinate { id: id.into() }
    }

    /// Return `value` when finite, otherwise a
    /// [`OptimizationError::NonFiniteMetric`] naming `metric`.
    ///
    /// # Errors
    /// Fails when `value` is NaN or infinite.
    pub fn ensure_finite(metric: &'static str, value: f64) -> Result<f64, Self> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Self::NonFiniteMetric { metric })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1.5, true)]
    #[case(f64::NAN, false)]
    #[case(f64::NEG_INFINITY, false)]
    fn ensure_finite_checks_value(#[case] value: f64, #[case] ok: bool) {
        assert_eq!(OptimizationError::ensure_finite("distance", value).is_ok(), ok);
    }

    #[rstest]
    fn messages_name_the_record() {
        let err = OptimizationError::non_finite("req_3_pickup");
        assert_eq!(
            err.to_string(),
            "req_3_pickup has a non-finite or out-of-range coordinate"
        );
    }
}
