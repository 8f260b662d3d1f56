use thiserror::Error;

/// Errors from [`crate::travel_time::TravelTimeProvider`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TravelTimeError {
    /// No points were provided.
    ///
    /// A matrix needs at least one point. Callers should pre-filter input to
    /// avoid this condition.
    #[error("at least one point is required")]
    EmptyInput,
    /// A point was not a finite WGS84 coordinate.
    #[error("point {index} is not a finite coordinate")]
    NonFiniteCoordinate {
        /// Position of the point in the input.
        index: usize,
    },
}
