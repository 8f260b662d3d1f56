//! Pickup ordering.
//!
//! Small stop sets are ordered by evaluating every permutation; larger sets
//! use greedy nearest-neighbor. Both are deterministic: the exhaustive search
//! keeps the first minimum in permutation order, and nearest-neighbor breaks
//! distance ties by input order.

use geo::Coord;
use itertools::Itertools;
use ridepool_core::{OptimizationError, RouteStrategy, TravelTimeMatrix, haversine_miles};

/// A chosen visiting order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    /// Indices into the stop list, in visiting order.
    pub order: Vec<usize>,
    /// How the order was chosen.
    pub strategy: RouteStrategy,
}

/// Orders stops for one driver.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use ridepool_core::RouteStrategy;
/// use ridepool_solver::RouteSequencer;
///
/// let sequencer = RouteSequencer::new(3);
/// let start = Coord { x: 0.0, y: 0.0 };
/// let stops = [Coord { x: 0.0, y: 0.02 }, Coord { x: 0.0, y: 0.01 }];
/// // Start plus two stops, in minutes.
/// let matrix = vec![
///     vec![0.0, 2.0, 1.0],
///     vec![2.0, 0.0, 1.0],
///     vec![1.0, 1.0, 0.0],
/// ];
/// let sequence = sequencer.sequence(start, &stops, &matrix, &[0.0, 0.0])?;
/// assert_eq!(sequence.order, vec![1, 0]);
/// assert_eq!(sequence.strategy, RouteStrategy::ExhaustiveSearch);
/// # Ok::<(), ridepool_core::OptimizationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSequencer {
    exhaustive_limit: usize,
}

impl RouteSequencer {
    /// Sequencer that searches exhaustively up to `exhaustive_limit` stops.
    #[must_use]
    pub const fn new(exhaustive_limit: usize) -> Self {
        Self { exhaustive_limit }
    }

    /// Order `stops` starting from `start`.
    ///
    /// `matrix` holds base travel minutes over `[start, stops...]`, so
    /// `matrix[0]` is the start row. `service_minutes[i]` is the dwell time
    /// at `stops[i]`.
    ///
    /// # Errors
    /// Returns [`OptimizationError::InvalidInput`] when the matrix or service
    /// list does not match `stops`.
    pub fn sequence(
        &self,
        start: Coord<f64>,
        stops: &[Coord<f64>],
        matrix: &TravelTimeMatrix,
        service_minutes: &[f64],
    ) -> Result<Sequence, OptimizationError> {
        let n = stops.len();
        if matrix.len() != n + 1 || service_minutes.len() != n {
            return Err(OptimizationError::InvalidInput {
                reason: format!(
                    "expected a {size}x{size} matrix and {n} service times",
                    size = n + 1
                ),
            });
        }
        let sequence = match n {
            0 => Sequence {
                order: Vec::new(),
                strategy: RouteStrategy::NoRequests,
            },
            1 => Sequence {
                order: vec![0],
                strategy: RouteStrategy::DirectPickup,
            },
            _ if n <= self.exhaustive_limit => Sequence {
                order: exhaustive_order(matrix, service_minutes)?,
                strategy: RouteStrategy::ExhaustiveSearch,
            },
            _ => Sequence {
                order: nearest_neighbor_order(start, stops),
                strategy: RouteStrategy::NearestNeighborHeuristic,
            },
        };
        Ok(sequence)
    }
}

/// Travel minutes from matrix row `from` to column `to`.
pub(crate) fn leg(matrix: &TravelTimeMatrix, from: usize, to: usize) -> Result<f64, OptimizationError> {
    matrix
        .get(from)
        .and_then(|row| row.get(to))
        .copied()
        .ok_or_else(|| OptimizationError::InvalidInput {
            reason: format!("travel matrix has no entry ({from}, {to})"),
        })
}

/// Cost of visiting stops in `order`: travel from the start (matrix index 0)
/// plus service at every stop.
///
/// # Errors
/// Returns [`OptimizationError::InvalidInput`] for indices outside the matrix.
pub fn order_cost(
    matrix: &TravelTimeMatrix,
    service_minutes: &[f64],
    order: &[usize],
) -> Result<f64, OptimizationError> {
    let mut previous = 0;
    let mut cost = 0.0;
    for &stop in order {
        let node = stop + 1;
        cost += leg(matrix, previous, node)?;
        cost += service_minutes.get(stop).copied().unwrap_or_default();
        previous = node;
    }
    Ok(cost)
}

/// Evaluate every permutation of the stops and keep the cheapest.
///
/// Permutations are generated in lexicographic order of stop indices; on
/// equal cost the earlier permutation wins.
///
/// # Errors
/// Returns [`OptimizationError::InvalidInput`] when the matrix is too small
/// and [`OptimizationError::NonFiniteMetric`] when no permutation has a
/// finite cost.
pub fn exhaustive_order(
    matrix: &TravelTimeMatrix,
    service_minutes: &[f64],
) -> Result<Vec<usize>, OptimizationError> {
    let n = service_minutes.len();
    let mut best: Option<(f64, Vec<usize>)> = None;
    for order in (0..n).permutations(n) {
        let cost = order_cost(matrix, service_minutes, &order)?;
        if !cost.is_finite() {
            continue;
        }
        if best.as_ref().is_none_or(|(best_cost, _)| cost < *best_cost) {
            best = Some((cost, order));
        }
    }
    best.map(|(_, order)| order)
        .ok_or(OptimizationError::NonFiniteMetric {
            metric: "sequence cost",
        })
}

/// Greedy nearest-neighbor by haversine distance from `start`.
///
/// Ties keep the stop listed first.
#[must_use]
pub fn nearest_neighbor_order(start: Coord<f64>, stops: &[Coord<f64>]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..stops.len()).collect();
    let mut order = Vec::with_capacity(stops.len());
    let mut current = start;
    while let Some(position) = nearest(current, stops, &remaining) {
        let stop = remaining.remove(position);
        if let Some(location) = stops.get(stop) {
            current = *location;
        }
        order.push(stop);
    }
    order
}

/// Position within `candidates` of the stop nearest to `from`.
pub(crate) fn nearest(from: Coord<f64>, stops: &[Coord<f64>], candidates: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (position, stop) in candidates.iter().enumerate() {
        let Some(location) = stops.get(*stop) else {
            continue;
        };
        let distance = haversine_miles(from, *location);
        if best.is_none_or(|(_, best_distance)| distance < best_distance) {
            best = Some((position, distance));
        }
    }
    best.map(|(position, _)| position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn symmetric(costs: &[&[f64]]) -> TravelTimeMatrix {
        costs.iter().map(|row| row.to_vec()).collect()
    }

    #[rstest]
    fn exhaustive_picks_cheapest_permutation() {
        // Start, A, B, C. Visiting C then A then B is cheapest.
        let matrix = symmetric(&[
            &[0.0, 5.0, 9.0, 1.0],
            &[5.0, 0.0, 1.0, 1.0],
            &[9.0, 1.0, 0.0, 6.0],
            &[1.0, 1.0, 6.0, 0.0],
        ]);
        let order = exhaustive_order(&matrix, &[2.0, 2.0, 2.0]).expect("finite costs");
        assert_eq!(order, vec![2, 0, 1]);
    }

    #[rstest]
    fn exhaustive_ties_keep_first_permutation() {
        let matrix = symmetric(&[&[0.0, 1.0, 1.0], &[1.0, 0.0, 1.0], &[1.0, 1.0, 0.0]]);
        let order = exhaustive_order(&matrix, &[0.0, 0.0]).expect("finite costs");
        assert_eq!(order, vec![0, 1]);
    }

    #[rstest]
    fn nearest_neighbor_walks_outward() {
        let start = Coord { x: 0.0, y: 0.0 };
        let stops = [
            Coord { x: 0.0, y: 0.03 },
            Coord { x: 0.0, y: 0.01 },
            Coord { x: 0.0, y: 0.02 },
            Coord { x: 0.0, y: 0.04 },
        ];
        assert_eq!(nearest_neighbor_order(start, &stops), vec![1, 2, 0, 3]);
    }

    #[rstest]
    fn nearest_neighbor_ties_keep_input_order() {
        let start = Coord { x: 0.0, y: 0.0 };
        let stops = [Coord { x: 0.01, y: 0.0 }, Coord { x: -0.01, y: 0.0 }];
        assert_eq!(nearest_neighbor_order(start, &stops), vec![0, 1]);
    }

    #[rstest]
    #[case(0, RouteStrategy::NoRequests)]
    #[case(1, RouteStrategy::DirectPickup)]
    #[case(3, RouteStrategy::ExhaustiveSearch)]
    #[case(4, RouteStrategy::NearestNeighborHeuristic)]
    fn strategy_follows_stop_count(#[case] n: usize, #[case] expected: RouteStrategy) {
        let start = Coord { x: 0.0, y: 0.0 };
        #[expect(clippy::cast_precision_loss, reason = "tiny test indices")]
        let stops: Vec<_> = (0..n)
            .map(|i| Coord {
                x: 0.0,
                y: 0.01 * (i as f64 + 1.0),
            })
            .collect();
        let matrix = vec![vec![1.0; n + 1]; n + 1];
        let service = vec![0.0; n];
        let sequence = RouteSequencer::new(3)
            .sequence(start, &stops, &matrix, &service)
            .expect("well-formed input");
        assert_eq!(sequence.strategy, expected);
        assert_eq!(sequence.order.len(), n);
    }

    #[rstest]
    fn mismatched_matrix_is_rejected() {
        let err = RouteSequencer::new(3)
            .sequence(Coord { x: 0.0, y: 0.0 }, &[Coord { x: 0.0, y: 0.0 }], &vec![vec![0.0]], &[0.0])
            .expect_err("matrix too small");
        assert!(matches!(err, OptimizationError::InvalidInput { .. }));
    }
}
