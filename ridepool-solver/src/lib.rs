//! Sequencing, pooling and arrival prediction for ride dispatch.
//!
//! [`RouteOptimizationEngine`] is the entry point. It owns an immutable
//! [`EngineConfig`](ridepool_core::EngineConfig), a zone-speed travel-time
//! estimator and an environmental impact estimator over caller-supplied
//! weather and traffic feeds, and exposes four operations:
//!
//! - pickup route optimization for one driver (exhaustive search for small
//!   batches, nearest-neighbor beyond that);
//! - pool ride matching over request combinations;
//! - point-to-point arrival prediction with a confidence interval;
//! - multi-stop sequencing under vehicle capacity and pickup-before-dropoff
//!   precedence.
//!
//! Operations never fail. They return an [`Outcome`](ridepool_core::Outcome)
//! that is either full or degraded with a reason, and the value's confidence
//! score tells downstream logic how far to trust it. The building blocks are
//! exported for callers that want to compose their own pipeline.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod engine;
mod eta;
mod multi_stop;
mod planner;
mod pool;
pub mod scoring;
mod sequencer;
mod validator;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use engine::RouteOptimizationEngine;
pub use eta::{
    EtaEstimate, EtaPredictor, FALLBACK_FACTOR, emergency_eta, eta_confidence, eta_factors,
    fallback_eta,
};
pub use multi_stop::{MultiStopMethod, MultiStopPlan, MultiStopSequencer};
pub use planner::{
    FALLBACK_FARE_PER_REQUEST, FALLBACK_MINUTES_PER_MILE, PickupPlanner, PlannedRoute,
};
pub use pool::{ALIGNMENT_WEIGHT, Compatibility, OVERLAP_WEIGHT, PoolMatcher};
pub use sequencer::{
    RouteSequencer, Sequence, exhaustive_order, nearest_neighbor_order, order_cost,
};
pub use validator::{RouteCheck, Trimmed, priority_score, trim_to_capacity, validate_route};
