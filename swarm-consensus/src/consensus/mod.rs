//! consensus
//!
//! Round-based Byzantine quorum aggregation over integrity-checked reports.
//!
//! Agents broadcast token-count reports; the aggregator verifies each
//! payload digest, keeps one live vote per agent per sequence and commits a
//! value once `n - f` agents agree on it. If no value gathers a quorum within
//! the view's round budget the view advances and the same sequence is
//! retried, so a sequence number is never skipped.

mod engine;
pub mod evaluator;
pub mod events;
pub mod registry;
pub mod round;

pub use engine::{AggregatorSettings, ConsensusAggregator, Rejection, RoundOutcome, ViewChange};
