pub mod consensus;
pub mod coverage;

pub use consensus::evaluator::QuorumPolicy;
pub use consensus::events::{EventKind, ProtocolEvent};
pub use consensus::round::{ConsensusRound, Decision};
pub use consensus::{AggregatorSettings, ConsensusAggregator, RoundOutcome};
pub use coverage::{CoverageEvaluator, DistributionSummary};
