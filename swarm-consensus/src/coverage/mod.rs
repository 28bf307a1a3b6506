mod evaluator;

pub use evaluator::{CoverageEvaluator, DistributionSummary};
