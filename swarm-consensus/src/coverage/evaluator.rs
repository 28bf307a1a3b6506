use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use swarm_common::{error::ConfigurationError, utils::AgentId};

/// Snapshot produced once per committed sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub agreed_count: u32,
    pub true_token_count: u32,
    /// `min(agreed, true) / true`, so never above 1.0.
    pub coverage_ratio: f64,
    /// Reported tally minus the agreed count, per agent.
    pub per_agent_deviation: BTreeMap<AgentId, i64>,
}

/// Computes how much of the field's ground truth the agreed count represents.
#[derive(Debug, Default, Clone, Copy)]
pub struct CoverageEvaluator;

impl CoverageEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate(
        &self,
        agreed_count: u32,
        true_token_count: u32,
        agent_tallies: &BTreeMap<AgentId, u32>,
    ) -> Result<DistributionSummary, ConfigurationError> {
        if true_token_count == 0 {
            return Err(ConfigurationError::ZeroTrueTokenCount);
        }

        let covered = agreed_count.min(true_token_count);
        let coverage_ratio = f64::from(covered) / f64::from(true_token_count);

        let per_agent_deviation = agent_tallies
            .iter()
            .map(|(id, tally)| (id.clone(), i64::from(*tally) - i64::from(agreed_count)))
            .collect();

        Ok(DistributionSummary {
            agreed_count,
            true_token_count,
            coverage_ratio,
            per_agent_deviation,
        })
    }
}
