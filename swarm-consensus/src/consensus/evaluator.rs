use tracing::{debug, warn};

use serde::{Deserialize, Serialize};

use super::registry::VoteRegistry;

/// Byzantine quorum parameters.
///
/// `total_agents` is `n`, `max_faulty` is `f`. A value commits once it holds
/// `n - f` matching votes. Safety only means something when `n > 3f`; the
/// policy itself does not enforce it (see [`QuorumPolicy::is_byzantine_safe`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumPolicy {
    pub total_agents: usize,
    pub max_faulty: usize,
}

impl QuorumPolicy {
    pub fn new(total_agents: usize, max_faulty: usize) -> Self {
        Self { total_agents, max_faulty }
    }

    /// Matching votes needed to commit: `n - f`.
    pub fn threshold(&self) -> usize {
        self.total_agents.saturating_sub(self.max_faulty)
    }

    /// Deployment precondition `n > 3f`.
    pub fn is_byzantine_safe(&self) -> bool {
        self.total_agents > 3 * self.max_faulty
    }
}

/// A value that met the quorum threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumResult {
    pub value: u32,
    pub votes: usize,
    /// Every value that met the threshold this evaluation, largest first.
    pub qualifying_values: Vec<u32>,
}

/// Componente responsável por avaliar consenso com base em votos e quorum.
#[derive(Debug, Clone)]
pub struct ConsensusEvaluator {
    pub policy: QuorumPolicy,
}

impl ConsensusEvaluator {
    pub fn new(policy: QuorumPolicy) -> Self {
        Self { policy }
    }

    /// Returns the value that reached quorum, if any.
    ///
    /// When several values qualify at once (only possible when `f` is large
    /// relative to `n`) the numerically larger count wins.
    pub fn evaluate(&self, registry: &VoteRegistry) -> Option<QuorumResult> {
        let threshold = self.policy.threshold();

        let qualifying: Vec<(u32, usize)> = registry
            .all()
            .iter()
            .rev()
            .filter(|(_, voters)| voters.len() >= threshold)
            .map(|(value, voters)| (*value, voters.len()))
            .collect();

        let (value, votes) = *qualifying.first()?;
        let qualifying_values: Vec<u32> = qualifying.iter().map(|(v, _)| *v).collect();

        if qualifying_values.len() > 1 {
            warn!(
                "⚠️ Values {:?} reached quorum simultaneously (n: {}, f: {}); deciding the larger count {}",
                qualifying_values, self.policy.total_agents, self.policy.max_faulty, value
            );
        }

        debug!(
            "🗳️ Valor {} atingiu quorum: {}/{} votos",
            value, votes, threshold
        );

        Some(QuorumResult { value, votes, qualifying_values })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swarm_common::utils::AgentId;

    fn vote_n(registry: &mut VoteRegistry, prefix: &str, count: usize, value: u32) {
        for i in 0..count {
            registry.register_vote(AgentId(format!("{prefix}{i}")), value);
        }
    }

    #[test]
    fn test_bft_quorum_calculation() {
        // 10 agents, f = 3 -> quorum = 7
        let evaluator = ConsensusEvaluator::new(QuorumPolicy::new(10, 3));
        assert_eq!(evaluator.policy.threshold(), 7);

        let mut registry = VoteRegistry::new();
        vote_n(&mut registry, "node", 6, 12);
        assert!(evaluator.evaluate(&registry).is_none(), "6 votes must not commit");

        registry.register_vote(AgentId("node6".into()), 12);
        let result = evaluator.evaluate(&registry).expect("7 votes must commit");
        assert_eq!(result.value, 12);
        assert_eq!(result.votes, 7);
        assert_eq!(result.qualifying_values, vec![12]);
    }

    #[test]
    fn test_split_votes_do_not_commit() {
        let evaluator = ConsensusEvaluator::new(QuorumPolicy::new(10, 3));
        let mut registry = VoteRegistry::new();
        vote_n(&mut registry, "a", 5, 12);
        vote_n(&mut registry, "b", 5, 13);
        assert!(evaluator.evaluate(&registry).is_none());
    }

    #[test]
    fn test_tie_break_prefers_larger_count() {
        // Misconfigured: n = 4, f = 3 -> threshold 1, every value qualifies.
        let evaluator = ConsensusEvaluator::new(QuorumPolicy::new(4, 3));
        let mut registry = VoteRegistry::new();
        registry.register_vote(AgentId("a".into()), 3);
        registry.register_vote(AgentId("b".into()), 9);
        registry.register_vote(AgentId("c".into()), 5);

        let result = evaluator.evaluate(&registry).unwrap();
        assert_eq!(result.value, 9);
        assert_eq!(result.qualifying_values, vec![9, 5, 3]);
    }

    #[test]
    fn test_byzantine_precondition() {
        assert!(QuorumPolicy::new(10, 3).is_byzantine_safe());
        assert!(QuorumPolicy::new(4, 1).is_byzantine_safe());
        assert!(!QuorumPolicy::new(3, 1).is_byzantine_safe());
        assert!(!QuorumPolicy::new(9, 3).is_byzantine_safe());
    }
}
