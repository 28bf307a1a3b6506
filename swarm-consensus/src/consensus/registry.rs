use std::collections::{BTreeMap, BTreeSet};

use swarm_common::utils::AgentId;

/// Effect of registering a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// First vote of this sender in the current sequence.
    New,
    /// The sender had voted for `previous`; that vote was withdrawn.
    Replaced { previous: u32 },
    /// Same value voted again.
    Unchanged,
}

/// Stores the live vote of each agent, bucketed by the voted token count.
///
/// Each agent holds at most one live vote: a newer report moves the sender
/// out of its previous bucket (last-report-wins).
#[derive(Debug, Default, Clone)]
pub struct VoteRegistry {
    // Value -> voters
    votes_by_value: BTreeMap<u32, BTreeSet<AgentId>>,

    // Voter -> value (reverse index for replacement)
    vote_of: BTreeMap<AgentId, u32>,
}

impl VoteRegistry {
    /// Cria um novo registro de votos vazio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `value` as the live vote of `voter`.
    pub fn register_vote(&mut self, voter: AgentId, value: u32) -> VoteOutcome {
        let outcome = match self.vote_of.insert(voter.clone(), value) {
            None => VoteOutcome::New,
            Some(previous) if previous == value => return VoteOutcome::Unchanged,
            Some(previous) => {
                if let Some(bucket) = self.votes_by_value.get_mut(&previous) {
                    bucket.remove(&voter);
                    if bucket.is_empty() {
                        self.votes_by_value.remove(&previous);
                    }
                }
                VoteOutcome::Replaced { previous }
            }
        };

        self.votes_by_value.entry(value).or_default().insert(voter);
        outcome
    }

    /// Number of live votes for `value`.
    pub fn count(&self, value: u32) -> usize {
        self.votes_by_value.get(&value).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn voters(&self, value: u32) -> Option<&BTreeSet<AgentId>> {
        self.votes_by_value.get(&value)
    }

    /// Value currently voted by `voter`, if any.
    pub fn vote_of(&self, voter: &AgentId) -> Option<u32> {
        self.vote_of.get(voter).copied()
    }

    /// Full bucket structure (value → voters).
    pub fn all(&self) -> &BTreeMap<u32, BTreeSet<AgentId>> {
        &self.votes_by_value
    }

    /// Latest value reported by every agent that voted.
    pub fn tallies(&self) -> BTreeMap<AgentId, u32> {
        self.vote_of.clone()
    }

    pub fn total_votes(&self) -> usize {
        self.vote_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vote_of.is_empty()
    }

    pub fn clear(&mut self) {
        self.votes_by_value.clear();
        self.vote_of.clear();
    }
}
