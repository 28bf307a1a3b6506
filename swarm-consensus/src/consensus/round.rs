use serde::{Deserialize, Serialize};
use thiserror::Error;

use swarm_common::utils::{RoundNumber, SequenceNumber, ViewNumber};

use super::registry::VoteRegistry;

/// A committed agreement for one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub view: ViewNumber,
    pub sequence: SequenceNumber,
    pub agreed_count: u32,
    pub votes: usize,
    pub tick: RoundNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sequence {sequence} already decided {decided}, refusing {attempted}")]
pub struct AlreadyDecided {
    pub sequence: SequenceNumber,
    pub decided: u32,
    pub attempted: u32,
}

/// Protocol state owned by the aggregator.
///
/// Starts at view 0, sequence 0. `sequence` only moves forward after a
/// commit; `view` only moves forward on a liveness fallback. Both are
/// monotonic.
#[derive(Debug, Clone)]
pub struct ConsensusRound {
    view: ViewNumber,
    sequence: SequenceNumber,
    votes: VoteRegistry,
    quorum_threshold: usize,
    decided: Option<u32>,
    rounds_in_view: u64,
}

impl ConsensusRound {
    pub fn new(quorum_threshold: usize) -> Self {
        Self {
            view: 0,
            sequence: 0,
            votes: VoteRegistry::new(),
            quorum_threshold,
            decided: None,
            rounds_in_view: 0,
        }
    }

    pub fn view(&self) -> ViewNumber {
        self.view
    }

    pub fn sequence(&self) -> SequenceNumber {
        self.sequence
    }

    pub fn quorum_threshold(&self) -> usize {
        self.quorum_threshold
    }

    pub fn decided(&self) -> Option<u32> {
        self.decided
    }

    /// Rounds elapsed in the current view without a decision.
    pub fn rounds_in_view(&self) -> u64 {
        self.rounds_in_view
    }

    pub fn votes(&self) -> &VoteRegistry {
        &self.votes
    }

    pub(crate) fn votes_mut(&mut self) -> &mut VoteRegistry {
        &mut self.votes
    }

    /// Freezes `value` for the current sequence. A sequence decides once.
    pub fn decide(&mut self, value: u32) -> Result<(), AlreadyDecided> {
        match self.decided {
            Some(decided) => Err(AlreadyDecided {
                sequence: self.sequence,
                decided,
                attempted: value,
            }),
            None => {
                self.decided = Some(value);
                Ok(())
            }
        }
    }

    /// Opens the next sequence after a commit: votes are cleared and the
    /// view's stall counter restarts.
    pub fn begin_next_sequence(&mut self) {
        self.votes.clear();
        self.sequence += 1;
        self.decided = None;
        self.rounds_in_view = 0;
    }

    /// Counts one undecided round. Returns `true` when the view has used up
    /// its budget of `max_rounds_per_view` rounds.
    pub fn record_stalled_round(&mut self, max_rounds_per_view: u64) -> bool {
        self.rounds_in_view += 1;
        self.rounds_in_view >= max_rounds_per_view
    }

    /// Liveness fallback: retries the same sequence under a new view.
    pub fn change_view(&mut self) {
        self.votes.clear();
        self.view += 1;
        self.rounds_in_view = 0;
    }
}
