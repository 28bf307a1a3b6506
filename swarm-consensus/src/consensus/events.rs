use serde::{Deserialize, Serialize};

use swarm_common::utils::{AgentId, RoundNumber, SequenceNumber, ViewNumber};

/// Column layout of the aggregator's event stream.
pub const CENTRAL_LOG_HEADER: [&str; 6] = ["tick", "event", "view", "seq", "sender_id", "detail"];

/// File name of the aggregator's event stream inside the log folder.
pub const CENTRAL_LOG_FILE: &str = "central_log.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Vote,
    VoteReplaced,
    IntegrityViolation,
    MalformedPayload,
    SenderMismatch,
    UnknownSender,
    ConsensusReached,
    Coverage,
    ViewChange,
}

/// One row of the aggregator's append-only audit stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolEvent {
    pub tick: RoundNumber,
    pub event: EventKind,
    pub view: ViewNumber,
    pub seq: SequenceNumber,
    pub sender_id: Option<AgentId>,
    pub detail: String,
}
