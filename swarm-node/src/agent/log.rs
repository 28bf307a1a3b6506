use serde::Serialize;

use swarm_common::utils::{AgentId, RoundNumber};

pub const ROBOT_LOG_HEADER: [&str; 16] = [
    "tick",
    "type",
    "header",
    "payload_hash",
    "sender_id",
    "rssi",
    "hop_count",
    "x",
    "y",
    "prox0",
    "prox1",
    "prox2",
    "token_seen",
    "battery",
    "role",
    "is_compromised",
];

/// Outbound reports are tagged with the prepare-phase header.
pub const OUTBOUND_HEADER: &str = "PREPARE";

pub fn robot_log_file(id: &AgentId) -> String {
    format!("robot_{}_log.csv", id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    State,
    Inbound,
    Outbound,
}

/// One line of a robot's audit log. Flags are written as `0`/`1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentLogRow {
    pub tick: RoundNumber,
    #[serde(rename = "type")]
    pub kind: RowKind,
    pub header: String,
    pub payload_hash: String,
    pub sender_id: AgentId,
    pub rssi: f64,
    pub hop_count: u8,
    pub x: f64,
    pub y: f64,
    pub prox0: f64,
    pub prox1: f64,
    pub prox2: f64,
    pub token_seen: u8,
    pub battery: f64,
    pub role: String,
    pub is_compromised: u8,
}
