use serde::{Deserialize, Serialize};

use crate::utils::AgentId;

/// One delivered broadcast, as seen by a receiver.
///
/// `sender_id` is attached by the medium and is not authenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub sender_id: AgentId,
    pub payload: Vec<u8>,
    pub rssi: f64,
    pub hop_count: u8,
}

impl Envelope {
    pub fn new(sender_id: AgentId, payload: Vec<u8>) -> Self {
        Self { sender_id, payload, rssi: 0.0, hop_count: 0 }
    }
}
