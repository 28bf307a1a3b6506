use serde::{Deserialize, Serialize};

use crate::{
    crypto::hash::{digest_report_payload, Digest},
    error::{IntegrityViolation, Result},
    utils::{AgentId, RoundNumber},
};

/// A token-count report broadcast by an agent.
///
/// The digest covers only the declared `token_count`. A compromised agent
/// tampers with the count before the digest is taken, so a tampered report
/// still verifies: the digest defends integrity, not honesty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub sender_id: AgentId,
    pub round: RoundNumber,
    pub token_count: u32,
    pub payload_digest: Digest,
}

impl Report {
    /// Builds a report, fingerprinting the count as declared.
    pub fn new(sender_id: AgentId, round: RoundNumber, token_count: u32) -> Self {
        Self {
            sender_id,
            round,
            token_count,
            payload_digest: digest_report_payload(token_count),
        }
    }

    /// Recomputes the payload digest and compares it with the carried one.
    pub fn verify(&self) -> std::result::Result<(), IntegrityViolation> {
        let recomputed = digest_report_payload(self.token_count);
        if recomputed == self.payload_digest {
            Ok(())
        } else {
            Err(IntegrityViolation {
                sender: self.sender_id.clone(),
                declared: self.payload_digest,
                recomputed,
            })
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
