use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier of a swarm agent (robot).
///
/// The channel carries it out-of-band and unauthenticated; it is used as the
/// voter identity by the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Builds the conventional robot id, `e-puck_<index>`.
    pub fn robot(index: usize) -> Self {
        AgentId(format!("e-puck_{}", index))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        AgentId(value.to_string())
    }
}

impl From<String> for AgentId {
    fn from(value: String) -> Self {
        AgentId(value)
    }
}
