pub mod envelope;
pub mod report;

use serde::{Deserialize, Serialize};

/// Role an agent plays in the protocol. Every robot is a replica.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Replica,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Replica => "replica",
        }
    }
}
