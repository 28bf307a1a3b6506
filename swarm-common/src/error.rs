use thiserror::Error;

use crate::{crypto::hash::Digest, utils::AgentId};

pub type Result<T> = std::result::Result<T, SwarmError>;

#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("Invalid config: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Integrity violation: {0}")]
    Integrity(#[from] IntegrityViolation),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Recorder error: {0}")]
    Recorder(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<bincode::Error> for SwarmError {
    fn from(err: bincode::Error) -> Self {
        SwarmError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for SwarmError {
    fn from(err: serde_json::Error) -> Self {
        SwarmError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for SwarmError {
    fn from(err: csv::Error) -> Self {
        SwarmError::Recorder(err.to_string())
    }
}

/// Startup-time misconfiguration. Always fatal before the first round runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("true token count must be greater than zero")]
    ZeroTrueTokenCount,

    #[error("robot count must be greater than zero")]
    NoAgents,

    #[error("reporting interval must be greater than zero")]
    ZeroReportingInterval,

    #[error("max rounds per view must be greater than zero")]
    ZeroRoundsPerView,

    #[error("{compromised} compromised robots requested but only {robots} robots exist")]
    TooManyCompromised { compromised: usize, robots: usize },

    #[error("roster lists {actual} distinct agents but the quorum assumes {expected}")]
    RosterSize { expected: usize, actual: usize },

    #[error("byzantine quorum requires n > 3f (n = {n}, f = {f})")]
    QuorumPrecondition { n: usize, f: usize },

    #[error("loss probability {0} is outside [0, 1]")]
    LossProbability(f64),

    #[error("field dimensions must be positive (x = {x}, y = {y})")]
    FieldSize { x: f64, y: f64 },
}

/// Send or receive failure. Handled as message loss, never retried in-round.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("failed to send message from {0}")]
    Send(AgentId),

    #[error("medium closed")]
    Closed,

    #[error("unknown endpoint {0}")]
    UnknownEndpoint(AgentId),
}

/// A report whose declared value does not match its payload digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("report from {sender} declares {declared} but payload hashes to {recomputed}")]
pub struct IntegrityViolation {
    pub sender: AgentId,
    pub declared: Digest,
    pub recomputed: Digest,
}
