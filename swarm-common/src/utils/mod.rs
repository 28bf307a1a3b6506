//! utils.rs
//!
//! Common types and helper implementations shared across the swarm crates.
//!
//! This module provides the agent identifier newtype and the discrete
//! round/view/sequence counters used by the protocol.

pub mod agent_id;
pub use agent_id::AgentId;

/// Discrete simulation tick driven by the external round driver.
pub type RoundNumber = u64;

/// Consensus epoch; advanced by the liveness fallback.
pub type ViewNumber = u64;

/// Identifier of successive agreed decisions.
pub type SequenceNumber = u64;
