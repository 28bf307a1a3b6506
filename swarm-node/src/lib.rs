pub mod agent;
pub mod channel;
pub mod cli;
pub mod config;
pub mod env;
pub mod runtime;
pub mod setup;

pub use config::SwarmConfig;
pub use runtime::builder::build_swarm;
