pub mod audit;
pub mod crypto;
pub mod env;
pub mod error;
pub mod utils;

pub use crypto::hash::{digest, Digest};
pub use env::{envelope::Envelope, report::Report, Role};
pub use error::{Result, SwarmError};
pub use utils::AgentId;
