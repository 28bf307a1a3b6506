pub mod builder;
pub mod maestro;

pub use builder::build_swarm;
pub use maestro::{AuditData, Maestro};
