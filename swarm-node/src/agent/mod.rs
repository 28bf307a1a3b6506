pub mod adversary;
pub mod core;
pub mod log;
pub mod sensing;

pub use adversary::{AdversarialPolicy, ValueTransform};
pub use self::core::{Agent, AgentState, StepOutcome};
pub use sensing::Sensor;
