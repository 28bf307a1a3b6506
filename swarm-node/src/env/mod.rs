//! Simulated arena the robots move on.

pub mod field;

pub use field::{BodyParams, Field, SimulatedSensor};
