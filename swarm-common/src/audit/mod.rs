//! audit
//!
//! Append-only sinks for protocol and agent events, plus the JSON export of
//! a finished run.
//!
//! Sinks never abort the caller: a write failure disables the sink that hit
//! it and is reported once through `tracing`.

pub mod export;
pub mod recorder;

pub use export::{load_audit, save_audit};
pub use recorder::{CsvRecorder, MemoryRecorder, NullRecorder, Recorder};
