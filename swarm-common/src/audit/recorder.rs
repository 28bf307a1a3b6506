use std::{
    fs::File,
    io::{BufWriter, Write},
    marker::PhantomData,
    path::Path,
    sync::{Arc, Mutex},
};

use serde::Serialize;
use tracing::error;

use crate::error::Result;

/// Append-only sink for structured rows.
pub trait Recorder<R>: Send {
    fn record(&mut self, row: &R);

    fn flush(&mut self) {}
}

/// CSV sink. The header is written when the sink is opened so an empty run
/// still produces a well-formed file.
pub struct CsvRecorder<R> {
    label: String,
    writer: Option<csv::Writer<Box<dyn Write + Send>>>,
    _row: PhantomData<fn(&R)>,
}

impl<R: Serialize> CsvRecorder<R> {
    pub fn create<P: AsRef<Path>>(path: P, header: &[&str]) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Self::from_writer(BufWriter::new(file), header, path.display().to_string())
    }

    pub fn from_writer<W>(writer: W, header: &[&str], label: impl Into<String>) -> Result<Self>
    where
        W: Write + Send + 'static,
    {
        let boxed: Box<dyn Write + Send> = Box::new(writer);
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(boxed);
        writer.write_record(header)?;
        Ok(Self {
            label: label.into(),
            writer: Some(writer),
            _row: PhantomData,
        })
    }

    /// Whether the sink is still accepting rows.
    pub fn is_active(&self) -> bool {
        self.writer.is_some()
    }

    fn disable(&mut self, reason: &dyn std::fmt::Display) {
        error!("❌ Audit sink {} disabled after write failure: {}", self.label, reason);
        self.writer = None;
    }
}

impl<R: Serialize> Recorder<R> for CsvRecorder<R> {
    fn record(&mut self, row: &R) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(e) = writer.serialize(row) {
            self.disable(&e);
        }
    }

    fn flush(&mut self) {
        let Some(writer) = self.writer.as_mut() else {
            return;
        };
        if let Err(e) = writer.flush() {
            self.disable(&e);
        }
    }
}

/// In-memory sink, cloneable so tests can keep a handle to the rows.
#[derive(Debug)]
pub struct MemoryRecorder<R> {
    rows: Arc<Mutex<Vec<R>>>,
}

impl<R> Clone for MemoryRecorder<R> {
    fn clone(&self) -> Self {
        Self { rows: Arc::clone(&self.rows) }
    }
}

impl<R> Default for MemoryRecorder<R> {
    fn default() -> Self {
        Self { rows: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl<R: Clone> MemoryRecorder<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> Vec<R> {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn len(&self) -> usize {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<R: Clone + Send> Recorder<R> for MemoryRecorder<R> {
    fn record(&mut self, row: &R) {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(row.clone());
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRecorder;

impl<R> Recorder<R> for NullRecorder {
    fn record(&mut self, _row: &R) {}
}
