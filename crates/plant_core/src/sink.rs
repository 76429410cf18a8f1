//! Report sink: where per-tick records go once the engine has built them.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::ReportRecord;

#[derive(Debug)]
pub enum SinkError {
    /// The backing store refused the record for now (queue full, store down).
    Unavailable { reason: String },
    /// The sink has been shut down and will never accept records again.
    Closed,
    Io(std::io::Error),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Unavailable { reason } => write!(f, "report sink unavailable: {reason}"),
            SinkError::Closed => f.write_str("report sink closed"),
            SinkError::Io(err) => write!(f, "report sink io error: {err}"),
        }
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SinkError::Io(err) => Some(err),
            SinkError::Unavailable { .. } | SinkError::Closed => None,
        }
    }
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        SinkError::Io(err)
    }
}

/// Durable, append-only destination for report records.
///
/// `append` is called with the plant lock held, once per record, in emission
/// order. Implementations must return promptly and must not reorder.
pub trait ReportSink: Send + Sync {
    fn append(&self, record: ReportRecord) -> Result<(), SinkError>;
}

impl<S: ReportSink + ?Sized> ReportSink for Arc<S> {
    fn append(&self, record: ReportRecord) -> Result<(), SinkError> {
        (**self).append(record)
    }
}

/// Keeps every record in memory. Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ReportRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn records(&self) -> Vec<ReportRecord> {
        self.records.lock().clone()
    }

    /// Drain everything recorded so far.
    pub fn take(&self) -> Vec<ReportRecord> {
        std::mem::take(&mut *self.records.lock())
    }
}

impl ReportSink for MemorySink {
    fn append(&self, record: ReportRecord) -> Result<(), SinkError> {
        self.records.lock().push(record);
        Ok(())
    }
}
