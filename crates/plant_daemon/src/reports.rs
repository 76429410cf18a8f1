//! The daemon's report sink: an optional JSON-lines log on disk, a bounded
//! in-memory history for the reports endpoint, and a live fan-out for SSE.

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;
use plant_core::{ReportRecord, ReportSink, SinkError};
use tokio::sync::broadcast;

/// Records kept in memory when `--report-history` is not given.
pub const DEFAULT_HISTORY: usize = 500;
const LIVE_CHANNEL_CAPACITY: usize = 1024;

/// Append-only JSON-lines writer. Each record is flushed before `write_record`
/// returns.
pub struct ReportFileWriter {
    writer: Box<dyn Write + Send>,
}

impl ReportFileWriter {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }

    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    pub fn write_record(&mut self, record: &ReportRecord) -> std::io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Ring buffer of the most recent records, oldest evicted first.
pub struct ReportHistory {
    records: VecDeque<ReportRecord>,
    capacity: usize,
}

impl ReportHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, record: ReportRecord) {
        if self.capacity == 0 {
            return;
        }
        if self.records.len() == self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Newest first, optionally restricted to module names containing
    /// `module_filter`.
    pub fn recent(&self, module_filter: Option<&str>, limit: usize) -> Vec<ReportRecord> {
        self.records
            .iter()
            .rev()
            .filter(|r| module_filter.map_or(true, |f| r.module_name.contains(f)))
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

pub struct ReportHub {
    file: Option<Mutex<ReportFileWriter>>,
    history: Mutex<ReportHistory>,
    live: broadcast::Sender<ReportRecord>,
}

impl ReportHub {
    pub fn new(file: Option<ReportFileWriter>, history_capacity: usize) -> Self {
        let (live, _) = broadcast::channel(LIVE_CHANNEL_CAPACITY);
        Self {
            file: file.map(Mutex::new),
            history: Mutex::new(ReportHistory::new(history_capacity)),
            live,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReportRecord> {
        self.live.subscribe()
    }

    pub fn recent(&self, module_filter: Option<&str>, limit: usize) -> Vec<ReportRecord> {
        self.history.lock().recent(module_filter, limit)
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }
}

impl ReportSink for ReportHub {
    fn append(&self, record: ReportRecord) -> Result<(), SinkError> {
        if let Some(file) = &self.file {
            file.lock().write_record(&record)?;
        }
        self.history.lock().push(record.clone());
        // No subscribers is fine; the stream is best-effort.
        let _ = self.live.send(record);
        Ok(())
    }
}
