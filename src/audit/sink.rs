//! Append-only log sinks
//!
//! The storage backend sits behind the [`AuditSink`] trait so decision
//! logic never touches the filesystem directly. [`FileSink`] is the
//! production backend; [`MemorySink`] backs tests and ephemeral runs.

use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Append-only record storage for one domain log.
pub trait AuditSink: Send + Sync {
    /// Append one serialized record as a single line.
    fn append(&self, line: &str) -> Result<()>;

    /// Read back every stored line.
    fn read_all(&self) -> Result<Vec<String>>;
}

impl<S: AuditSink> AuditSink for std::sync::Arc<S> {
    fn append(&self, line: &str) -> Result<()> {
        (**self).append(line)
    }

    fn read_all(&self) -> Result<Vec<String>> {
        (**self).read_all()
    }
}

/// File-backed sink writing newline-terminated lines in append mode.
///
/// The parent directory is created on first write. Each append is a single
/// flushed write, so concurrent single-threaded processes interleave at
/// line granularity under the platform's append semantics.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    /// Sink writing to the given log path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The log path this sink writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileSink {
    fn append(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Audit(format!(
                        "Failed to create log directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                Error::Audit(format!("Failed to open log {}: {}", self.path.display(), e))
            })?;

        let mut buf = line.to_string();
        buf.push('\n');
        file.write_all(buf.as_bytes()).map_err(|e| {
            Error::Audit(format!("Failed to write log {}: {}", self.path.display(), e))
        })?;
        file.flush().map_err(|e| {
            Error::Audit(format!("Failed to flush log {}: {}", self.path.display(), e))
        })?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(Error::Audit(format!(
                "Failed to read log {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}

/// In-memory sink.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines recorded so far.
    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for MemorySink {
    fn append(&self, line: &str) -> Result<()> {
        self.lines
            .lock()
            .map_err(|_| Error::Audit("Memory sink lock poisoned".to_string()))?
            .push(line.to_string());
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<String>> {
        Ok(self
            .lines
            .lock()
            .map_err(|_| Error::Audit("Memory sink lock poisoned".to_string()))?
            .clone())
    }
}
