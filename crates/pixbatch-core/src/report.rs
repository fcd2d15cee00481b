//! Per-item failure reporting.
//!
//! A batch pass never aborts on a single bad image; instead each failure is
//! handed to an [`ErrorSink`]. The default sink appends to a text log, and
//! tests inject [`MemoryErrorSink`] to assert on what was recorded.

use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only sink for per-item processing failures.
pub trait ErrorSink {
    /// Record one failed item. Must not fail the caller.
    fn record(&mut self, path: &Path, message: &str);
}

/// Sink that appends one line per failure to a text file.
pub struct FileErrorSink {
    path: PathBuf,
}

impl FileErrorSink {
    /// Create a sink appending to the given file. The file is created on
    /// first record.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl ErrorSink for FileErrorSink {
    fn record(&mut self, path: &Path, message: &str) {
        let line = format!("Error processing {}: {}", path.display(), message);
        if let Err(e) = self.append(&line) {
            tracing::warn!("Failed to append to error log {:?}: {}", self.path, e);
        }
    }
}

/// In-memory sink, used as a test double and by callers that want to show
/// failures after the run instead of tailing a file.
#[derive(Debug, Default)]
pub struct MemoryErrorSink {
    /// Recorded (path, message) pairs in arrival order.
    pub records: Vec<(PathBuf, String)>,
}

impl ErrorSink for MemoryErrorSink {
    fn record(&mut self, path: &Path, message: &str) {
        self.records.push((path.to_path_buf(), message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("error_log.txt");
        let mut sink = FileErrorSink::new(&log);

        sink.record(Path::new("/images/a.png"), "decode failed");
        sink.record(Path::new("/images/b.png"), "disk full");

        let content = std::fs::read_to_string(&log).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Error processing /images/a.png: decode failed");
        assert_eq!(lines[1], "Error processing /images/b.png: disk full");
    }

    #[test]
    fn test_memory_sink_collects() {
        let mut sink = MemoryErrorSink::default();
        sink.record(Path::new("x.jpg"), "boom");
        assert_eq!(sink.records.len(), 1);
        assert_eq!(sink.records[0].1, "boom");
    }
}
