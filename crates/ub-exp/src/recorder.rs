use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use ub_core::serde::to_json_line;
use ub_core::{BenchmarkRecord, UbError};

/// Append-only, line-delimited JSON record store with a single writer.
#[derive(Debug)]
pub struct MetricsRecorder {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl MetricsRecorder {
    /// Truncates (or creates) the store, creating missing parent directories.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, UbError> {
        let path = path.into();
        ensure_parent(&path)?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .map_err(|err| UbError::io("ub_exp.log_open", path.display(), err))?;
        tracing::debug!(path = %path.display(), "record log truncated");
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    /// Appends one record as a single line and flushes it to the file.
    pub fn append(&mut self, record: &BenchmarkRecord) -> Result<(), UbError> {
        let line = to_json_line(record)?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.flush())
            .map_err(|err| {
                UbError::io("ub_exp.log_append", self.path.display(), err)
                    .with_context("benchmark", record.benchmark_name.clone())
                    .with_context("line", self.written.to_string())
            })?;
        self.written += 1;
        Ok(())
    }

    /// Path of the underlying store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records appended through this handle.
    pub fn written(&self) -> usize {
        self.written
    }
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), UbError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|err| UbError::io("ub_exp.create_dir", parent.display(), err))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn record(name: &str, size: u64) -> BenchmarkRecord {
        let mut metadata = Map::new();
        metadata.insert("size".into(), json!(size));
        BenchmarkRecord {
            benchmark_name: name.to_string(),
            metadata,
            metrics: Map::new(),
            start_time: "2024-01-01T00:00:00Z".into(),
            end_time: "2024-01-01T00:00:01Z".into(),
        }
    }

    #[test]
    fn create_makes_parents_and_truncates_previous_runs() {
        let dir = tempfile::tempdir().expect("tmp");
        let path = dir.path().join("nested/out/metrics.jsonl");
        let mut first = MetricsRecorder::create(&path).expect("create");
        first.append(&record("a", 1)).expect("append");
        first.append(&record("a", 2)).expect("append");
        drop(first);
        assert_eq!(fs::read_to_string(&path).expect("read").lines().count(), 2);

        let mut second = MetricsRecorder::create(&path).expect("recreate");
        second.append(&record("b", 3)).expect("append");
        let contents = fs::read_to_string(&path).expect("read");
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 1);
        let parsed: BenchmarkRecord = serde_json::from_str(lines[0]).expect("parse");
        assert_eq!(parsed, record("b", 3));
        assert_eq!(second.written(), 1);
    }
}
