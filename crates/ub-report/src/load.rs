use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ub_core::hash::InputDigest;
use ub_core::{flatten_fields, ErrorInfo, FieldMap, UbError};
use walkdir::WalkDir;

const MIRROR_PREFIX: &str = "microbenchmark_";
const LOG_EXTENSION: &str = "jsonl";

/// All flattened records of one benchmark, in log order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkRecords {
    pub benchmark_name: String,
    pub rows: Vec<FieldMap>,
    /// Every key observed inside a `metrics` map for this benchmark.
    pub metric_keys: BTreeSet<String>,
}

/// Counters describing what the loader read and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadStats {
    pub files: usize,
    pub lines: usize,
    pub records: usize,
    pub skipped_lines: usize,
}

/// Records grouped per benchmark in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordLog {
    pub benchmarks: Vec<BenchmarkRecords>,
    pub stats: LoadStats,
    /// Hex SHA-256 over the bytes of every file read, in read order.
    pub input_hash: String,
}

impl RecordLog {
    fn push(&mut self, parsed: ParsedLine) {
        let index = match self
            .benchmarks
            .iter()
            .position(|group| group.benchmark_name == parsed.benchmark_name)
        {
            Some(index) => index,
            None => {
                self.benchmarks.push(BenchmarkRecords {
                    benchmark_name: parsed.benchmark_name,
                    ..BenchmarkRecords::default()
                });
                self.benchmarks.len() - 1
            }
        };
        let group = &mut self.benchmarks[index];
        group.metric_keys.extend(parsed.metric_keys);
        group.rows.push(parsed.fields);
        self.stats.records += 1;
    }

    /// Looks a benchmark group up by name.
    pub fn get(&self, name: &str) -> Option<&BenchmarkRecords> {
        self.benchmarks.iter().find(|group| group.benchmark_name == name)
    }
}

/// One successfully parsed log line.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub benchmark_name: String,
    pub fields: FieldMap,
    pub metric_keys: Vec<String>,
}

fn data_error(code: &str, message: impl Into<String>) -> UbError {
    UbError::Data(ErrorInfo::new(code, message))
}

fn object_field<'a>(record: &'a Map<String, Value>, key: &str) -> Result<Option<&'a Map<String, Value>>, UbError> {
    match record.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(data_error("ub_report.field_type", format!("`{key}` is not an object"))
            .with_context("field", key)),
    }
}

/// Benchmark name encoded in a `microbenchmark_<name>_<timestamp>.jsonl` file name.
pub fn name_from_file(path: &Path) -> Option<String> {
    let stem = path.file_name()?.to_str()?.strip_suffix(".jsonl")?;
    let (name, _timestamp) = stem.strip_prefix(MIRROR_PREFIX)?.rsplit_once('_')?;
    (!name.is_empty()).then(|| name.to_string())
}

/// Parses one stored record, flattening metadata then metrics.
///
/// The benchmark name is taken from the top level, then from the metadata,
/// then from `fallback_name`.
pub fn parse_line(line: &str, fallback_name: Option<&str>) -> Result<ParsedLine, UbError> {
    let value: Value = serde_json::from_str(line)
        .map_err(|err| data_error("ub_report.bad_json", err.to_string()))?;
    let Value::Object(record) = value else {
        return Err(data_error("ub_report.not_object", "record line is not a JSON object"));
    };
    let empty = Map::new();
    let metadata = object_field(&record, "metadata")?.unwrap_or(&empty);
    let metrics = object_field(&record, "metrics")?.unwrap_or(&empty);
    let benchmark_name = record
        .get("benchmark_name")
        .and_then(Value::as_str)
        .or_else(|| metadata.get("benchmark_name").and_then(Value::as_str))
        .or(fallback_name)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            data_error("ub_report.no_benchmark_name", "record carries no benchmark name")
                .with_context("field", "benchmark_name")
        })?
        .to_string();
    Ok(ParsedLine {
        benchmark_name,
        fields: flatten_fields(metadata, metrics),
        metric_keys: metrics.keys().cloned().collect(),
    })
}

fn collect_files(input: &Path) -> Result<Vec<PathBuf>, UbError> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(UbError::io(
            "ub_report.input_missing",
            input.display(),
            "input is neither a file nor a directory",
        ));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(input).sort_by_file_name() {
        let entry = entry.map_err(|err| UbError::io("ub_report.walk", input.display(), err))?;
        let path = entry.path();
        if entry.file_type().is_file()
            && path.extension().and_then(|ext| ext.to_str()) == Some(LOG_EXTENSION)
        {
            files.push(path.to_path_buf());
        }
    }
    // mirrors duplicate records already present in a run log
    if files.iter().any(|path| !is_mirror(path)) {
        let before = files.len();
        files.retain(|path| !is_mirror(path));
        if files.len() < before {
            tracing::info!(
                skipped = before - files.len(),
                "ignoring per-benchmark mirrors next to a run log"
            );
        }
    }
    Ok(files)
}

fn is_mirror(path: &Path) -> bool {
    name_from_file(path).is_some()
}

/// Splits raw file bytes into lines, dropping a trailing `\r` from each.
fn split_lines(bytes: &[u8]) -> impl Iterator<Item = &[u8]> {
    bytes
        .split(|byte| *byte == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

/// Loads a record log file or every `.jsonl` file below a directory.
///
/// When a directory holds a run log, the `microbenchmark_*` mirrors beside it
/// are not read. Lines that are not UTF-8 or do not parse are skipped with a
/// warning; I/O failures are returned.
pub fn load_records(input: &Path) -> Result<RecordLog, UbError> {
    let files = collect_files(input)?;
    let mut log = RecordLog::default();
    let mut digest = InputDigest::new();
    for path in &files {
        let bytes = fs::read(path).map_err(|err| UbError::io("ub_report.read", path.display(), err))?;
        digest.update(&bytes);
        log.stats.files += 1;
        let fallback = name_from_file(path);
        for (index, raw) in split_lines(&bytes).enumerate() {
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line,
                Err(err) => {
                    log.stats.lines += 1;
                    log.stats.skipped_lines += 1;
                    tracing::warn!(
                        file = %path.display(),
                        line = index + 1,
                        code = "ub_report.bad_utf8",
                        error = %err,
                        "skipping unreadable record"
                    );
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            log.stats.lines += 1;
            match parse_line(line, fallback.as_deref()) {
                Ok(parsed) => log.push(parsed),
                Err(err) => {
                    log.stats.skipped_lines += 1;
                    tracing::warn!(
                        file = %path.display(),
                        line = index + 1,
                        error = %err,
                        "skipping unreadable record"
                    );
                }
            }
        }
    }
    log.input_hash = digest.finish();
    tracing::info!(
        files = log.stats.files,
        records = log.stats.records,
        skipped = log.stats.skipped_lines,
        "loaded record log"
    );
    Ok(log)
}
