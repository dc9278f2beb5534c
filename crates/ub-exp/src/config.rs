use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use ub_core::serde::from_yaml_slice;
use ub_core::{ErrorInfo, FieldMap, ParameterSet, UbError};

/// Default location of the run-level record log.
pub const DEFAULT_METRICS_LOG: &str = "outputs/metrics_report.jsonl";

/// One sweep declaration: parameter name to literal, list, or range spec.
pub type SweepSpec = FieldMap;

/// Configuration for a single benchmark entry of the suite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Registered benchmark name.
    #[serde(default)]
    pub benchmark_name: String,
    /// Explicit parameter sets, run before any swept ones.
    #[serde(default)]
    pub benchmark_params: Vec<ParameterSet>,
    /// Sweep declarations expanded in list order.
    #[serde(default)]
    pub benchmark_sweep_params: Vec<SweepSpec>,
    /// Directory passed to the benchmark body as `trace_dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_dir: Option<PathBuf>,
    /// Directory receiving a per-benchmark copy of this run's records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_dir: Option<PathBuf>,
    /// Directory receiving the CSV side output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_path: Option<PathBuf>,
}

/// Top level suite document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteConfig {
    /// Run-level append-only record log; truncated at the start of every run.
    #[serde(default = "SuiteConfig::default_metrics_log")]
    pub metrics_log: PathBuf,
    /// Worker count; values above one enable the pooled execution mode.
    #[serde(default = "SuiteConfig::default_parallelism")]
    pub parallelism: usize,
    /// Benchmarks executed in declared order.
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkConfig>,
}

impl SuiteConfig {
    fn default_metrics_log() -> PathBuf {
        PathBuf::from(DEFAULT_METRICS_LOG)
    }

    const fn default_parallelism() -> usize {
        1
    }

    /// Structural checks that do not need the registry.
    pub fn validate(&self) -> Result<(), UbError> {
        if self.benchmarks.is_empty() {
            return Err(UbError::Config(
                ErrorInfo::new(
                    "ub_exp.no_benchmarks",
                    "configuration must contain a non-empty `benchmarks` list",
                )
                .with_hint("add at least one entry with a `benchmark_name`"),
            ));
        }
        for (index, bench) in self.benchmarks.iter().enumerate() {
            if bench.benchmark_name.trim().is_empty() {
                return Err(UbError::Config(
                    ErrorInfo::new("ub_exp.missing_name", "each benchmark needs a `benchmark_name`")
                        .with_context("entry", index.to_string()),
                ));
            }
        }
        Ok(())
    }
}

/// Loads and structurally validates a suite configuration from disk.
pub fn load_suite<P: AsRef<Path>>(path: P) -> Result<SuiteConfig, UbError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|err| UbError::io("ub_exp.config_read", path.display(), err))?;
    let suite: SuiteConfig = from_yaml_slice(&bytes)
        .map_err(|err| err.with_context("path", path.display().to_string()))?;
    suite.validate()?;
    Ok(suite)
}
