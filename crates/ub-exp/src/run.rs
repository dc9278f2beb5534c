use std::path::{Path, PathBuf};

use chrono::Utc;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use ub_core::{BenchmarkRecord, ErrorInfo, FieldMap, ParameterSet, UbError};

use crate::config::{BenchmarkConfig, SuiteConfig};
use crate::csv_out::write_results_csv;
use crate::dispatch::{invoke, BenchmarkRegistry, Capability, Invocation};
use crate::preprocess::preprocess;
use crate::recorder::MetricsRecorder;
use crate::sweep::expand_benchmark;

/// Options governing suite execution.
#[derive(Debug, Clone)]
pub struct RunOpts {
    /// Worker count; one keeps the strictly sequential dispatch loop.
    pub parallelism: usize,
}

impl Default for RunOpts {
    fn default() -> Self {
        Self { parallelism: 1 }
    }
}

impl RunOpts {
    pub fn from_suite(suite: &SuiteConfig) -> Self {
        Self {
            parallelism: suite.parallelism.max(1),
        }
    }
}

/// A benchmark entry whose parameter sets are fully expanded and preprocessed.
#[derive(Debug, Clone)]
pub struct PreparedBenchmark {
    pub config: BenchmarkConfig,
    pub param_sets: Vec<ParameterSet>,
}

impl PreparedBenchmark {
    pub fn name(&self) -> &str {
        &self.config.benchmark_name
    }
}

/// Validates the whole suite and expands every benchmark before anything runs.
pub fn prepare_suite(
    suite: &SuiteConfig,
    registry: &BenchmarkRegistry,
) -> Result<Vec<PreparedBenchmark>, UbError> {
    suite.validate()?;
    registry.validate(suite.benchmarks.iter().map(|b| b.benchmark_name.as_str()))?;
    suite
        .benchmarks
        .iter()
        .map(|config| {
            let trace_dir = config.trace_dir.as_deref();
            let param_sets = expand_benchmark(config)?
                .into_iter()
                .enumerate()
                .map(|(index, params)| {
                    preprocess(params, trace_dir).map_err(|err| {
                        err.with_context("benchmark", config.benchmark_name.clone())
                            .with_context("param_set", index.to_string())
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if param_sets.is_empty() {
                tracing::warn!(benchmark = %config.benchmark_name, "benchmark has no parameter sets");
            }
            Ok(PreparedBenchmark {
                config: config.clone(),
                param_sets,
            })
        })
        .collect()
}

/// Terminal state of one benchmark's sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum SweepStatus {
    Complete,
    /// The invocation at `param_set` failed; later sets were not recorded.
    Failed { param_set: usize, error: UbError },
}

/// Per-benchmark outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkOutcome {
    pub benchmark_name: String,
    pub planned: usize,
    pub recorded: usize,
    pub status: SweepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv: Option<PathBuf>,
    /// Why the requested CSV side output could not be written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_error: Option<UbError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror: Option<PathBuf>,
}

impl BenchmarkOutcome {
    /// True when the sweep aborted or a requested side output is missing.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, SweepStatus::Failed { .. }) || self.csv_error.is_some()
    }
}

/// Summary of a complete suite run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub metrics_log: PathBuf,
    pub outcomes: Vec<BenchmarkOutcome>,
}

impl RunSummary {
    /// True when any benchmark sweep aborted or lost its CSV output.
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(BenchmarkOutcome::is_failure)
    }

    /// Total records appended to the run log.
    pub fn records(&self) -> usize {
        self.outcomes.iter().map(|outcome| outcome.recorded).sum()
    }
}

/// Expands, dispatches and records an entire suite.
///
/// The run log is recreated first. Invocation failures abort only the owning
/// benchmark's sweep; configuration and persistence errors abort the run.
pub fn run_suite(
    suite: &SuiteConfig,
    registry: &BenchmarkRegistry,
    opts: &RunOpts,
) -> Result<RunSummary, UbError> {
    let prepared = prepare_suite(suite, registry)?;
    let mut recorder = MetricsRecorder::create(&suite.metrics_log)?;
    tracing::info!(
        log = %suite.metrics_log.display(),
        benchmarks = prepared.len(),
        parallelism = opts.parallelism,
        "starting suite"
    );
    let pool = if opts.parallelism > 1 {
        Some(
            rayon::ThreadPoolBuilder::new()
                .num_threads(opts.parallelism)
                .build()
                .map_err(|err| {
                    UbError::Config(ErrorInfo::new("ub_exp.thread_pool", err.to_string()))
                })?,
        )
    } else {
        None
    };

    let mut outcomes = Vec::with_capacity(prepared.len());
    for bench in &prepared {
        let capability = registry.resolve(bench.name())?;
        tracing::info!(benchmark = bench.name(), planned = bench.param_sets.len(), "starting benchmark");
        let outcome = match &pool {
            Some(pool) => run_pooled(pool, capability, bench, &mut recorder)?,
            None => run_sequential(capability, bench, &mut recorder)?,
        };
        match &outcome.status {
            SweepStatus::Complete => tracing::info!(
                benchmark = bench.name(),
                recorded = outcome.recorded,
                "benchmark complete"
            ),
            SweepStatus::Failed { param_set, error } => tracing::error!(
                benchmark = bench.name(),
                param_set,
                recorded = outcome.recorded,
                %error,
                "benchmark sweep aborted"
            ),
        }
        outcomes.push(outcome);
    }
    Ok(RunSummary {
        metrics_log: recorder.path().to_path_buf(),
        outcomes,
    })
}

/// Collects records for one benchmark and fans them out to every destination.
struct BenchmarkSink<'a> {
    recorder: &'a mut MetricsRecorder,
    mirror: Option<MetricsRecorder>,
    rows: Vec<FieldMap>,
    name: &'a str,
}

impl<'a> BenchmarkSink<'a> {
    fn open(bench: &'a PreparedBenchmark, recorder: &'a mut MetricsRecorder) -> Result<Self, UbError> {
        let mirror = match &bench.config.metrics_dir {
            Some(dir) => Some(MetricsRecorder::create(mirror_path(dir, bench.name()))?),
            None => None,
        };
        Ok(Self {
            recorder,
            mirror,
            rows: Vec::new(),
            name: bench.name(),
        })
    }

    fn record(&mut self, params: &ParameterSet, invocation: Invocation) -> Result<(), UbError> {
        tracing::debug!(benchmark = self.name, params = ?params.as_map(), "recording invocation");
        let record = BenchmarkRecord {
            benchmark_name: self.name.to_string(),
            metadata: invocation.metadata,
            metrics: invocation.metrics,
            start_time: invocation.start_time,
            end_time: invocation.end_time,
        };
        self.recorder.append(&record)?;
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.append(&record)?;
        }
        self.rows.push(record.flatten());
        Ok(())
    }

    fn finish(self, bench: &PreparedBenchmark, status: SweepStatus) -> BenchmarkOutcome {
        let (mut csv, mut csv_error) = (None, None);
        if let Some(dir) = bench.config.csv_path.as_deref() {
            match write_results_csv(dir, bench.name(), &self.rows) {
                Ok(path) => csv = Some(path),
                // nothing recorded is already visible through `recorded`
                Err(err) if err.info().code == "ub_exp.csv_empty" => {
                    tracing::warn!(benchmark = bench.name(), %err, "CSV side output skipped")
                }
                Err(err) => {
                    tracing::error!(benchmark = bench.name(), %err, "CSV side output failed");
                    csv_error = Some(err);
                }
            }
        }
        BenchmarkOutcome {
            benchmark_name: bench.name().to_string(),
            planned: bench.param_sets.len(),
            recorded: self.rows.len(),
            status,
            csv,
            csv_error,
            mirror: self.mirror.map(|mirror| mirror.path().to_path_buf()),
        }
    }
}

fn mirror_path(dir: &Path, benchmark: &str) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.6fZ");
    dir.join(format!("microbenchmark_{benchmark}_{stamp}.jsonl"))
}

fn run_sequential(
    capability: Capability<'_>,
    bench: &PreparedBenchmark,
    recorder: &mut MetricsRecorder,
) -> Result<BenchmarkOutcome, UbError> {
    let mut sink = BenchmarkSink::open(bench, recorder)?;
    for (index, params) in bench.param_sets.iter().enumerate() {
        tracing::info!(benchmark = bench.name(), index, params = ?params.as_map(), "running");
        match invoke(capability, params) {
            Ok(invocation) => sink.record(params, invocation)?,
            Err(error) => {
                return Ok(sink.finish(
                    bench,
                    SweepStatus::Failed {
                        param_set: index,
                        error: error.with_context("param_set", index.to_string()),
                    },
                ))
            }
        }
    }
    Ok(sink.finish(bench, SweepStatus::Complete))
}

/// Worker-pool mode: every parameter set runs on the pool, then results are
/// recorded in invocation order once all workers have joined.
fn run_pooled(
    pool: &rayon::ThreadPool,
    capability: Capability<'_>,
    bench: &PreparedBenchmark,
    recorder: &mut MetricsRecorder,
) -> Result<BenchmarkOutcome, UbError> {
    let results: Vec<Result<Invocation, UbError>> = pool.install(|| {
        bench
            .param_sets
            .par_iter()
            .map(|params| invoke(capability, params))
            .collect()
    });
    let mut sink = BenchmarkSink::open(bench, recorder)?;
    for (index, (params, result)) in bench.param_sets.iter().zip(results).enumerate() {
        match result {
            Ok(invocation) => sink.record(params, invocation)?,
            Err(error) => {
                return Ok(sink.finish(
                    bench,
                    SweepStatus::Failed {
                        param_set: index,
                        error: error.with_context("param_set", index.to_string()),
                    },
                ))
            }
        }
    }
    Ok(sink.finish(bench, SweepStatus::Complete))
}
