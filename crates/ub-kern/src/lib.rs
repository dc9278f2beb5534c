//! Built-in microbenchmark capabilities.
//!
//! The set is closed: every runnable benchmark is a [`BuiltinBenchmark`]
//! variant, and each variant supplies both halves of the capability pair.

mod collectives;
mod convolve;
mod dtype;
mod matmul;
mod memory;
mod params;
pub mod stats;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ub_core::{
    Benchmark, ErrorInfo, Metadata, Metrics, MetricsCalculator, ParameterSet, RawResult, UbError,
};

pub use dtype::DType;

/// Closed set of benchmarks shipped with ubench.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinBenchmark {
    /// Host memory copy bandwidth.
    MemoryCopy,
    /// Single-threaded naive matrix multiply.
    NaiveMatmul,
    /// Full 1-D convolution.
    Convolve1d,
    /// Sharded element-wise sum broadcast back to every shard.
    AllReduce,
    /// Sharded concatenation replicated on every shard.
    AllGather,
}

impl BuiltinBenchmark {
    pub const ALL: [BuiltinBenchmark; 5] = [
        BuiltinBenchmark::MemoryCopy,
        BuiltinBenchmark::NaiveMatmul,
        BuiltinBenchmark::Convolve1d,
        BuiltinBenchmark::AllReduce,
        BuiltinBenchmark::AllGather,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinBenchmark::MemoryCopy => memory::NAME,
            BuiltinBenchmark::NaiveMatmul => matmul::NAME,
            BuiltinBenchmark::Convolve1d => convolve::NAME,
            BuiltinBenchmark::AllReduce => collectives::ALL_REDUCE,
            BuiltinBenchmark::AllGather => collectives::ALL_GATHER,
        }
    }
}

impl fmt::Display for BuiltinBenchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinBenchmark {
    type Err = UbError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        BuiltinBenchmark::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| {
                UbError::Config(
                    ErrorInfo::new(
                        "ub_kern.unknown_builtin",
                        format!("no built-in benchmark named {raw}"),
                    )
                    .with_context("benchmark", raw),
                )
            })
    }
}

impl Benchmark for BuiltinBenchmark {
    fn name(&self) -> &str {
        self.as_str()
    }

    fn run(&self, params: &ParameterSet) -> Result<RawResult, UbError> {
        tracing::debug!(benchmark = self.as_str(), params = params.len(), "running kernel");
        match self {
            BuiltinBenchmark::MemoryCopy => memory::run(params),
            BuiltinBenchmark::NaiveMatmul => matmul::run(params),
            BuiltinBenchmark::Convolve1d => convolve::run(params),
            BuiltinBenchmark::AllReduce => collectives::run_all_reduce(params),
            BuiltinBenchmark::AllGather => collectives::run_all_gather(params),
        }
    }
}

impl MetricsCalculator for BuiltinBenchmark {
    fn accepted_args(&self) -> &[&str] {
        match self {
            BuiltinBenchmark::MemoryCopy => memory::ARGS,
            BuiltinBenchmark::NaiveMatmul => matmul::ARGS,
            BuiltinBenchmark::Convolve1d => convolve::ARGS,
            BuiltinBenchmark::AllReduce | BuiltinBenchmark::AllGather => collectives::ARGS,
        }
    }

    fn compute_metrics(&self, args: &ParameterSet) -> Result<(Metadata, Metrics), UbError> {
        match self {
            BuiltinBenchmark::MemoryCopy => memory::compute_metrics(args),
            BuiltinBenchmark::NaiveMatmul => matmul::compute_metrics(args),
            BuiltinBenchmark::Convolve1d => convolve::compute_metrics(args),
            BuiltinBenchmark::AllReduce => collectives::all_reduce_metrics(args),
            BuiltinBenchmark::AllGather => collectives::all_gather_metrics(args),
        }
    }
}
