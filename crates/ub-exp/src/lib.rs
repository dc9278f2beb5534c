//! Sweep expansion, benchmark dispatch and record logging for ubench suites.

mod config;
mod csv_out;
mod dispatch;
mod preprocess;
mod recorder;
mod run;
mod sink;
mod sweep;

pub use config::{load_suite, BenchmarkConfig, SuiteConfig, SweepSpec, DEFAULT_METRICS_LOG};
pub use csv_out::write_results_csv;
pub use dispatch::{filter_args, invoke, BenchmarkRegistry, Capability, Invocation};
pub use preprocess::{preprocess, resolve_same_as, SAME_AS_PREFIX};
pub use recorder::MetricsRecorder;
pub use run::{
    prepare_suite, run_suite, BenchmarkOutcome, PreparedBenchmark, RunOpts, RunSummary,
    SweepStatus,
};
pub use sink::{ArtifactSink, DirectorySink};
pub use sweep::{expand_benchmark, expand_sweep, MAX_RANGE_VALUES};
