#![deny(missing_docs)]
#![doc = "Core record types, capability traits and errors shared by the ubench crates."]

pub mod errors;
pub mod hash;
pub mod provenance;
pub mod serde;
mod types;

pub use errors::{ErrorInfo, UbError};
pub use provenance::RunProvenance;
pub use types::{
    flatten_fields, BenchmarkRecord, FieldMap, Metadata, Metrics, ParameterSet, RawResult,
};

/// Executable half of a benchmark capability.
///
/// Implementations receive a fully preprocessed [`ParameterSet`] and return an
/// opaque key-value result that is later offered to the paired
/// [`MetricsCalculator`].
pub trait Benchmark: Send + Sync {
    /// Registered name of the benchmark.
    fn name(&self) -> &str;

    /// Runs the benchmark body once for the given parameters.
    fn run(&self, params: &ParameterSet) -> Result<RawResult, UbError>;
}

/// Metrics half of a benchmark capability.
pub trait MetricsCalculator: Send + Sync {
    /// Argument names accepted by [`MetricsCalculator::compute_metrics`].
    ///
    /// The dispatcher forwards only entries whose names appear here.
    fn accepted_args(&self) -> &[&str];

    /// Derives metadata and metrics from the filtered arguments.
    fn compute_metrics(&self, args: &ParameterSet) -> Result<(Metadata, Metrics), UbError>;
}
