//! Typed accessors over loosely typed parameter and argument sets.

use std::time::Instant;

use serde_json::Value;
use ub_core::{ErrorInfo, ParameterSet, UbError};

use crate::dtype::DType;

pub(crate) const DEFAULT_NUM_RUNS: u64 = 1;

fn missing(benchmark: &str, field: &str, expected: &str) -> UbError {
    UbError::Benchmark(
        ErrorInfo::new(
            "ub_kern.bad_argument",
            format!("`{field}` must be {expected}"),
        )
        .with_context("benchmark", benchmark)
        .with_context("field", field),
    )
}

pub(crate) fn required_usize(
    params: &ParameterSet,
    benchmark: &str,
    field: &str,
) -> Result<usize, UbError> {
    params
        .get_u64(field)
        .filter(|value| *value > 0)
        .map(|value| value as usize)
        .ok_or_else(|| missing(benchmark, field, "a positive integer"))
}

pub(crate) fn num_runs(params: &ParameterSet, benchmark: &str) -> Result<usize, UbError> {
    match params.get("num_runs") {
        None => Ok(DEFAULT_NUM_RUNS as usize),
        Some(_) => required_usize(params, benchmark, "num_runs"),
    }
}

pub(crate) fn dtype(params: &ParameterSet, benchmark: &str) -> Result<DType, UbError> {
    match params.get("dtype") {
        None => Ok(DType::Float32),
        Some(Value::String(raw)) => raw.parse(),
        Some(_) => Err(missing(benchmark, "dtype", "a dtype name")),
    }
}

pub(crate) fn times_ms(args: &ParameterSet, benchmark: &str) -> Result<Vec<f64>, UbError> {
    args.get("times_ms")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_f64).collect::<Vec<_>>())
        .filter(|values| !values.is_empty())
        .ok_or_else(|| missing(benchmark, "times_ms", "a non-empty list of timings"))
}

/// Runs `body` `runs` times, returning wall-clock milliseconds per run.
pub(crate) fn time_runs<F: FnMut()>(runs: usize, mut body: F) -> Vec<f64> {
    (0..runs)
        .map(|_| {
            let start = Instant::now();
            body();
            start.elapsed().as_secs_f64() * 1e3
        })
        .collect()
}
