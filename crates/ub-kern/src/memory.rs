use std::hint::black_box;

use serde_json::{json, Map};
use ub_core::{Metadata, Metrics, ParameterSet, RawResult, UbError};

use crate::params::{dtype, num_runs, required_usize, time_runs, times_ms};
use crate::stats::{rates, summarize};

pub(crate) const NAME: &str = "memory_copy";
pub(crate) const ARGS: &[&str] = &["num_elements", "dtype", "times_ms"];

/// Copies a `num_elements * sizeof(dtype)` byte buffer once per run.
pub(crate) fn run(params: &ParameterSet) -> Result<RawResult, UbError> {
    let elements = required_usize(params, NAME, "num_elements")?;
    let dtype = dtype(params, NAME)?;
    let runs = num_runs(params, NAME)?;
    let bytes = elements * dtype.size_bytes();
    let src: Vec<u8> = (0..bytes).map(|idx| (idx % 251) as u8).collect();
    let mut dst = vec![0u8; bytes];
    let times = time_runs(runs, || {
        dst.copy_from_slice(black_box(&src));
        black_box(&mut dst);
    });
    let mut raw = Map::new();
    raw.insert("times_ms".into(), json!(times));
    Ok(raw)
}

pub(crate) fn compute_metrics(args: &ParameterSet) -> Result<(Metadata, Metrics), UbError> {
    let elements = required_usize(args, NAME, "num_elements")?;
    let dtype = dtype(args, NAME)?;
    let times = times_ms(args, NAME)?;
    let bytes = (elements * dtype.size_bytes()) as f64;

    let mut metadata = Map::new();
    metadata.insert("num_elements".into(), json!(elements));
    metadata.insert("dtype".into(), json!(dtype.as_str()));
    metadata.insert("buffer_size".into(), json!(bytes as u64));
    metadata.insert("num_devices".into(), json!(1));

    let mut metrics = Map::new();
    // read + write traffic
    summarize("bandwidth_gbyte_s", &rates(2.0 * bytes, &times, 1e9), &mut metrics);
    summarize("time_ms", &times, &mut metrics);
    Ok((metadata, metrics))
}
