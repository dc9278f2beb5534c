use std::hint::black_box;

use serde_json::{json, Map};
use ub_core::{Metadata, Metrics, ParameterSet, RawResult, UbError};

use crate::params::{num_runs, required_usize, time_runs, times_ms};
use crate::stats::{rates, summarize};

pub(crate) const NAME: &str = "convolve_1d";
pub(crate) const ARGS: &[&str] = &["signal_size", "kernel_size", "times_ms"];

/// Full discrete convolution; `out.len() == signal.len() + kernel.len() - 1`.
fn convolve(signal: &[f32], kernel: &[f32], out: &mut [f32]) {
    out.iter_mut().for_each(|v| *v = 0.0);
    for (i, s) in signal.iter().enumerate() {
        for (j, k) in kernel.iter().enumerate() {
            out[i + j] += s * k;
        }
    }
}

pub(crate) fn run(params: &ParameterSet) -> Result<RawResult, UbError> {
    let signal_size = required_usize(params, NAME, "signal_size")?;
    let kernel_size = required_usize(params, NAME, "kernel_size")?;
    let runs = num_runs(params, NAME)?;
    let signal: Vec<f32> = (0..signal_size).map(|idx| (idx % 11) as f32).collect();
    let kernel: Vec<f32> = (0..kernel_size).map(|idx| 1.0 / (idx + 1) as f32).collect();
    let mut out = vec![0.0f32; signal_size + kernel_size - 1];
    let times = time_runs(runs, || {
        convolve(black_box(&signal), black_box(&kernel), &mut out);
        black_box(&mut out);
    });
    let mut raw = Map::new();
    raw.insert("times_ms".into(), json!(times));
    Ok(raw)
}

pub(crate) fn compute_metrics(args: &ParameterSet) -> Result<(Metadata, Metrics), UbError> {
    let signal_size = required_usize(args, NAME, "signal_size")?;
    let kernel_size = required_usize(args, NAME, "kernel_size")?;
    let times = times_ms(args, NAME)?;
    let flops = 2.0 * (signal_size * kernel_size) as f64;
    let bytes = ((2 * signal_size + 2 * kernel_size - 1) * std::mem::size_of::<f32>()) as f64;

    let mut metadata = Map::new();
    metadata.insert("signal_size".into(), json!(signal_size));
    metadata.insert("kernel_size".into(), json!(kernel_size));
    metadata.insert("num_devices".into(), json!(1));

    let mut metrics = Map::new();
    summarize("gflops", &rates(flops, &times, 1e9), &mut metrics);
    summarize("bandwidth_gbyte_s", &rates(bytes, &times, 1e9), &mut metrics);
    summarize("time_ms", &times, &mut metrics);
    Ok((metadata, metrics))
}
