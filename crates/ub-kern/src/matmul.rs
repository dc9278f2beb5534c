use std::hint::black_box;

use serde_json::{json, Map};
use ub_core::{Metadata, Metrics, ParameterSet, RawResult, UbError};

use crate::params::{dtype, num_runs, required_usize, time_runs, times_ms};
use crate::stats::{rates, summarize};

pub(crate) const NAME: &str = "naive_matmul";
pub(crate) const ARGS: &[&str] = &["m", "k", "n", "dtype", "times_ms"];

/// Row-major `(m x k) * (k x n)` product with the i-p-j loop order.
fn matmul(lhs: &[f32], rhs: &[f32], out: &mut [f32], m: usize, k: usize, n: usize) {
    out.iter_mut().for_each(|v| *v = 0.0);
    for i in 0..m {
        let row = &mut out[i * n..(i + 1) * n];
        for p in 0..k {
            let a = lhs[i * k + p];
            let rhs_row = &rhs[p * n..(p + 1) * n];
            for (acc, b) in row.iter_mut().zip(rhs_row) {
                *acc += a * b;
            }
        }
    }
}

pub(crate) fn run(params: &ParameterSet) -> Result<RawResult, UbError> {
    let m = required_usize(params, NAME, "m")?;
    let k = required_usize(params, NAME, "k")?;
    let n = required_usize(params, NAME, "n")?;
    dtype(params, NAME)?;
    let runs = num_runs(params, NAME)?;
    let lhs: Vec<f32> = (0..m * k).map(|idx| (idx % 7) as f32 * 0.5).collect();
    let rhs: Vec<f32> = (0..k * n).map(|idx| (idx % 5) as f32 * 0.25).collect();
    let mut out = vec![0.0f32; m * n];
    let times = time_runs(runs, || {
        matmul(black_box(&lhs), black_box(&rhs), &mut out, m, k, n);
        black_box(&mut out);
    });
    let mut raw = Map::new();
    raw.insert("times_ms".into(), json!(times));
    raw.insert("checksum".into(), json!(out.iter().map(|v| *v as f64).sum::<f64>()));
    Ok(raw)
}

pub(crate) fn compute_metrics(args: &ParameterSet) -> Result<(Metadata, Metrics), UbError> {
    let m = required_usize(args, NAME, "m")?;
    let k = required_usize(args, NAME, "k")?;
    let n = required_usize(args, NAME, "n")?;
    let dtype = dtype(args, NAME)?;
    let times = times_ms(args, NAME)?;
    let flops = 2.0 * (m * k * n) as f64;
    let bytes = ((m * k + k * n + m * n) * dtype.size_bytes()) as f64;

    let mut metadata = Map::new();
    metadata.insert("m".into(), json!(m));
    metadata.insert("k".into(), json!(k));
    metadata.insert("n".into(), json!(n));
    metadata.insert("dtype".into(), json!(dtype.as_str()));
    metadata.insert("num_devices".into(), json!(1));

    let mut metrics = Map::new();
    summarize("tflops", &rates(flops, &times, 1e12), &mut metrics);
    summarize("bandwidth_gbyte_s", &rates(bytes, &times, 1e9), &mut metrics);
    summarize("time_ms", &times, &mut metrics);
    Ok((metadata, metrics))
}
