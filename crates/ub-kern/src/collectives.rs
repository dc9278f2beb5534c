//! Host-side stand-ins for multi-device collectives.
//!
//! Each "device" owns one shard; the shards are processed on the rayon pool so
//! the measured time reflects shard-parallel data movement on this host.

use std::hint::black_box;

use rayon::prelude::*;
use serde_json::{json, Map};
use ub_core::{Metadata, Metrics, ParameterSet, RawResult, UbError};

use crate::dtype::DType;
use crate::params::{dtype, num_runs, required_usize, time_runs, times_ms};
use crate::stats::{rates, summarize};

pub(crate) const ALL_REDUCE: &str = "all_reduce";
pub(crate) const ALL_GATHER: &str = "all_gather";
pub(crate) const ARGS: &[&str] = &["size", "num_devices", "dtype", "times_ms"];

const CHUNK: usize = 4096;

fn shards(devices: usize, size: usize) -> Vec<Vec<f32>> {
    (0..devices)
        .map(|device| (0..size).map(|idx| ((idx + device) % 13) as f32).collect())
        .collect()
}

fn all_reduce(shards: &mut [Vec<f32>], scratch: &mut [f32]) {
    let view: &[Vec<f32>] = shards;
    scratch
        .par_chunks_mut(CHUNK)
        .enumerate()
        .for_each(|(chunk_idx, chunk)| {
            let offset = chunk_idx * CHUNK;
            for (idx, acc) in chunk.iter_mut().enumerate() {
                *acc = view.iter().map(|shard| shard[offset + idx]).sum();
            }
        });
    shards
        .par_iter_mut()
        .for_each(|shard| shard.copy_from_slice(scratch));
}

fn all_gather(shards: &[Vec<f32>], gathered: &mut [Vec<f32>]) {
    gathered.par_iter_mut().for_each(|out| {
        for (device, shard) in shards.iter().enumerate() {
            out[device * shard.len()..(device + 1) * shard.len()].copy_from_slice(shard);
        }
    });
}

pub(crate) fn run_all_reduce(params: &ParameterSet) -> Result<RawResult, UbError> {
    let size = required_usize(params, ALL_REDUCE, "size")?;
    let devices = required_usize(params, ALL_REDUCE, "num_devices")?;
    dtype(params, ALL_REDUCE)?;
    let runs = num_runs(params, ALL_REDUCE)?;
    let mut data = shards(devices, size);
    let mut scratch = vec![0.0f32; size];
    let times = time_runs(runs, || {
        all_reduce(black_box(&mut data), &mut scratch);
    });
    let mut raw = Map::new();
    raw.insert("times_ms".into(), json!(times));
    Ok(raw)
}

pub(crate) fn run_all_gather(params: &ParameterSet) -> Result<RawResult, UbError> {
    let size = required_usize(params, ALL_GATHER, "size")?;
    let devices = required_usize(params, ALL_GATHER, "num_devices")?;
    dtype(params, ALL_GATHER)?;
    let runs = num_runs(params, ALL_GATHER)?;
    let data = shards(devices, size);
    let mut gathered = vec![vec![0.0f32; size * devices]; devices];
    let times = time_runs(runs, || {
        all_gather(black_box(&data), &mut gathered);
        black_box(&mut gathered);
    });
    let mut raw = Map::new();
    raw.insert("times_ms".into(), json!(times));
    Ok(raw)
}

/// Bus-bandwidth factor applied to the per-device payload.
fn bus_factor(benchmark: &str, devices: usize) -> f64 {
    let n = devices as f64;
    match benchmark {
        ALL_REDUCE => 2.0 * (n - 1.0) / n,
        _ => (n - 1.0) / n,
    }
}

fn collective_metrics(
    benchmark: &str,
    args: &ParameterSet,
) -> Result<(Metadata, Metrics), UbError> {
    let size = required_usize(args, benchmark, "size")?;
    let devices = required_usize(args, benchmark, "num_devices")?;
    let dtype: DType = dtype(args, benchmark)?;
    let times = times_ms(args, benchmark)?;
    let shard_bytes = (size * dtype.size_bytes()) as f64;
    let payload = match benchmark {
        ALL_GATHER => shard_bytes * devices as f64,
        _ => shard_bytes,
    };

    let mut metadata = Map::new();
    metadata.insert("size".into(), json!(size));
    metadata.insert("buffer_size".into(), json!(payload as u64));
    metadata.insert("dtype".into(), json!(dtype.as_str()));
    metadata.insert("num_devices".into(), json!(devices));

    let mut metrics = Map::new();
    let bus_bytes = payload * bus_factor(benchmark, devices);
    summarize("bandwidth_gbyte_s", &rates(bus_bytes, &times, 1e9), &mut metrics);
    summarize("time_ms", &times, &mut metrics);
    Ok((metadata, metrics))
}

pub(crate) fn all_reduce_metrics(args: &ParameterSet) -> Result<(Metadata, Metrics), UbError> {
    collective_metrics(ALL_REDUCE, args)
}

pub(crate) fn all_gather_metrics(args: &ParameterSet) -> Result<(Metadata, Metrics), UbError> {
    collective_metrics(ALL_GATHER, args)
}
