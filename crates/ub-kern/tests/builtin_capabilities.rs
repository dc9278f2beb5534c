use serde_json::{json, Value};
use ub_core::{Benchmark, MetricsCalculator, ParameterSet};
use ub_kern::{BuiltinBenchmark, DType};

fn params(value: Value) -> ParameterSet {
    match value {
        Value::Object(map) => ParameterSet::from(map),
        other => panic!("expected object, got {other}"),
    }
}

fn merged(params: &ParameterSet, raw: &ub_core::RawResult, accepted: &[&str]) -> ParameterSet {
    params
        .iter()
        .chain(raw.iter())
        .filter(|(key, _)| accepted.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[test]
fn names_roundtrip_through_from_str() {
    for kind in BuiltinBenchmark::ALL {
        let parsed: BuiltinBenchmark = kind.as_str().parse().expect("parse");
        assert_eq!(parsed, kind);
    }
    assert!("psum_scatter".parse::<BuiltinBenchmark>().is_err());
}

#[test]
fn every_builtin_runs_and_reports_device_count() {
    let cases = [
        (
            BuiltinBenchmark::MemoryCopy,
            json!({"num_elements": 256, "dtype": "bfloat16", "num_runs": 2}),
        ),
        (
            BuiltinBenchmark::NaiveMatmul,
            json!({"m": 8, "k": 4, "n": 8, "num_runs": 2}),
        ),
        (
            BuiltinBenchmark::Convolve1d,
            json!({"signal_size": 64, "kernel_size": 3, "num_runs": 2}),
        ),
        (
            BuiltinBenchmark::AllReduce,
            json!({"size": 128, "num_devices": 4, "num_runs": 2}),
        ),
        (
            BuiltinBenchmark::AllGather,
            json!({"size": 128, "num_devices": 2, "dtype": "int32", "num_runs": 2}),
        ),
    ];
    for (kind, value) in cases {
        let params = params(value);
        let raw = kind.run(&params).expect("run");
        assert_eq!(raw["times_ms"].as_array().map(Vec::len), Some(2));
        let args = merged(&params, &raw, kind.accepted_args());
        let (metadata, metrics) = kind.compute_metrics(&args).expect("metrics");
        assert!(metadata.contains_key("num_devices"), "{kind}");
        assert!(metrics.contains_key("bandwidth_gbyte_s_avg"), "{kind}");
        assert!(metrics.contains_key("time_ms_p99"), "{kind}");
    }
}

#[test]
fn memory_copy_bandwidth_follows_timings() {
    let args = params(json!({
        "num_elements": 500_000_000u64,
        "dtype": "float32",
        "times_ms": [1000.0, 2000.0]
    }));
    let (metadata, metrics) = BuiltinBenchmark::MemoryCopy
        .compute_metrics(&args)
        .expect("metrics");
    assert_eq!(metadata["buffer_size"], json!(2_000_000_000u64));
    // 2 GB buffer read and written: 4 GB per run.
    assert_eq!(metrics["bandwidth_gbyte_s_p50"], json!(3.0));
    assert_eq!(metrics["bandwidth_gbyte_s_avg"], json!(3.0));
}

#[test]
fn missing_required_argument_is_a_benchmark_error() {
    let err = BuiltinBenchmark::NaiveMatmul
        .run(&params(json!({"m": 4, "k": 4})))
        .expect_err("n missing");
    assert_eq!(err.info().code, "ub_kern.bad_argument");
    assert_eq!(err.info().context.get("field").map(String::as_str), Some("n"));
}

#[test]
fn unsupported_dtype_is_rejected() {
    assert!("float8".parse::<DType>().is_err());
    assert_eq!("bfloat16".parse::<DType>().expect("dtype").size_bytes(), 2);
}
