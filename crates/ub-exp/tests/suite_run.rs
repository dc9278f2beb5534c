use std::fs;
use std::path::Path;

use ub_core::BenchmarkRecord;
use ub_exp::{
    load_suite, prepare_suite, run_suite, BenchmarkRegistry, RunOpts, SuiteConfig, SweepStatus,
};

fn write_suite(dir: &Path, parallelism: usize) -> SuiteConfig {
    let yaml = format!(
        r#"
metrics_log: {log}
parallelism: {parallelism}
benchmarks:
  - benchmark_name: memory_copy
    metrics_dir: {mirror}
    csv_path: {csv}
    benchmark_sweep_params:
      - num_elements_range: {{start: 64, end: 256, multiplier: 2}}
        dtype: [float32, bfloat16]
        num_runs: 2
  - benchmark_name: naive_matmul
    benchmark_params:
      - {{m: 8, k: 4, n: SAME_AS_m}}
      - {{m: 8, dtype: float32}}
      - {{m: 16, k: 4, n: 16}}
"#,
        log = dir.join("logs/metrics_report.jsonl").display(),
        mirror = dir.join("mirror").display(),
        csv = dir.join("csv").display(),
    );
    let path = dir.join("suite.yaml");
    fs::write(&path, yaml).expect("write suite");
    load_suite(&path).expect("load suite")
}

fn read_records(path: &Path) -> Vec<BenchmarkRecord> {
    fs::read_to_string(path)
        .expect("read log")
        .lines()
        .map(|line| serde_json::from_str(line).expect("record line"))
        .collect()
}

#[test]
fn failed_invocation_stops_only_its_own_sweep() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let suite = write_suite(temp.path(), 1);
    let registry = BenchmarkRegistry::with_builtins();
    let summary = run_suite(&suite, &registry, &RunOpts::from_suite(&suite)).expect("run");

    assert!(summary.has_failures());
    assert_eq!(summary.outcomes[0].status, SweepStatus::Complete);
    assert_eq!(summary.outcomes[0].recorded, 6);
    match &summary.outcomes[1].status {
        SweepStatus::Failed { param_set, error } => {
            assert_eq!(*param_set, 1);
            assert_eq!(error.info().code, "ub_kern.bad_argument");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(summary.outcomes[1].recorded, 1);

    let records = read_records(&summary.metrics_log);
    assert_eq!(records.len(), 7);
    let elements: Vec<_> = records[..6]
        .iter()
        .map(|record| record.metadata["num_elements"].as_u64().expect("elements"))
        .collect();
    assert_eq!(elements, vec![64, 64, 128, 128, 256, 256]);
    assert_eq!(records[6].benchmark_name, "naive_matmul");
    assert_eq!(records[6].metadata["n"], serde_json::json!(8));
    assert!(records.iter().all(|record| record.start_time <= record.end_time));

    let mirror = summary.outcomes[0].mirror.as_ref().expect("mirror file");
    assert_eq!(read_records(mirror).len(), 6);
    let csv = summary.outcomes[0].csv.as_ref().expect("csv file");
    let body = fs::read_to_string(csv).expect("read csv");
    assert_eq!(body.lines().count(), 7);
    assert!(summary.outcomes[1].csv.is_none());
}

#[test]
fn pooled_mode_records_in_invocation_order() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let suite = write_suite(temp.path(), 4);
    let registry = BenchmarkRegistry::with_builtins();
    let summary = run_suite(&suite, &registry, &RunOpts { parallelism: 4 }).expect("run");
    let records = read_records(&summary.metrics_log);
    let shape: Vec<_> = records[..6]
        .iter()
        .map(|record| {
            (
                record.metadata["num_elements"].as_u64().expect("elements"),
                record.metadata["dtype"].as_str().expect("dtype").to_string(),
            )
        })
        .collect();
    assert_eq!(
        shape,
        vec![
            (64, "float32".to_string()),
            (64, "bfloat16".to_string()),
            (128, "float32".to_string()),
            (128, "bfloat16".to_string()),
            (256, "float32".to_string()),
            (256, "bfloat16".to_string()),
        ]
    );
    assert_eq!(summary.records(), 7);
}

#[test]
fn unknown_benchmark_fails_before_the_log_is_touched() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let mut suite = write_suite(temp.path(), 1);
    suite.benchmarks[1].benchmark_name = "psum_scatter".into();
    let registry = BenchmarkRegistry::with_builtins();
    let err = prepare_suite(&suite, &registry).expect_err("unknown name");
    assert_eq!(err.info().code, "ub_exp.unknown_benchmark");
    assert!(err.is_fatal());
    assert!(run_suite(&suite, &registry, &RunOpts::default()).is_err());
    assert!(!suite.metrics_log.exists());
}

#[test]
fn previous_log_is_truncated_at_run_start() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let suite = write_suite(temp.path(), 1);
    let registry = BenchmarkRegistry::with_builtins();
    run_suite(&suite, &registry, &RunOpts::default()).expect("first run");
    run_suite(&suite, &registry, &RunOpts::default()).expect("second run");
    assert_eq!(read_records(&suite.metrics_log).len(), 7);
}

#[test]
fn unwritable_csv_directory_is_reported_as_a_failure() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let mut suite = write_suite(temp.path(), 1);
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, b"occupied").expect("write blocker");
    suite.benchmarks[0].csv_path = Some(blocker);
    suite.benchmarks.truncate(1);
    let registry = BenchmarkRegistry::with_builtins();
    let summary = run_suite(&suite, &registry, &RunOpts::default()).expect("run");

    let outcome = &summary.outcomes[0];
    assert_eq!(outcome.status, SweepStatus::Complete);
    assert_eq!(outcome.recorded, 6);
    assert!(outcome.csv.is_none());
    let error = outcome.csv_error.as_ref().expect("csv error");
    assert_eq!(error.info().code, "ub_exp.create_dir");
    assert!(outcome.is_failure());
    assert!(summary.has_failures());
}

#[test]
fn integer_range_with_float_end_runs_builtin() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let mut suite = write_suite(temp.path(), 1);
    let sweep: serde_json::Value = serde_json::json!({
        "num_elements_range": {"start": 1024, "end": 1.0e4, "multiplier": 2},
        "num_runs": 1,
    });
    suite.benchmarks[0].benchmark_sweep_params = vec![sweep.as_object().expect("object").clone()];
    suite.benchmarks[0].csv_path = None;
    suite.benchmarks.truncate(1);
    let registry = BenchmarkRegistry::with_builtins();
    let summary = run_suite(&suite, &registry, &RunOpts::default()).expect("run");

    assert!(!summary.has_failures());
    let elements: Vec<_> = read_records(&summary.metrics_log)
        .iter()
        .map(|record| record.metadata["num_elements"].as_u64().expect("elements"))
        .collect();
    assert_eq!(elements, vec![1024, 2048, 4096, 8192]);
}
