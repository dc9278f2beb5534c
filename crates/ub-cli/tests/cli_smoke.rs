use std::fs;
use std::path::Path;
use std::process::Command;

fn ubench() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_ubench"));
    command.env("RUST_LOG", "warn");
    command
}

fn write_suite(dir: &Path, extra: &str) -> std::path::PathBuf {
    let yaml = format!(
        "metrics_log: {}\nbenchmarks:\n  - benchmark_name: memory_copy\n    benchmark_sweep_params:\n      - num_elements_range: {{start: 32, end: 128, multiplier: 2}}\n        num_runs: 1\n{extra}",
        dir.join("metrics_report.jsonl").display()
    );
    let path = dir.join("suite.yaml");
    fs::write(&path, yaml).expect("write suite");
    path
}

#[test]
fn list_prints_builtins() {
    let output = ubench().arg("list").output().expect("run ubench list");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|line| line.starts_with("memory_copy\t")));
    assert!(stdout.contains("all_gather"));
}

#[test]
fn expand_prints_one_json_line_per_parameter_set() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let suite = write_suite(temp.path(), "");
    let output = ubench()
        .args(["expand", "--config"])
        .arg(&suite)
        .output()
        .expect("run ubench expand");
    assert!(output.status.success());
    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    let sizes: Vec<u64> = lines
        .iter()
        .map(|line| line["params"]["num_elements"].as_u64().expect("size"))
        .collect();
    assert_eq!(sizes, vec![32, 64, 128]);
}

#[test]
fn run_with_report_and_failing_sweep_exits_non_zero() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let suite = write_suite(
        temp.path(),
        "  - benchmark_name: naive_matmul\n    benchmark_params:\n      - {m: 4}\n",
    );
    let report = temp.path().join("out/report.xlsx");
    let publish = temp.path().join("published");
    let status = ubench()
        .args(["run", "--config"])
        .arg(&suite)
        .arg("--report")
        .arg(&report)
        .args(["--device-type", "v5p-8"])
        .arg("--publish-dir")
        .arg(&publish)
        .status()
        .expect("run ubench run");
    assert!(!status.success());
    assert!(report.exists());
    assert!(publish.join("metrics_report.jsonl").exists());
    assert!(publish.join("report.json").exists());
}

#[test]
fn unknown_benchmark_is_rejected_before_running() {
    let temp = tempfile::tempdir().expect("tmp dir");
    let suite = write_suite(temp.path(), "  - benchmark_name: psum\n");
    let status = ubench()
        .args(["run", "--config"])
        .arg(&suite)
        .status()
        .expect("run ubench run");
    assert!(!status.success());
    assert!(!temp.path().join("metrics_report.jsonl").exists());
}
