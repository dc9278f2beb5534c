use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use ub_exp::{load_suite, run_suite, ArtifactSink, BenchmarkRegistry, DirectorySink, RunOpts, SweepStatus};
use ub_report::generate_report;

use super::report::{summarize, ReportFlags};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// YAML suite configuration.
    #[arg(long)]
    pub config: PathBuf,
    /// Worker count overriding the configuration; 1 runs sequentially.
    #[arg(long)]
    pub parallelism: Option<usize>,
    /// Build a pivot workbook from the run log once every benchmark finished.
    #[arg(long)]
    pub report: Option<PathBuf>,
    #[command(flatten)]
    pub report_flags: ReportFlags,
    /// Copy the run log and report artefacts into this directory.
    #[arg(long)]
    pub publish_dir: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<(), Box<dyn Error>> {
    let suite = load_suite(&args.config)?;
    tracing::info!(config = %args.config.display(), benchmarks = suite.benchmarks.len(), "loaded suite");
    let mut opts = RunOpts::from_suite(&suite);
    if let Some(parallelism) = args.parallelism {
        opts.parallelism = parallelism.max(1);
    }
    let registry = BenchmarkRegistry::with_builtins();
    let summary = run_suite(&suite, &registry, &opts)?;

    let mut published: Vec<PathBuf> = vec![summary.metrics_log.clone()];
    if let Some(out) = &args.report {
        let artifacts = generate_report(&summary.metrics_log, out, &args.report_flags.to_options()?)?;
        summarize(&artifacts);
        published.push(artifacts.workbook);
        published.push(artifacts.json);
    }
    if let Some(dir) = &args.publish_dir {
        publish(&DirectorySink::new(dir), &published)?;
    }

    for outcome in &summary.outcomes {
        match &outcome.status {
            SweepStatus::Complete => println!(
                "{}: {}/{} recorded",
                outcome.benchmark_name, outcome.recorded, outcome.planned
            ),
            SweepStatus::Failed { param_set, error } => println!(
                "{}: failed at parameter set {param_set}: {error}",
                outcome.benchmark_name
            ),
        }
        if let Some(error) = &outcome.csv_error {
            println!("{}: CSV output not written: {error}", outcome.benchmark_name);
        }
    }
    if summary.has_failures() {
        let failed = summary.outcomes.iter().filter(|outcome| outcome.is_failure()).count();
        return Err(format!("{failed} benchmark(s) failed").into());
    }
    Ok(())
}

fn publish(sink: &dyn ArtifactSink, files: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    for file in files {
        let name = file
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| format!("cannot publish {}", file.display()))?;
        sink.publish(file, name)?;
    }
    Ok(())
}
