use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use ub_report::{generate_report, ReportArtifacts, ReportOptions};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Record log file, or a directory searched for `.jsonl` files; per-benchmark
    /// mirrors are ignored when a run log sits in the same tree.
    #[arg(long)]
    pub input: PathBuf,
    /// Workbook to write; a `.json` twin is written next to it.
    #[arg(long, default_value = "outputs/report.xlsx")]
    pub out: PathBuf,
    #[command(flatten)]
    pub options: ReportFlags,
}

/// Report knobs shared by `run --report` and `report`.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportFlags {
    /// Device type such as `v5p-128`; its suffix is the fallback device count.
    #[arg(long)]
    pub device_type: Option<String>,
    /// Metric to tabulate; repeat to track several. Defaults to bandwidth percentiles.
    #[arg(long = "metric", value_name = "NAME")]
    pub metrics: Vec<String>,
}

impl ReportFlags {
    pub fn to_options(&self) -> Result<ReportOptions, Box<dyn Error>> {
        let mut opts = ReportOptions::default().with_metrics(self.metrics.iter().cloned());
        if let Some(device_type) = &self.device_type {
            opts = opts.with_device_type(device_type)?;
        }
        Ok(opts)
    }
}

pub fn run(args: &ReportArgs) -> Result<(), Box<dyn Error>> {
    let opts = args.options.to_options()?;
    let artifacts = generate_report(&args.input, &args.out, &opts)?;
    summarize(&artifacts);
    Ok(())
}

pub fn summarize(artifacts: &ReportArtifacts) {
    for skipped in &artifacts.report.skipped {
        println!("skipped {}: {}", skipped.benchmark_name, skipped.reason);
    }
    println!(
        "wrote {} sheet(s) to {} ({} collision(s))",
        artifacts.report.sheets.len(),
        artifacts.workbook.display(),
        artifacts.report.collisions()
    );
}
