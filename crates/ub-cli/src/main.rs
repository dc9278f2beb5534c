use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    expand::{self, ExpandArgs},
    list,
    report::{self, ReportArgs},
    run::{self, RunArgs},
};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "ubench", about = "Sweep-driven microbenchmark runner and pivot reporter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every benchmark of a suite and optionally build the report.
    Run(RunArgs),
    /// Build the pivot workbook from an existing record log.
    Report(ReportArgs),
    /// Print the expanded parameter sets of a suite as JSON lines.
    Expand(ExpandArgs),
    /// List the registered benchmarks and the arguments they accept.
    List,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run::run(&args),
        Command::Report(args) => report::run(&args),
        Command::Expand(args) => expand::run(&args),
        Command::List => list::run(),
    }
}
