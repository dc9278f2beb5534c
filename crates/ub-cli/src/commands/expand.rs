use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Args;
use serde_json::json;
use ub_core::serde::to_json_line;
use ub_exp::{load_suite, prepare_suite, BenchmarkRegistry};

#[derive(Args, Debug)]
pub struct ExpandArgs {
    /// YAML suite configuration.
    #[arg(long)]
    pub config: PathBuf,
}

pub fn run(args: &ExpandArgs) -> Result<(), Box<dyn Error>> {
    let suite = load_suite(&args.config)?;
    let prepared = prepare_suite(&suite, &BenchmarkRegistry::with_builtins())?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for bench in &prepared {
        for params in &bench.param_sets {
            let line = to_json_line(&json!({
                "benchmark_name": bench.name(),
                "params": params,
            }))?;
            out.write_all(line.as_bytes())?;
        }
    }
    Ok(())
}
