//! driftool - measures merge drift across Git branches.
//!
//! Loads a YAML analysis config, runs either the Git-analysis pipeline or
//! the CSV-ingress bypass depending on the config, and writes the result
//! artifacts (JSON, run log, optional simple export) to the configured
//! output directory.

use anyhow::Result;
use clap::Parser;
use driftool::artifact::write_artifacts;
use driftool::config::{Config, SystemConfig};
use driftool::core::engine::{run_analysis, run_csv_analysis};
use driftool::core::MeasuredEnvironment;
use driftool::logging::{init_logging, RunLog};
use driftool::output::{CliOutput, Output, OutputConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "driftool")]
#[command(version = driftool::VERSION)]
#[command(about = "Measures merge drift across Git branches via pairwise speculative merges")]
pub struct Args {
    #[arg(short = 'c', long = "config", help = "Path to the YAML analysis config")]
    config: PathBuf,

    #[arg(
        long = "system-config",
        help = "Path to the YAML system config (thread count); defaults to ./driftool_system.yaml"
    )]
    system_config: Option<PathBuf>,

    #[arg(short = 'q', long = "quiet", help = "Suppress all but the final result")]
    quiet: bool,

    #[arg(short = 'v', long = "verbose", help = "Show per-step progress")]
    verbose: bool,

    #[arg(long = "threads", help = "Override the system config's worker-thread count")]
    threads: Option<usize>,

    #[arg(long = "json", help = "Emit only the JSON artifact to stdout, suppressing step chatter")]
    json: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    driftool::check_dependencies()?;

    let config = Config::load(&args.config)?;

    let system_path = args
        .system_config
        .clone()
        .unwrap_or_else(|| PathBuf::from("driftool_system.yaml"));
    let mut system = if system_path.exists() {
        SystemConfig::load(&system_path)?
    } else {
        SystemConfig::default()
    };
    if let Some(threads) = args.threads {
        system.number_threads = threads;
    }
    system.validate()?;

    let output_config = OutputConfig::new(args.quiet, args.verbose, args.json);
    let mut output = CliOutput::new(output_config);
    let run_log = Arc::new(RunLog::new());

    let result = if config.uses_csv_ingress() {
        run_csv_analysis(&config, &mut output)
    } else {
        run_analysis(&config, &system, &mut output, &run_log)
    };

    let environment = match result {
        Ok(environment) => environment,
        Err(err) => {
            output.error(&format!("analysis failed: {err:#}"));
            run_log.push(format!("analysis failed: {err:#}"));
            let degraded = MeasuredEnvironment::degraded(Vec::new());
            write_artifacts(&config, &degraded, &run_log).ok();
            return Err(err);
        }
    };

    if args.json {
        output.raw(&serde_json::to_string_pretty(&environment)?);
    }

    write_artifacts(&config, &environment, &run_log)?;
    Ok(())
}
