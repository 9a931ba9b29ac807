use std::error::Error;

use clap::{Parser, Subcommand};
use commands::{
    plan::{self, PlanArgs},
    scan_procs::{self, ScanProcsArgs},
    sweep::{self, SweepArgs},
    workload::{self, WorkloadArgs},
};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "sched-bench", about = "Benchmark sweeps for an external scheduling solver")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the jobs x processors x cooling-method sweep.
    Sweep(SweepArgs),
    /// Run the processor-only scan of the multi-processor solver.
    ScanProcs(ScanProcsArgs),
    /// Generate a single workload file.
    Workload(WorkloadArgs),
    /// Write the default sweep plan as YAML.
    Plan(PlanArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Sweep(args) => sweep::run(&args),
        Command::ScanProcs(args) => scan_procs::run(&args),
        Command::Workload(args) => workload::run(&args),
        Command::Plan(args) => plan::run(&args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
