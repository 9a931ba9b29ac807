use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use sched_exp::{run_processor_scan, ProcessorScan};

use super::sweep::FlushArg;
use super::{finish_report, interrupt_token};

#[derive(Args, Debug)]
pub struct ScanProcsArgs {
    /// Multi-processor solver executable.
    #[arg(long, default_value = "./main_mult.o")]
    pub solver: PathBuf,
    /// Smallest processor count.
    #[arg(long, default_value_t = 2)]
    pub min: u32,
    /// Largest processor count (inclusive).
    #[arg(long, default_value_t = 14)]
    pub max: u32,
    /// Increment between processor counts.
    #[arg(long, default_value_t = 2)]
    pub step: u32,
    /// Trials per processor count.
    #[arg(long, default_value_t = 3)]
    pub repeats: usize,
    /// Results table path.
    #[arg(long, default_value = "results_mult.csv")]
    pub results: PathBuf,
    /// Per-trial log path.
    #[arg(long)]
    pub trials: Option<PathBuf>,
    /// Per-trial wait bound in seconds.
    #[arg(long)]
    pub timeout_secs: Option<f64>,
    /// When completed rows reach the results file.
    #[arg(long, value_enum, default_value = "at-end")]
    pub flush: FlushArg,
}

pub fn run(args: &ScanProcsArgs) -> Result<(), Box<dyn Error>> {
    if args.step == 0 {
        return Err("--step must be at least 1".into());
    }
    if args.min > args.max {
        return Err(format!("--min {} exceeds --max {}", args.min, args.max).into());
    }
    let scan = ProcessorScan {
        solver: args.solver.clone(),
        processors: (args.min..=args.max).step_by(args.step as usize).collect(),
        repeats: args.repeats,
        timeout_secs: args.timeout_secs,
        flush: args.flush.into(),
        results: args.results.clone(),
        trials: args.trials.clone(),
    };
    let cancel = interrupt_token();
    let report = run_processor_scan(&scan, &cancel)?;
    finish_report(&report)
}
