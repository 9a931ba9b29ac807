use std::error::Error;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use sched_exp::{load_plan, run_sweep, FlushPolicy, SweepPlan};
use tracing::info;

use super::{finish_report, interrupt_token};

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// YAML plan; the built-in default sweep is used when omitted.
    #[arg(long)]
    pub plan: Option<PathBuf>,
    /// Solver executable.
    #[arg(long)]
    pub solver: Option<PathBuf>,
    /// Results table path.
    #[arg(long)]
    pub results: Option<PathBuf>,
    /// Per-trial log path.
    #[arg(long)]
    pub trials: Option<PathBuf>,
    /// Trials per configuration.
    #[arg(long)]
    pub repeats: Option<usize>,
    /// Per-trial wait bound in seconds.
    #[arg(long)]
    pub timeout_secs: Option<f64>,
    /// Master seed for workload generation.
    #[arg(long)]
    pub seed: Option<u64>,
    /// When completed rows reach the results file.
    #[arg(long, value_enum)]
    pub flush: Option<FlushArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FlushArg {
    AtEnd,
    PerRow,
}

impl From<FlushArg> for FlushPolicy {
    fn from(arg: FlushArg) -> Self {
        match arg {
            FlushArg::AtEnd => FlushPolicy::AtEnd,
            FlushArg::PerRow => FlushPolicy::PerRow,
        }
    }
}

pub fn run(args: &SweepArgs) -> Result<(), Box<dyn Error>> {
    let plan = resolve_plan(args)?;
    info!(
        configurations = plan.configurations().len(),
        results = %plan.results.display(),
        "sweep plan resolved"
    );
    let cancel = interrupt_token();
    let report = run_sweep(&plan, &cancel)?;
    finish_report(&report)
}

fn resolve_plan(args: &SweepArgs) -> Result<SweepPlan, Box<dyn Error>> {
    let mut plan = match &args.plan {
        Some(path) => load_plan(path)?,
        None => SweepPlan::default(),
    };
    if let Some(solver) = &args.solver {
        plan.solver = solver.clone();
    }
    if let Some(results) = &args.results {
        plan.results = results.clone();
    }
    if let Some(trials) = &args.trials {
        plan.trials = Some(trials.clone());
    }
    if let Some(repeats) = args.repeats {
        plan.repeats = repeats;
    }
    if let Some(timeout) = args.timeout_secs {
        plan.timeout_secs = Some(timeout);
    }
    if let Some(seed) = args.seed {
        plan.seed = seed;
    }
    if let Some(flush) = args.flush {
        plan.flush = flush.into();
    }
    plan.validate()?;
    Ok(plan)
}
