use std::error::Error;
use std::path::PathBuf;

use clap::Args;
use sched_load::{generate_to_path, DurationRange, UniformSampler};

#[derive(Args, Debug)]
pub struct WorkloadArgs {
    /// Number of jobs.
    #[arg(long)]
    pub jobs: usize,
    /// Smallest job duration.
    #[arg(long, default_value_t = 1)]
    pub min_duration: u32,
    /// Largest job duration.
    #[arg(long, default_value_t = 100)]
    pub max_duration: u32,
    /// Output CSV path.
    #[arg(long, default_value = "jobs.csv")]
    pub out: PathBuf,
    /// Seed for the duration draws.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
}

pub fn run(args: &WorkloadArgs) -> Result<(), Box<dyn Error>> {
    let range = DurationRange::new(args.min_duration, args.max_duration)?;
    let out = &args.out;
    let mut sampler = UniformSampler::from_seed(args.seed);
    let workload = generate_to_path(args.jobs, range, &mut sampler, out)?;
    println!(
        "Wrote {} jobs (total duration {}) to {}",
        workload.size(),
        workload.total_duration(),
        out.display()
    );
    Ok(())
}
