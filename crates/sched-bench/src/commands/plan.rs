use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Args;
use sched_exp::SweepPlan;

use super::ensure_parent;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Destination YAML file; printed to stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &PlanArgs) -> Result<(), Box<dyn Error>> {
    let yaml = SweepPlan::default().to_yaml_string()?;
    match &args.out {
        Some(path) => {
            ensure_parent(path)?;
            fs::write(path, yaml)?;
            println!("Default plan written to {}", path.display());
        }
        None => print!("{yaml}"),
    }
    Ok(())
}
