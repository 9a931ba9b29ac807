use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{BenchError, ErrorInfo};

/// A single job in a workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Identifier of the form `Job_<n>`, unique within its workload.
    pub id: String,
    /// Positive integer duration.
    pub duration: u32,
}

impl Job {
    /// Builds the identifier for the 1-based job index.
    pub fn id_for(index: usize) -> String {
        format!("Job_{index}")
    }
}

/// Ordered list of jobs consumed by the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Workload {
    /// Jobs in file order.
    pub jobs: Vec<Job>,
}

impl Workload {
    /// Number of jobs in the workload.
    pub fn size(&self) -> usize {
        self.jobs.len()
    }

    /// Sum of all job durations.
    pub fn total_duration(&self) -> u64 {
        self.jobs.iter().map(|job| u64::from(job.duration)).sum()
    }
}

/// Annealing cooling schedule understood by the solver.
///
/// Names are case sensitive on the solver's command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoolingMethod {
    /// Boltzmann schedule.
    Boltzmann,
    /// Cauchy schedule.
    Cauchy,
    /// Logarithmic schedule.
    Logarithmic,
}

impl CoolingMethod {
    /// All cooling methods in their canonical order.
    pub const ALL: [CoolingMethod; 3] = [
        CoolingMethod::Boltzmann,
        CoolingMethod::Cauchy,
        CoolingMethod::Logarithmic,
    ];

    /// Command line spelling of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            CoolingMethod::Boltzmann => "boltzmann",
            CoolingMethod::Cauchy => "cauchy",
            CoolingMethod::Logarithmic => "logarithmic",
        }
    }
}

impl fmt::Display for CoolingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CoolingMethod {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoolingMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| {
                BenchError::Plan(
                    ErrorInfo::new("unknown-cooling-method", "unrecognised cooling method")
                        .with_context("method", s)
                        .with_hint("expected one of: boltzmann, cauchy, logarithmic"),
                )
            })
    }
}

/// One point of the sweep space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    /// Number of jobs in the workload.
    pub num_jobs: usize,
    /// Number of processors passed to the solver.
    pub num_processors: u32,
    /// Cooling schedule passed to the solver.
    pub cooling_method: CoolingMethod,
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} jobs, {} processors, {} cooling",
            self.num_jobs, self.num_processors, self.cooling_method
        )
    }
}
