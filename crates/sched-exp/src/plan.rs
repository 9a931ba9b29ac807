use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sched_core::errors::{BenchError, ErrorInfo};
use sched_core::{Configuration, CoolingMethod};
use sched_load::DurationRange;
use serde::{Deserialize, Serialize};

use crate::hash::stable_hash_string;
use crate::serde::to_yaml_string;
use crate::table::FlushPolicy;

fn plan_error(code: &str, message: impl Into<String>) -> BenchError {
    BenchError::Plan(ErrorInfo::new(code, message))
}

/// Workload axis of the sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadSpec {
    /// Job counts to sweep, in traversal order.
    pub sizes: Vec<usize>,
    /// Smallest job duration.
    #[serde(default = "WorkloadSpec::default_min_duration")]
    pub min_duration: u32,
    /// Largest job duration.
    #[serde(default = "WorkloadSpec::default_max_duration")]
    pub max_duration: u32,
    /// Directory receiving `jobs_<n>.csv` files.
    #[serde(default = "WorkloadSpec::default_dir")]
    pub dir: PathBuf,
}

impl WorkloadSpec {
    fn default_min_duration() -> u32 {
        1
    }

    fn default_max_duration() -> u32 {
        100
    }

    fn default_dir() -> PathBuf {
        PathBuf::from("input")
    }

    /// Validated duration range.
    pub fn duration_range(&self) -> Result<DurationRange, BenchError> {
        DurationRange::new(self.min_duration, self.max_duration).map_err(|err| {
            BenchError::Plan(
                err.info()
                    .clone()
                    .with_hint("check workload.min_duration and workload.max_duration"),
            )
        })
    }

    /// Path of the workload file for `size` jobs.
    pub fn path_for(&self, size: usize) -> PathBuf {
        self.dir.join(format!("jobs_{size}.csv"))
    }
}

impl Default for WorkloadSpec {
    fn default() -> Self {
        Self {
            sizes: vec![256_000, 128_000, 64_000, 32_000, 16_000],
            min_duration: Self::default_min_duration(),
            max_duration: Self::default_max_duration(),
            dir: Self::default_dir(),
        }
    }
}

/// Full configuration sweep over jobs × processors × cooling methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    /// Solver executable.
    #[serde(default = "SweepPlan::default_solver")]
    pub solver: PathBuf,
    /// Workload axis and generation parameters.
    #[serde(default)]
    pub workload: WorkloadSpec,
    /// Processor counts, in traversal order.
    pub processors: Vec<u32>,
    /// Cooling methods, in traversal order.
    #[serde(default = "SweepPlan::default_cooling_methods")]
    pub cooling_methods: Vec<CoolingMethod>,
    /// Trials per configuration.
    #[serde(default = "SweepPlan::default_repeats")]
    pub repeats: usize,
    /// Bound on each solver run, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
    /// Master seed for workload durations.
    #[serde(default)]
    pub seed: u64,
    /// Results table durability policy.
    #[serde(default)]
    pub flush: FlushPolicy,
    /// Results table path.
    #[serde(default = "SweepPlan::default_results")]
    pub results: PathBuf,
    /// Optional per-trial log path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<PathBuf>,
}

impl SweepPlan {
    fn default_solver() -> PathBuf {
        PathBuf::from("./main_solo.o")
    }

    fn default_cooling_methods() -> Vec<CoolingMethod> {
        CoolingMethod::ALL.to_vec()
    }

    const fn default_repeats() -> usize {
        5
    }

    fn default_results() -> PathBuf {
        PathBuf::from("results.csv")
    }

    /// Checks axis, repeat and timeout constraints.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.workload.sizes.is_empty() {
            return Err(plan_error("empty-axis", "workload.sizes must not be empty"));
        }
        if self.workload.sizes.contains(&0) {
            return Err(plan_error("invalid-job-count", "workload sizes must be positive"));
        }
        if self.processors.is_empty() {
            return Err(plan_error("empty-axis", "processors must not be empty"));
        }
        if self.cooling_methods.is_empty() {
            return Err(plan_error("empty-axis", "cooling_methods must not be empty"));
        }
        validate_repeats(self.repeats)?;
        validate_timeout(self.timeout_secs)?;
        self.workload.duration_range()?;
        Ok(())
    }

    /// Cross product of the three axes in nested declared order.
    pub fn configurations(&self) -> Vec<Configuration> {
        let mut configs = Vec::with_capacity(
            self.workload.sizes.len() * self.processors.len() * self.cooling_methods.len(),
        );
        for &num_jobs in &self.workload.sizes {
            for &num_processors in &self.processors {
                for &cooling_method in &self.cooling_methods {
                    configs.push(Configuration {
                        num_jobs,
                        num_processors,
                        cooling_method,
                    });
                }
            }
        }
        configs
    }

    /// Wait bound for each trial.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Canonical hash of the plan contents.
    pub fn plan_hash(&self) -> Result<String, BenchError> {
        stable_hash_string(self)
    }

    /// YAML rendering of the plan.
    pub fn to_yaml_string(&self) -> Result<String, BenchError> {
        to_yaml_string(self)
    }
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            solver: Self::default_solver(),
            workload: WorkloadSpec::default(),
            processors: vec![400, 160, 80, 40],
            cooling_methods: Self::default_cooling_methods(),
            repeats: Self::default_repeats(),
            timeout_secs: None,
            seed: 0,
            flush: FlushPolicy::AtEnd,
            results: Self::default_results(),
            trials: None,
        }
    }
}

/// Processor-only scan of the multi-processor solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorScan {
    /// Solver executable.
    pub solver: PathBuf,
    /// Processor counts, in traversal order.
    pub processors: Vec<u32>,
    /// Trials per processor count.
    pub repeats: usize,
    /// Bound on each solver run, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
    /// Results table durability policy.
    #[serde(default)]
    pub flush: FlushPolicy,
    /// Results table path.
    pub results: PathBuf,
    /// Optional per-trial log path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trials: Option<PathBuf>,
}

impl ProcessorScan {
    /// Checks axis, repeat and timeout constraints.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.processors.is_empty() {
            return Err(plan_error("empty-axis", "processors must not be empty"));
        }
        validate_repeats(self.repeats)?;
        validate_timeout(self.timeout_secs)
    }

    /// Wait bound for each trial.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Canonical hash of the scan contents.
    pub fn plan_hash(&self) -> Result<String, BenchError> {
        stable_hash_string(self)
    }
}

impl Default for ProcessorScan {
    fn default() -> Self {
        Self {
            solver: PathBuf::from("./main_mult.o"),
            processors: (2..15).step_by(2).collect(),
            repeats: 3,
            timeout_secs: None,
            flush: FlushPolicy::AtEnd,
            results: PathBuf::from("results_mult.csv"),
            trials: None,
        }
    }
}

fn validate_repeats(repeats: usize) -> Result<(), BenchError> {
    if repeats == 0 {
        return Err(plan_error("invalid-repeats", "repeats must be at least 1"));
    }
    Ok(())
}

fn validate_timeout(timeout_secs: Option<f64>) -> Result<(), BenchError> {
    let Some(secs) = timeout_secs else {
        return Ok(());
    };
    // Also rules out NaN and values too large for a Duration.
    if secs <= 0.0 || Duration::try_from_secs_f64(secs).is_err() {
        return Err(BenchError::Plan(
            ErrorInfo::new(
                "invalid-timeout",
                "timeout_secs must be a positive number of seconds that fits a Duration",
            )
            .with_context("timeout_secs", secs.to_string()),
        ));
    }
    Ok(())
}

/// Loads and validates a sweep plan from a YAML file.
pub fn load_plan(path: &Path) -> Result<SweepPlan, BenchError> {
    let bytes = fs::read(path).map_err(|err| {
        BenchError::Plan(
            ErrorInfo::new("plan-read", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    let plan: SweepPlan = serde_yaml::from_slice(&bytes).map_err(|err| {
        BenchError::Plan(
            ErrorInfo::new("plan-parse", err.to_string())
                .with_context("path", path.display().to_string()),
        )
    })?;
    plan.validate()?;
    Ok(plan)
}
