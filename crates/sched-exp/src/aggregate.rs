use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::trial::{TrialResult, TrialStatus};

/// Number of trials per status.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusCounts(BTreeMap<TrialStatus, usize>);

impl StatusCounts {
    /// Records one more trial with `status`.
    pub fn record(&mut self, status: TrialStatus) {
        *self.0.entry(status).or_default() += 1;
    }

    /// Adds every count from `other`.
    pub fn merge(&mut self, other: &StatusCounts) {
        for (status, count) in &other.0 {
            *self.0.entry(*status).or_default() += count;
        }
    }

    /// Count for a single status.
    pub fn get(&self, status: TrialStatus) -> usize {
        self.0.get(&status).copied().unwrap_or(0)
    }

    /// Total number of trials recorded.
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

/// Summary statistics over the repeated trials of one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    /// Mean cost over trials that reported one; absent when none did.
    pub mean_cost: Option<f64>,
    /// Mean elapsed seconds over every attempt; absent only without attempts.
    pub mean_elapsed_secs: Option<f64>,
    /// Trials per status.
    pub counts: StatusCounts,
}

impl Aggregate {
    /// Reduces a set of trial results. Empty inputs yield absent statistics.
    pub fn from_trials(trials: &[TrialResult]) -> Self {
        let mut counts = StatusCounts::default();
        for trial in trials {
            counts.record(trial.status);
        }
        let costs: Vec<f64> = trials.iter().filter_map(|trial| trial.cost).collect();
        let elapsed: Vec<f64> = trials.iter().map(|trial| trial.elapsed_secs).collect();
        Self {
            mean_cost: mean(&costs),
            mean_elapsed_secs: mean(&elapsed),
            counts,
        }
    }

    /// Number of trials that contributed a cost sample.
    pub fn valid_trials(&self) -> usize {
        self.counts.get(TrialStatus::Completed)
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
