//! Sweep orchestration for benchmarking an external scheduling solver.
//!
//! A sweep enumerates the configuration space, runs the solver a fixed number
//! of times per configuration, scans its stdout for a cost marker, reduces the
//! trials to an [`Aggregate`] and appends one row per configuration to a CSV
//! results table.

mod aggregate;
mod cancel;
mod hash;
mod marker;
mod plan;
mod report;
mod serde;
mod sweep;
mod table;
mod trial;

pub use aggregate::{Aggregate, StatusCounts};
pub use cancel::CancelToken;
pub use hash::stable_hash_string;
pub use marker::{CostKind, CostMarker};
pub use plan::{load_plan, ProcessorScan, SweepPlan, WorkloadSpec};
pub use report::SweepReport;
pub use sweep::{run_processor_scan, run_sweep, run_sweep_with, WorkloadCache};
pub use table::{FlushPolicy, ResultRow, ResultsTable, RowKey, TableSchema, TrialLog};
pub use trial::{run_trial, SolverInvocation, TrialResult, TrialStatus};

pub use crate::serde::{from_json_slice, to_canonical_json_bytes, to_yaml_string};
