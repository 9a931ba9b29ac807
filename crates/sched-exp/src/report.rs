use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use sched_core::errors::{BenchError, ErrorInfo};
use sched_core::{RunProvenance, SchemaVersion};
use serde::{Deserialize, Serialize};

use crate::aggregate::StatusCounts;
use crate::serde::to_canonical_json_bytes;
use crate::table::{ResultRow, TableSchema};

/// Machine readable summary of a finished (or cancelled) sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Schema version of this report.
    pub schema_version: SchemaVersion,
    /// Canonical hash of the plan that produced it.
    pub plan_hash: String,
    /// Provenance metadata.
    pub provenance: RunProvenance,
    /// Layout of the results table.
    pub schema: TableSchema,
    /// Results table location.
    pub results: PathBuf,
    /// Number of configurations in the plan.
    pub planned: usize,
    /// Rows in traversal order.
    pub rows: Vec<ResultRow>,
    /// Trial statuses summed over all rows.
    pub totals: StatusCounts,
    /// Whether the sweep stopped early on cancellation.
    pub cancelled: bool,
    /// Workload files generated during the run, keyed by job count.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub workloads: BTreeMap<usize, PathBuf>,
}

impl SweepReport {
    /// True when every planned configuration produced a row.
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.rows.len() == self.planned
    }

    /// Writes the report as canonical JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), BenchError> {
        let bytes = to_canonical_json_bytes(self)?;
        fs::write(path, bytes).map_err(|err| {
            BenchError::Table(
                ErrorInfo::new("report-write", err.to_string())
                    .with_context("path", path.display().to_string()),
            )
        })
    }

    /// Conventional report location next to a results table (`results.csv.report.json`).
    pub fn default_path(results: &Path) -> PathBuf {
        let mut name = results.as_os_str().to_os_string();
        name.push(".report.json");
        PathBuf::from(name)
    }
}

pub(crate) fn provenance(plan_hash: &str, solver: &Path, seed: u64) -> RunProvenance {
    let mut tool_versions = BTreeMap::new();
    tool_versions.insert(
        "sched-exp".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    RunProvenance {
        input_hash: plan_hash.to_string(),
        solver: solver.display().to_string(),
        seed,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        tool_versions,
    }
}
