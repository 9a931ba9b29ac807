use std::fs;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use sched_core::errors::{BenchError, ErrorInfo};
use sched_core::{Job, Workload};
use tracing::debug;

use crate::sampler::{DurationRange, DurationSampler};

/// Header row of every workload file.
pub const WORKLOAD_HEADER: [&str; 2] = ["Job ID", "Duration"];

fn write_error(path: &Path, err: impl ToString) -> BenchError {
    BenchError::Workload(
        ErrorInfo::new("workload-write", "failed to write workload file")
            .with_context("path", path.display().to_string())
            .with_hint(err.to_string()),
    )
}

fn read_error(path: &Path, code: &str, message: impl Into<String>) -> BenchError {
    BenchError::Workload(
        ErrorInfo::new(code, message).with_context("path", path.display().to_string()),
    )
}

/// Builds a workload of exactly `num_jobs` jobs named `Job_1..Job_n`.
pub fn generate_workload(
    num_jobs: usize,
    range: DurationRange,
    sampler: &mut dyn DurationSampler,
) -> Result<Workload, BenchError> {
    if num_jobs == 0 {
        return Err(BenchError::Workload(
            ErrorInfo::new("invalid-job-count", "a workload needs at least one job")
                .with_context("num_jobs", "0"),
        ));
    }
    let jobs = (1..=num_jobs)
        .map(|index| Job {
            id: Job::id_for(index),
            duration: sampler.sample(range),
        })
        .collect();
    Ok(Workload { jobs })
}

/// Writes `workload` to `path` as a two-column CSV, replacing any existing file.
pub fn write_workload(workload: &Workload, path: &Path) -> Result<(), BenchError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| write_error(path, err))?;
        }
    }
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|err| write_error(path, err))?;
    writer
        .write_record(WORKLOAD_HEADER)
        .map_err(|err| write_error(path, err))?;
    for job in &workload.jobs {
        writer
            .write_record([job.id.as_str(), job.duration.to_string().as_str()])
            .map_err(|err| write_error(path, err))?;
    }
    writer.flush().map_err(|err| write_error(path, err))?;
    debug!(path = %path.display(), jobs = workload.size(), "workload written");
    Ok(())
}

/// Generates a workload and persists it in one step.
pub fn generate_to_path(
    num_jobs: usize,
    range: DurationRange,
    sampler: &mut dyn DurationSampler,
    path: &Path,
) -> Result<Workload, BenchError> {
    let workload = generate_workload(num_jobs, range, sampler)?;
    write_workload(&workload, path)?;
    Ok(workload)
}

/// Reads a workload file back, validating the schema.
pub fn read_workload(path: &Path) -> Result<Workload, BenchError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|err| read_error(path, "workload-read", err.to_string()))?;
    let headers = reader
        .headers()
        .map_err(|err| read_error(path, "workload-read", err.to_string()))?;
    if headers.iter().ne(WORKLOAD_HEADER) {
        return Err(read_error(
            path,
            "workload-header",
            format!("unexpected header: {}", headers.iter().collect::<Vec<_>>().join(",")),
        ));
    }
    let mut jobs = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|err| read_error(path, "workload-record", err.to_string()))?;
        let (Some(id), Some(duration)) = (record.get(0), record.get(1)) else {
            return Err(read_error(
                path,
                "workload-record",
                format!("row {} has fewer than two fields", line + 1),
            ));
        };
        let duration = duration
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|value| *value > 0)
            .ok_or_else(|| {
                read_error(
                    path,
                    "workload-duration",
                    format!("row {} has invalid duration {duration:?}", line + 1),
                )
            })?;
        jobs.push(Job {
            id: id.to_string(),
            duration,
        });
    }
    Ok(Workload { jobs })
}
