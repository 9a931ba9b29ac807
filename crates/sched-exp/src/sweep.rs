use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use sched_core::errors::BenchError;
use sched_core::{RngHandle, SchemaVersion};
use sched_load::{generate_to_path, DurationRange, DurationSampler, UniformSampler};
use tracing::{debug, info, warn};

use crate::aggregate::{Aggregate, StatusCounts};
use crate::cancel::CancelToken;
use crate::plan::{ProcessorScan, SweepPlan, WorkloadSpec};
use crate::report::{provenance, SweepReport};
use crate::table::{FlushPolicy, ResultRow, ResultsTable, RowKey, TableSchema, TrialLog};
use crate::trial::{run_trial, SolverInvocation, TrialResult, TrialStatus};

/// Size-keyed memo of generated workload files.
///
/// Each distinct job count is generated at most once per sweep and reused by
/// every processor/cooling combination of that size.
#[derive(Debug)]
pub struct WorkloadCache {
    spec: WorkloadSpec,
    range: DurationRange,
    paths: BTreeMap<usize, PathBuf>,
}

impl WorkloadCache {
    /// Creates an empty cache for the given workload axis.
    pub fn new(spec: &WorkloadSpec) -> Result<Self, BenchError> {
        Ok(Self {
            range: spec.duration_range()?,
            spec: spec.clone(),
            paths: BTreeMap::new(),
        })
    }

    /// Returns the workload file for `size`, generating it on first use.
    pub fn ensure(
        &mut self,
        size: usize,
        sampler: &mut dyn DurationSampler,
    ) -> Result<PathBuf, BenchError> {
        if let Some(path) = self.paths.get(&size) {
            return Ok(path.clone());
        }
        let path = self.spec.path_for(size);
        generate_to_path(size, self.range, sampler, &path).map_err(|err| {
            BenchError::Workload(
                err.info()
                    .clone()
                    .with_context("size", size.to_string())
                    .with_hint(format!("could not generate the workload for {size} jobs")),
            )
        })?;
        info!(size, path = %path.display(), "workload generated");
        self.paths.insert(size, path.clone());
        Ok(path)
    }

    /// Generated files keyed by job count.
    pub fn paths(&self) -> &BTreeMap<usize, PathBuf> {
        &self.paths
    }
}

struct Outcome {
    rows: Vec<ResultRow>,
    totals: StatusCounts,
    cancelled: bool,
}

struct Sink<'a> {
    schema: TableSchema,
    flush: FlushPolicy,
    results: &'a Path,
    trials: Option<&'a Path>,
}

/// Runs the configuration sweep described by `plan`.
///
/// Workload durations come from per-size substreams of `plan.seed`.
pub fn run_sweep(plan: &SweepPlan, cancel: &CancelToken) -> Result<SweepReport, BenchError> {
    sweep_impl(plan, None, cancel)
}

/// Runs the configuration sweep with an injected duration sampler.
pub fn run_sweep_with(
    plan: &SweepPlan,
    sampler: &mut dyn DurationSampler,
    cancel: &CancelToken,
) -> Result<SweepReport, BenchError> {
    sweep_impl(plan, Some(sampler), cancel)
}

fn sweep_impl(
    plan: &SweepPlan,
    mut sampler: Option<&mut dyn DurationSampler>,
    cancel: &CancelToken,
) -> Result<SweepReport, BenchError> {
    plan.validate()?;
    let plan_hash = plan.plan_hash()?;
    let configs = plan.configurations();
    let mut cache = WorkloadCache::new(&plan.workload)?;
    let timeout = plan.timeout();
    info!(
        configurations = configs.len(),
        repeats = plan.repeats,
        solver = %plan.solver.display(),
        "starting sweep"
    );

    let points = configs.iter().map(|config| -> Result<_, BenchError> {
        let workload = match sampler.as_deref_mut() {
            Some(sampler) => cache.ensure(config.num_jobs, sampler)?,
            None => {
                let mut seeded = UniformSampler::new(RngHandle::substream(
                    plan.seed,
                    config.num_jobs as u64,
                ));
                cache.ensure(config.num_jobs, &mut seeded)?
            }
        };
        let invocation =
            SolverInvocation::for_configuration(&plan.solver, &workload, config, timeout);
        Ok((RowKey::Configuration(*config), invocation))
    });
    let sink = Sink {
        schema: TableSchema::Configuration,
        flush: plan.flush,
        results: &plan.results,
        trials: plan.trials.as_deref(),
    };
    let outcome = execute(points, configs.len(), plan.repeats, &sink, cancel)?;
    log_outcome(&outcome, configs.len());

    Ok(SweepReport {
        schema_version: SchemaVersion::new(1, 0, 0),
        provenance: provenance(&plan_hash, &plan.solver, plan.seed),
        plan_hash,
        schema: TableSchema::Configuration,
        results: plan.results.clone(),
        planned: configs.len(),
        rows: outcome.rows,
        totals: outcome.totals,
        cancelled: outcome.cancelled,
        workloads: cache.paths().clone(),
    })
}

/// Runs the processor-only scan described by `scan`.
pub fn run_processor_scan(
    scan: &ProcessorScan,
    cancel: &CancelToken,
) -> Result<SweepReport, BenchError> {
    scan.validate()?;
    let plan_hash = scan.plan_hash()?;
    let timeout = scan.timeout();
    info!(
        points = scan.processors.len(),
        repeats = scan.repeats,
        solver = %scan.solver.display(),
        "starting processor scan"
    );
    let points = scan
        .processors
        .iter()
        .map(|&num_processors| -> Result<_, BenchError> {
            Ok((
                RowKey::Processors { num_processors },
                SolverInvocation::for_processors(&scan.solver, num_processors, timeout),
            ))
        });
    let sink = Sink {
        schema: TableSchema::ProcessorScan,
        flush: scan.flush,
        results: &scan.results,
        trials: scan.trials.as_deref(),
    };
    let outcome = execute(points, scan.processors.len(), scan.repeats, &sink, cancel)?;
    log_outcome(&outcome, scan.processors.len());

    Ok(SweepReport {
        schema_version: SchemaVersion::new(1, 0, 0),
        provenance: provenance(&plan_hash, &scan.solver, 0),
        plan_hash,
        schema: TableSchema::ProcessorScan,
        results: scan.results.clone(),
        planned: scan.processors.len(),
        rows: outcome.rows,
        totals: outcome.totals,
        cancelled: outcome.cancelled,
        workloads: BTreeMap::new(),
    })
}

fn log_outcome(outcome: &Outcome, planned: usize) {
    if outcome.cancelled {
        warn!(
            completed = outcome.rows.len(),
            planned, "sweep cancelled; completed rows were flushed"
        );
    } else {
        info!(rows = outcome.rows.len(), "sweep finished");
    }
}

/// Drives every point sequentially and always finishes the tables, so rows
/// computed before a fatal error or a cancellation are written out.
fn execute<I>(
    points: I,
    planned: usize,
    repeats: usize,
    sink: &Sink<'_>,
    cancel: &CancelToken,
) -> Result<Outcome, BenchError>
where
    I: Iterator<Item = Result<(RowKey, SolverInvocation), BenchError>>,
{
    let mut table = ResultsTable::create(sink.results, sink.schema, sink.flush)?;
    let mut log = sink
        .trials
        .map(|path| TrialLog::create(path, sink.schema))
        .transpose()?;
    let mut outcome = Outcome {
        rows: Vec::with_capacity(planned),
        totals: StatusCounts::default(),
        cancelled: false,
    };

    let driven = drive(
        points,
        planned,
        repeats,
        &mut table,
        log.as_mut(),
        &mut outcome,
        cancel,
    );
    let finished = table.finish();
    let log_finished = log.map(TrialLog::finish).transpose();
    driven?;
    finished?;
    log_finished?;
    Ok(outcome)
}

fn drive<I>(
    points: I,
    planned: usize,
    repeats: usize,
    table: &mut ResultsTable<BufWriter<File>>,
    mut log: Option<&mut TrialLog<BufWriter<File>>>,
    outcome: &mut Outcome,
    cancel: &CancelToken,
) -> Result<(), BenchError>
where
    I: Iterator<Item = Result<(RowKey, SolverInvocation), BenchError>>,
{
    for (idx, point) in points.enumerate() {
        if cancel.is_cancelled() {
            outcome.cancelled = true;
            return Ok(());
        }
        let (key, invocation) = point?;
        info!("[{}/{}] running {}", idx + 1, planned, describe(&key));

        let mut trials: Vec<TrialResult> = Vec::with_capacity(repeats);
        for index in 1..=repeats {
            let trial = run_trial(&invocation, cancel);
            debug!(
                trial = index,
                status = %trial.status,
                elapsed_secs = trial.elapsed_secs,
                cost = ?trial.cost,
                "trial finished"
            );
            if let Some(log) = log.as_deref_mut() {
                log.append(&key, index, &trial)?;
            }
            if trial.status == TrialStatus::Cancelled {
                outcome.cancelled = true;
                return Ok(());
            }
            trials.push(trial);
        }

        let aggregate = Aggregate::from_trials(&trials);
        match aggregate.mean_cost {
            Some(cost) => info!(
                "result: {}, average cost = {}, average time = {:.2} seconds",
                describe(&key),
                cost,
                aggregate.mean_elapsed_secs.unwrap_or_default()
            ),
            None => warn!(
                "no valid trials for {}; final cost left empty",
                describe(&key)
            ),
        }
        outcome.totals.merge(&aggregate.counts);
        let row = ResultRow { key, aggregate };
        table.append(&row)?;
        outcome.rows.push(row);
    }
    Ok(())
}

fn describe(key: &RowKey) -> String {
    match key {
        RowKey::Configuration(config) => config.to_string(),
        RowKey::Processors { num_processors } => format!("{num_processors} processors"),
    }
}
