use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::{Writer, WriterBuilder};
use sched_core::errors::{BenchError, ErrorInfo};
use sched_core::Configuration;
use serde::{Deserialize, Serialize};

use crate::aggregate::Aggregate;
use crate::trial::TrialResult;

/// Column layout of a results table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableSchema {
    /// One row per (jobs, processors, cooling method) configuration.
    Configuration,
    /// One row per processor count.
    ProcessorScan,
}

impl TableSchema {
    /// Column names in file order.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            TableSchema::Configuration => &[
                "num_jobs",
                "num_processors",
                "cooling_method",
                "final_cost",
                "execution_time",
            ],
            TableSchema::ProcessorScan => &["num_proc", "avg_exec_time", "avg_final_cost"],
        }
    }

    /// Key columns used to prefix per-trial log rows.
    fn key_columns(&self) -> &'static [&'static str] {
        match self {
            TableSchema::Configuration => &["num_jobs", "num_processors", "cooling_method"],
            TableSchema::ProcessorScan => &["num_proc"],
        }
    }

    /// Column names of the per-trial log.
    pub fn trial_columns(&self) -> Vec<&'static str> {
        let mut columns = self.key_columns().to_vec();
        columns.extend(["trial", "status", "elapsed", "cost"]);
        columns
    }
}

/// When buffered rows reach the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlushPolicy {
    /// Rows are held in memory and written when the table is finished.
    #[default]
    AtEnd,
    /// Every row is written and flushed as soon as it is appended.
    PerRow,
}

/// Identifies the configuration a row summarises.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RowKey {
    /// Full sweep configuration.
    Configuration(Configuration),
    /// Processor-only scan point.
    Processors {
        /// Processor count passed to the solver.
        num_processors: u32,
    },
}

impl RowKey {
    /// Schema this key belongs to.
    pub fn schema(&self) -> TableSchema {
        match self {
            RowKey::Configuration(_) => TableSchema::Configuration,
            RowKey::Processors { .. } => TableSchema::ProcessorScan,
        }
    }

    fn fields(&self) -> Vec<String> {
        match self {
            RowKey::Configuration(config) => vec![
                config.num_jobs.to_string(),
                config.num_processors.to_string(),
                config.cooling_method.to_string(),
            ],
            RowKey::Processors { num_processors } => vec![num_processors.to_string()],
        }
    }
}

/// One aggregated row of a results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Configuration the row describes.
    pub key: RowKey,
    /// Statistics over its trials.
    pub aggregate: Aggregate,
}

impl ResultRow {
    /// Renders the row in its schema's column order. Absent values are empty fields.
    pub fn record(&self) -> Vec<String> {
        let cost = render(self.aggregate.mean_cost);
        let elapsed = render(self.aggregate.mean_elapsed_secs);
        let mut fields = self.key.fields();
        match self.key.schema() {
            TableSchema::Configuration => fields.extend([cost, elapsed]),
            TableSchema::ProcessorScan => fields.extend([elapsed, cost]),
        }
        fields
    }
}

fn render(value: Option<f64>) -> String {
    value.map(|value| value.to_string()).unwrap_or_default()
}

fn table_error(code: &str, label: &str, err: impl ToString) -> BenchError {
    BenchError::Table(
        ErrorInfo::new(code, "results table I/O failure")
            .with_context("path", label)
            .with_hint(err.to_string()),
    )
}

fn create_file(path: &Path) -> Result<BufWriter<File>, BenchError> {
    let label = path.display().to_string();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| table_error("table-create", &label, err))?;
        }
    }
    let file = File::create(path).map_err(|err| table_error("table-create", &label, err))?;
    Ok(BufWriter::new(file))
}

/// CSV results table with a fixed schema.
pub struct ResultsTable<W: Write> {
    writer: Writer<W>,
    schema: TableSchema,
    policy: FlushPolicy,
    pending: Vec<Vec<String>>,
    rows: usize,
    label: String,
}

impl ResultsTable<BufWriter<File>> {
    /// Creates (or truncates) the table file and writes its header.
    pub fn create(
        path: &Path,
        schema: TableSchema,
        policy: FlushPolicy,
    ) -> Result<Self, BenchError> {
        let file = create_file(path)?;
        Self::from_writer(file, schema, policy, path.display().to_string())
    }
}

impl<W: Write> ResultsTable<W> {
    /// Wraps an arbitrary writer; `label` names it in error messages.
    pub fn from_writer(
        writer: W,
        schema: TableSchema,
        policy: FlushPolicy,
        label: impl Into<String>,
    ) -> Result<Self, BenchError> {
        let label = label.into();
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
        writer
            .write_record(schema.columns())
            .map_err(|err| table_error("table-header", &label, err))?;
        if policy == FlushPolicy::PerRow {
            writer
                .flush()
                .map_err(|err| table_error("table-flush", &label, err))?;
        }
        Ok(Self {
            writer,
            schema,
            policy,
            pending: Vec::new(),
            rows: 0,
            label,
        })
    }

    /// Schema of this table.
    pub fn schema(&self) -> TableSchema {
        self.schema
    }

    /// Number of rows appended so far.
    pub fn len(&self) -> usize {
        self.rows
    }

    /// True when no row has been appended.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Appends a row, writing it immediately under [`FlushPolicy::PerRow`].
    pub fn append(&mut self, row: &ResultRow) -> Result<(), BenchError> {
        if row.key.schema() != self.schema {
            return Err(BenchError::Table(
                ErrorInfo::new("table-schema", "row does not match the table schema")
                    .with_context("path", self.label.clone()),
            ));
        }
        let record = row.record();
        match self.policy {
            FlushPolicy::PerRow => {
                self.writer
                    .write_record(&record)
                    .map_err(|err| table_error("table-write", &self.label, err))?;
                self.writer
                    .flush()
                    .map_err(|err| table_error("table-flush", &self.label, err))?;
            }
            FlushPolicy::AtEnd => self.pending.push(record),
        }
        self.rows += 1;
        Ok(())
    }

    /// Writes buffered rows, flushes and returns the underlying writer.
    pub fn finish(mut self) -> Result<W, BenchError> {
        for record in std::mem::take(&mut self.pending) {
            self.writer
                .write_record(&record)
                .map_err(|err| table_error("table-write", &self.label, err))?;
        }
        let label = self.label;
        self.writer
            .into_inner()
            .map_err(|err| table_error("table-flush", &label, err))
    }
}

/// Per-trial CSV log, flushed after every trial.
pub struct TrialLog<W: Write> {
    writer: Writer<W>,
    label: String,
}

impl TrialLog<BufWriter<File>> {
    /// Creates (or truncates) the log file and writes its header.
    pub fn create(path: &Path, schema: TableSchema) -> Result<Self, BenchError> {
        let file = create_file(path)?;
        Self::from_writer(file, schema, path.display().to_string())
    }
}

impl<W: Write> TrialLog<W> {
    /// Wraps an arbitrary writer; `label` names it in error messages.
    pub fn from_writer(
        writer: W,
        schema: TableSchema,
        label: impl Into<String>,
    ) -> Result<Self, BenchError> {
        let label = label.into();
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(writer);
        writer
            .write_record(schema.trial_columns())
            .map_err(|err| table_error("trial-log-header", &label, err))?;
        Ok(Self { writer, label })
    }

    /// Records one trial; `index` is 1-based within its configuration.
    pub fn append(
        &mut self,
        key: &RowKey,
        index: usize,
        trial: &TrialResult,
    ) -> Result<(), BenchError> {
        let mut record = key.fields();
        record.push(index.to_string());
        record.push(trial.status.to_string());
        record.push(trial.elapsed_secs.to_string());
        record.push(render(trial.cost));
        self.writer
            .write_record(&record)
            .map_err(|err| table_error("trial-log-write", &self.label, err))?;
        self.writer
            .flush()
            .map_err(|err| table_error("trial-log-flush", &self.label, err))
    }

    /// Flushes and returns the underlying writer.
    pub fn finish(self) -> Result<W, BenchError> {
        let label = self.label;
        self.writer
            .into_inner()
            .map_err(|err| table_error("trial-log-flush", &label, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::StatusCounts;
    use sched_core::CoolingMethod;

    fn row(cost: Option<f64>, elapsed: Option<f64>) -> ResultRow {
        ResultRow {
            key: RowKey::Configuration(Configuration {
                num_jobs: 10,
                num_processors: 2,
                cooling_method: CoolingMethod::Cauchy,
            }),
            aggregate: Aggregate {
                mean_cost: cost,
                mean_elapsed_secs: elapsed,
                counts: StatusCounts::default(),
            },
        }
    }

    fn finish_to_string(table: ResultsTable<Vec<u8>>) -> String {
        String::from_utf8(table.finish().expect("finish")).expect("utf8")
    }

    #[test]
    fn absent_cost_renders_as_empty_field() {
        let mut table = ResultsTable::from_writer(
            Vec::new(),
            TableSchema::Configuration,
            FlushPolicy::AtEnd,
            "mem",
        )
        .expect("table");
        table.append(&row(Some(100.0), Some(0.5))).expect("append");
        table.append(&row(None, Some(0.25))).expect("append");
        assert_eq!(table.len(), 2);
        assert_eq!(
            finish_to_string(table),
            "num_jobs,num_processors,cooling_method,final_cost,execution_time\n\
             10,2,cauchy,100,0.5\n\
             10,2,cauchy,,0.25\n"
        );
    }

    #[test]
    fn processor_scan_orders_time_before_cost() {
        let mut table = ResultsTable::from_writer(
            Vec::new(),
            TableSchema::ProcessorScan,
            FlushPolicy::PerRow,
            "mem",
        )
        .expect("table");
        let scan_row = ResultRow {
            key: RowKey::Processors { num_processors: 4 },
            aggregate: Aggregate {
                mean_cost: Some(12.0),
                mean_elapsed_secs: Some(1.5),
                counts: StatusCounts::default(),
            },
        };
        table.append(&scan_row).expect("append");
        assert_eq!(
            finish_to_string(table),
            "num_proc,avg_exec_time,avg_final_cost\n4,1.5,12\n"
        );
    }

    #[test]
    fn mismatched_schema_is_rejected() {
        let mut table = ResultsTable::from_writer(
            Vec::new(),
            TableSchema::ProcessorScan,
            FlushPolicy::AtEnd,
            "mem",
        )
        .expect("table");
        let err = table.append(&row(None, None)).unwrap_err();
        assert_eq!(err.info().code, "table-schema");
        assert!(table.is_empty());
    }
}
