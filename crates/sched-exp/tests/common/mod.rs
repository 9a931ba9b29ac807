#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use sched_core::CoolingMethod;
use sched_exp::{FlushPolicy, SweepPlan, WorkloadSpec};

/// Writes an executable `/bin/sh` stub solver into `dir`.
pub fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write stub");
    let mut perms = fs::metadata(&path).expect("stub metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod stub");
    path
}

/// Small plan rooted in `dir` with every output under it.
pub fn small_plan(
    dir: &Path,
    solver: PathBuf,
    sizes: Vec<usize>,
    processors: Vec<u32>,
    cooling_methods: Vec<CoolingMethod>,
    repeats: usize,
) -> SweepPlan {
    SweepPlan {
        solver,
        workload: WorkloadSpec {
            sizes,
            min_duration: 1,
            max_duration: 100,
            dir: dir.join("input"),
        },
        processors,
        cooling_methods,
        repeats,
        timeout_secs: None,
        seed: 7,
        flush: FlushPolicy::AtEnd,
        results: dir.join("results.csv"),
        trials: Some(dir.join("trials.csv")),
    }
}

/// Reads a CSV file into header + rows.
pub fn read_table(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .expect("open table");
    let header = reader
        .headers()
        .expect("header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|record| {
            record
                .expect("record")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect();
    (header, rows)
}
