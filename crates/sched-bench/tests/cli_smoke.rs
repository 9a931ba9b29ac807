use std::fs;
use std::process::Command;

fn sched_bench() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sched-bench"))
}

#[test]
fn workload_command_writes_the_requested_file() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let out = dir.path().join("jobs_25.csv");
    let status = sched_bench()
        .args(["workload", "--jobs", "25", "--min-duration", "3", "--max-duration", "9"])
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run sched-bench workload");
    assert!(status.success(), "workload command failed");

    let mut reader = csv::Reader::from_path(&out).expect("open workload");
    assert_eq!(
        reader.headers().expect("header").iter().collect::<Vec<_>>(),
        vec!["Job ID", "Duration"]
    );
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.expect("row")).collect();
    assert_eq!(rows.len(), 25);
    assert_eq!(&rows[24][0], "Job_25");
    for row in &rows {
        let duration: u32 = row[1].parse().expect("duration");
        assert!((3..=9).contains(&duration));
    }
}

#[test]
fn workload_command_defaults_to_jobs_csv() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let status = sched_bench()
        .args(["workload", "--jobs", "4"])
        .current_dir(dir.path())
        .status()
        .expect("run sched-bench workload");
    assert!(status.success(), "workload command failed");
    let text = fs::read_to_string(dir.path().join("jobs.csv")).expect("jobs.csv");
    assert_eq!(text.lines().count(), 5);
    assert!(text.starts_with("Job ID,Duration\n"));
}

#[test]
fn workload_command_rejects_an_inverted_range() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let status = sched_bench()
        .args(["workload", "--jobs", "5", "--min-duration", "9", "--max-duration", "3"])
        .arg("--out")
        .arg(dir.path().join("jobs.csv"))
        .status()
        .expect("run sched-bench workload");
    assert!(!status.success());
}

#[test]
fn plan_command_emits_a_loadable_default_plan() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let out = dir.path().join("plans/default.yaml");
    let status = sched_bench()
        .arg("plan")
        .arg("--out")
        .arg(&out)
        .status()
        .expect("run sched-bench plan");
    assert!(status.success(), "plan command failed");
    let text = fs::read_to_string(&out).expect("plan file");
    assert!(text.contains("main_solo.o"));
    assert!(text.contains("boltzmann"));
}

#[cfg(unix)]
#[test]
fn sweep_command_runs_a_plan_with_overrides() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tmp dir");
    let solver = dir.path().join("solver.sh");
    fs::write(
        &solver,
        "#!/bin/sh\necho \"Best solution found with cost: 100\"\n",
    )
    .expect("stub");
    fs::set_permissions(&solver, fs::Permissions::from_mode(0o755)).expect("chmod");

    let plan = dir.path().join("plan.yaml");
    fs::write(
        &plan,
        format!(
            "workload:\n  sizes: [10]\n  dir: {}\nprocessors: [2]\ncooling_methods: [boltzmann]\n",
            dir.path().join("input").display()
        ),
    )
    .expect("plan");
    let results = dir.path().join("results.csv");

    let output = sched_bench()
        .arg("sweep")
        .arg("--plan")
        .arg(&plan)
        .arg("--solver")
        .arg(&solver)
        .arg("--results")
        .arg(&results)
        .args(["--repeats", "2", "--flush", "per-row"])
        .output()
        .expect("run sched-bench sweep");
    assert!(output.status.success(), "sweep command failed");
    assert!(String::from_utf8_lossy(&output.stdout).contains("Sweep completed"));

    let table = fs::read_to_string(&results).expect("results");
    let mut lines = table.lines();
    assert_eq!(
        lines.next(),
        Some("num_jobs,num_processors,cooling_method,final_cost,execution_time")
    );
    let row = lines.next().expect("one row");
    assert!(row.starts_with("10,2,boltzmann,100,"), "unexpected row {row}");
    assert!(lines.next().is_none());

    let mut report = results.clone().into_os_string();
    report.push(".report.json");
    assert!(std::path::Path::new(&report).exists());
}
