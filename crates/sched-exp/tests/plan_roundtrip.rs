use std::fs;
use std::path::PathBuf;

use sched_core::CoolingMethod;
use sched_exp::{load_plan, FlushPolicy, ProcessorScan, SweepPlan};

#[test]
fn default_plan_matches_the_reference_sweep() {
    let plan = SweepPlan::default();
    assert_eq!(
        plan.workload.sizes,
        vec![256_000, 128_000, 64_000, 32_000, 16_000]
    );
    assert_eq!(plan.processors, vec![400, 160, 80, 40]);
    assert_eq!(plan.cooling_methods, CoolingMethod::ALL.to_vec());
    assert_eq!(plan.repeats, 5);
    assert_eq!(plan.configurations().len(), 5 * 4 * 3);
    plan.validate().expect("default plan is valid");

    let scan = ProcessorScan::default();
    assert_eq!(scan.processors, vec![2, 4, 6, 8, 10, 12, 14]);
    assert_eq!(scan.repeats, 3);
    assert_eq!(scan.results, PathBuf::from("results_mult.csv"));
}

#[test]
fn yaml_round_trip_preserves_the_plan() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("plan.yaml");
    let mut plan = SweepPlan::default();
    plan.timeout_secs = Some(30.0);
    plan.flush = FlushPolicy::PerRow;
    plan.trials = Some(PathBuf::from("trials.csv"));
    fs::write(&path, plan.to_yaml_string().expect("yaml")).expect("write plan");

    let loaded = load_plan(&path).expect("load");
    assert_eq!(loaded, plan);
    assert_eq!(loaded.plan_hash().unwrap(), plan.plan_hash().unwrap());
}

#[test]
fn partial_plan_fills_in_defaults() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("plan.yaml");
    fs::write(
        &path,
        "workload:\n  sizes: [10, 20]\n\
         processors: [2]\n\
         cooling_methods: [cauchy]\n\
         flush: per-row\n",
    )
    .expect("write plan");

    let plan = load_plan(&path).expect("load");
    assert_eq!(plan.workload.sizes, vec![10, 20]);
    assert_eq!(plan.workload.min_duration, 1);
    assert_eq!(plan.workload.max_duration, 100);
    assert_eq!(plan.workload.dir, PathBuf::from("input"));
    assert_eq!(plan.solver, PathBuf::from("./main_solo.o"));
    assert_eq!(plan.repeats, 5);
    assert_eq!(plan.flush, FlushPolicy::PerRow);
    assert_eq!(plan.results, PathBuf::from("results.csv"));
    assert_eq!(plan.workload.path_for(20), PathBuf::from("input/jobs_20.csv"));
}

#[test]
fn configurations_follow_nested_declared_order() {
    let mut plan = SweepPlan::default();
    plan.workload.sizes = vec![5, 3];
    plan.processors = vec![2, 1];
    plan.cooling_methods = vec![CoolingMethod::Logarithmic, CoolingMethod::Boltzmann];

    let order: Vec<String> = plan
        .configurations()
        .iter()
        .map(|config| {
            format!(
                "{}/{}/{}",
                config.num_jobs, config.num_processors, config.cooling_method
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            "5/2/logarithmic",
            "5/2/boltzmann",
            "5/1/logarithmic",
            "5/1/boltzmann",
            "3/2/logarithmic",
            "3/2/boltzmann",
            "3/1/logarithmic",
            "3/1/boltzmann",
        ]
    );
}

fn assert_rejected(mutate: impl Fn(&mut SweepPlan), code: &str) {
    let mut plan = SweepPlan::default();
    mutate(&mut plan);
    let err = plan.validate().unwrap_err();
    assert_eq!(err.info().code, code);
}

#[test]
fn invalid_plans_are_rejected_with_codes() {
    assert_rejected(|p| p.workload.sizes.clear(), "empty-axis");
    assert_rejected(|p| p.processors.clear(), "empty-axis");
    assert_rejected(|p| p.cooling_methods.clear(), "empty-axis");
    assert_rejected(|p| p.workload.sizes.push(0), "invalid-job-count");
    assert_rejected(|p| p.repeats = 0, "invalid-repeats");
    assert_rejected(|p| p.timeout_secs = Some(0.0), "invalid-timeout");
    assert_rejected(|p| p.timeout_secs = Some(f64::NAN), "invalid-timeout");
    assert_rejected(|p| p.timeout_secs = Some(f64::INFINITY), "invalid-timeout");
    assert_rejected(|p| p.timeout_secs = Some(1e30), "invalid-timeout");
    assert_rejected(|p| p.workload.min_duration = 0, "invalid-duration-range");
    assert_rejected(
        |p| {
            p.workload.min_duration = 50;
            p.workload.max_duration = 10;
        },
        "invalid-duration-range",
    );

    let mut scan = ProcessorScan::default();
    scan.processors.clear();
    assert_eq!(scan.validate().unwrap_err().info().code, "empty-axis");
}

#[test]
fn oversized_timeout_is_rejected_before_the_sweep_starts() {
    let mut plan = SweepPlan::default();
    plan.timeout_secs = Some(1e30);
    let err = plan.validate().unwrap_err();
    assert_eq!(err.info().code, "invalid-timeout");
    assert!(err.info().context.contains_key("timeout_secs"));
    assert_eq!(plan.timeout(), None);

    let mut scan = ProcessorScan::default();
    scan.timeout_secs = Some(1e30);
    assert_eq!(scan.validate().unwrap_err().info().code, "invalid-timeout");

    scan.timeout_secs = Some(2.5);
    scan.validate().expect("ordinary timeout");
    assert_eq!(scan.timeout(), Some(std::time::Duration::from_millis(2500)));
}

#[test]
fn unknown_cooling_method_fails_to_parse() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("plan.yaml");
    fs::write(
        &path,
        "workload:\n  sizes: [10]\nprocessors: [2]\ncooling_methods: [Boltzmann]\n",
    )
    .expect("write plan");
    let err = load_plan(&path).unwrap_err();
    assert_eq!(err.info().code, "plan-parse");
}

#[test]
fn missing_plan_file_reports_its_path() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("absent.yaml");
    let err = load_plan(&path).unwrap_err();
    assert_eq!(err.info().code, "plan-read");
    assert_eq!(
        err.info().context.get("path"),
        Some(&path.display().to_string())
    );
}

#[test]
fn plan_hash_tracks_content() {
    let plan = SweepPlan::default();
    let mut other = plan.clone();
    assert_eq!(plan.plan_hash().unwrap(), other.plan_hash().unwrap());
    other.seed = 99;
    assert_ne!(plan.plan_hash().unwrap(), other.plan_hash().unwrap());
}
