use std::ffi::OsString;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use sched_core::Configuration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::marker::CostMarker;

const MIN_POLL: Duration = Duration::from_micros(100);
const MAX_POLL: Duration = Duration::from_millis(10);

/// Everything needed to launch the solver once.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverInvocation {
    /// Solver executable.
    pub program: PathBuf,
    /// Positional arguments.
    pub args: Vec<OsString>,
    /// Marker identifying the reported cost in stdout.
    pub marker: CostMarker,
    /// Upper bound on the wait for process exit.
    pub timeout: Option<Duration>,
}

impl SolverInvocation {
    /// `<program> <workload> <processors> <cooling method>`, parsed with the final-cost marker.
    pub fn for_configuration(
        program: impl Into<PathBuf>,
        workload: &Path,
        config: &Configuration,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            program: program.into(),
            args: vec![
                workload.as_os_str().to_os_string(),
                config.num_processors.to_string().into(),
                config.cooling_method.as_str().into(),
            ],
            marker: CostMarker::final_cost(),
            timeout,
        }
    }

    /// `<program> <processors>`, parsed with the current-best marker.
    pub fn for_processors(
        program: impl Into<PathBuf>,
        processors: u32,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            program: program.into(),
            args: vec![processors.to_string().into()],
            marker: CostMarker::current_best(),
            timeout,
        }
    }
}

/// Classification of a single trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrialStatus {
    /// The solver exited and reported a cost.
    Completed,
    /// The solver exited without a parsable cost line.
    Invalid,
    /// The wait bound expired and the solver was killed.
    TimedOut,
    /// The solver could not be launched.
    Unavailable,
    /// The sweep was cancelled while the solver was running.
    Cancelled,
}

impl TrialStatus {
    /// Stable lowercase label used in trial logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialStatus::Completed => "completed",
            TrialStatus::Invalid => "invalid",
            TrialStatus::TimedOut => "timed-out",
            TrialStatus::Unavailable => "unavailable",
            TrialStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TrialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one timed solver invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialResult {
    /// Wall-clock seconds from launch to observed exit (or kill).
    pub elapsed_secs: f64,
    /// Reported cost; absent unless the status is `completed`.
    pub cost: Option<f64>,
    /// Outcome classification.
    pub status: TrialStatus,
    /// Exit code when the process exited normally.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl TrialResult {
    /// Builds a result with no cost and no exit code.
    pub fn without_cost(status: TrialStatus, elapsed: Duration) -> Self {
        Self {
            elapsed_secs: elapsed.as_secs_f64(),
            cost: None,
            status,
            exit_code: None,
        }
    }

    /// True when the trial contributes a cost sample.
    pub fn is_valid(&self) -> bool {
        self.cost.is_some()
    }
}

/// Time allowed for the output readers to hit end-of-file once the solver is gone.
const READER_GRACE: Duration = Duration::from_secs(1);

enum WaitOutcome {
    Exited(ExitStatus, Duration),
    TimedOut(Duration),
    Cancelled(Duration),
    Failed(io::Error, Duration),
}

/// Launches the solver, waits for it and classifies the outcome.
///
/// Never fails: launch errors, missing cost lines, timeouts and cancellation
/// are all reported through [`TrialResult::status`]. On unix the solver runs
/// in its own process group, so anything it spawns is killed with it and a
/// terminal interrupt reaches the harness only.
pub fn run_trial(invocation: &SolverInvocation, cancel: &CancelToken) -> TrialResult {
    if cancel.is_cancelled() {
        return TrialResult::without_cost(TrialStatus::Cancelled, Duration::ZERO);
    }

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let start = Instant::now();
    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(err) => {
            let elapsed = start.elapsed();
            warn!(
                program = %invocation.program.display(),
                error = %err,
                "solver could not be launched"
            );
            return TrialResult::without_cost(TrialStatus::Unavailable, elapsed);
        }
    };

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    match wait_for_exit(&mut child, start, invocation.timeout, cancel) {
        WaitOutcome::Exited(status, elapsed) => {
            // Background descendants would otherwise keep the pipes open.
            kill_group(&child);
            let deadline = Instant::now() + READER_GRACE;
            let stdout = collect(stdout, deadline);
            let stderr = collect(stderr, deadline);
            classify_exit(
                invocation,
                status,
                elapsed,
                &stdout,
                &stderr,
                cancel.is_cancelled(),
            )
        }
        // Readers of killed solvers are left to finish on their own.
        WaitOutcome::TimedOut(elapsed) => {
            warn!(
                program = %invocation.program.display(),
                elapsed_secs = elapsed.as_secs_f64(),
                "solver timed out and was killed"
            );
            TrialResult::without_cost(TrialStatus::TimedOut, elapsed)
        }
        WaitOutcome::Cancelled(elapsed) => {
            warn!(program = %invocation.program.display(), "solver killed on cancellation");
            TrialResult::without_cost(TrialStatus::Cancelled, elapsed)
        }
        WaitOutcome::Failed(err, elapsed) => wait_failed(invocation, &err, elapsed),
    }
}

fn classify_exit(
    invocation: &SolverInvocation,
    status: ExitStatus,
    elapsed: Duration,
    stdout: &str,
    stderr: &str,
    cancelled: bool,
) -> TrialResult {
    debug!(
        exit_code = ?status.code(),
        elapsed_secs = elapsed.as_secs_f64(),
        "solver exited"
    );
    if !stderr.is_empty() {
        debug!(stderr = %stderr.trim_end(), "solver stderr");
    }
    // An interrupt may have ended the solver before the token was observed.
    if cancelled {
        warn!(program = %invocation.program.display(), "solver exited during cancellation");
        return TrialResult::without_cost(TrialStatus::Cancelled, elapsed);
    }
    let cost = invocation.marker.scan(stdout);
    if cost.is_none() {
        warn!(
            marker = %invocation.marker.text,
            output = %stdout,
            "cost marker not found in solver output"
        );
    }
    TrialResult {
        elapsed_secs: elapsed.as_secs_f64(),
        cost,
        status: if cost.is_some() {
            TrialStatus::Completed
        } else {
            TrialStatus::Invalid
        },
        exit_code: status.code(),
    }
}

/// The harness lost track of the process, so the solver is treated as unusable.
fn wait_failed(invocation: &SolverInvocation, err: &io::Error, elapsed: Duration) -> TrialResult {
    warn!(
        program = %invocation.program.display(),
        error = %err,
        "failed to wait for solver"
    );
    TrialResult::without_cost(TrialStatus::Unavailable, elapsed)
}

fn wait_for_exit(
    child: &mut Child,
    start: Instant,
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> WaitOutcome {
    let mut pause = MIN_POLL;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return WaitOutcome::Exited(status, start.elapsed()),
            Ok(None) => {}
            Err(err) => {
                terminate(child);
                return WaitOutcome::Failed(err, start.elapsed());
            }
        }
        let elapsed = start.elapsed();
        if cancel.is_cancelled() {
            terminate(child);
            return WaitOutcome::Cancelled(elapsed);
        }
        if timeout.is_some_and(|limit| elapsed >= limit) {
            terminate(child);
            return WaitOutcome::TimedOut(elapsed);
        }
        thread::sleep(pause);
        pause = (pause * 2).min(MAX_POLL);
    }
}

fn terminate(child: &mut Child) {
    kill_group(child);
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_group(child: &Child) {
    // The solver leads its own group, so its pid is the group id.
    unsafe {
        libc::killpg(child.id() as libc::pid_t, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_group(_child: &Child) {}

fn drain<R: Read + Send + 'static>(mut source: R) -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = source.read_to_end(&mut buf);
        let _ = sender.send(String::from_utf8_lossy(&buf).into_owned());
    });
    receiver
}

fn collect(receiver: Option<Receiver<String>>, deadline: Instant) -> String {
    receiver
        .and_then(|receiver| {
            receiver
                .recv_timeout(deadline.saturating_duration_since(Instant::now()))
                .ok()
        })
        .unwrap_or_default()
}
