use std::error::Error;
use std::path::Path;

use sched_exp::{CancelToken, SweepReport};

pub mod plan;
pub mod scan_procs;
pub mod sweep;
pub mod workload;

/// Writes the JSON report next to the results table and prints a summary line.
pub(crate) fn finish_report(report: &SweepReport) -> Result<(), Box<dyn Error>> {
    let path = SweepReport::default_path(&report.results);
    report.write_json(&path)?;
    if report.cancelled {
        println!(
            "Interrupted after {}/{} configurations. Partial results in {}",
            report.rows.len(),
            report.planned,
            report.results.display()
        );
    } else {
        println!(
            "Sweep completed. Results saved to {}",
            report.results.display()
        );
    }
    println!("Report: {}", path.display());
    Ok(())
}

pub(crate) fn ensure_parent(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Token tripped by SIGINT so an interrupted sweep still flushes its table.
pub(crate) fn interrupt_token() -> CancelToken {
    let token = CancelToken::new();
    #[cfg(unix)]
    signal::install(token.clone());
    token
}

#[cfg(unix)]
mod signal {
    use std::sync::OnceLock;

    use sched_exp::CancelToken;

    static TOKEN: OnceLock<CancelToken> = OnceLock::new();

    extern "C" fn on_interrupt(_: libc::c_int) {
        if let Some(token) = TOKEN.get() {
            token.cancel();
        }
    }

    pub(super) fn install(token: CancelToken) {
        if TOKEN.set(token).is_err() {
            return;
        }
        // The handler only performs an atomic store.
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_interrupt as *const () as usize;
            action.sa_flags = libc::SA_RESTART;
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(libc::SIGINT, &action, std::ptr::null_mut());
        }
    }
}
