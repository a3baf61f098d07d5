//! Subprocess capture and per-package upgrade probing.
//!
//! All winget invocations run with piped output drained in background
//! threads and a bounded timeout, after which the child is killed. A launch
//! failure produces an empty capture rather than an error; the caller treats
//! that as "no data this cycle" and keeps its previous results.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, warn};
use wait_timeout::ChildExt;
use winget_recon_config::ScanConfig;
use winget_recon_core::PackageRecord;

use crate::extract::parse_upgrade_output;
use crate::reconcile::contains_not_applicable_banner;
use crate::Result;

/// Captured output of one subprocess run, stdout and stderr merged.
#[derive(Debug, Clone, Default)]
pub struct CaptureOutput {
    pub text: String,
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl CaptureOutput {
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Runs `program` with `args`, returning merged output within `timeout`.
///
/// On timeout the child is killed and whatever was drained so far is kept,
/// with `timed_out` set. On launch failure the capture is empty; the failure
/// is logged, not raised.
pub fn run_capture(program: &str, args: &[&str], timeout: Duration) -> CaptureOutput {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(program, error = %e, "failed to launch subprocess");
            return CaptureOutput::default();
        }
    };

    // Drain both pipes in background threads so the child never blocks on a
    // full pipe buffer before it exits.
    let stdout_thread = child.stdout.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });
    let stderr_thread = child.stderr.take().map(|mut pipe| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    });

    let (exit_code, timed_out) = match child.wait_timeout(timeout) {
        Ok(Some(status)) => (status.code(), false),
        Ok(None) => {
            debug!(program, timeout_secs = timeout.as_secs(), "subprocess timed out, killing");
            let _ = child.kill();
            let _ = child.wait();
            (None, true)
        }
        Err(e) => {
            warn!(program, error = %e, "failed to wait on subprocess");
            let _ = child.kill();
            let _ = child.wait();
            (None, false)
        }
    };

    let stdout = stdout_thread
        .and_then(|t| t.join().ok())
        .unwrap_or_default();
    let stderr = stderr_thread
        .and_then(|t| t.join().ok())
        .unwrap_or_default();

    let mut text = String::from_utf8_lossy(&stdout).into_owned();
    let stderr_text = String::from_utf8_lossy(&stderr);
    if !stderr_text.trim().is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(&stderr_text);
    }

    CaptureOutput {
        text,
        exit_code,
        timed_out,
    }
}

/// What a single-package probe established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// The probe confirmed a genuinely newer version for this id.
    Confirmed(PackageRecord),
    /// The listed upgrade does not apply to this system.
    NotApplicable,
    /// The probe produced nothing decisive.
    Unknown,
}

/// Classifies the output of a `winget upgrade --id <id>` probe.
pub fn classify_probe_output(text: &str, package_id: &str) -> ProbeVerdict {
    if contains_not_applicable_banner(text) {
        return ProbeVerdict::NotApplicable;
    }
    let report = parse_upgrade_output(text);
    for record in report.records {
        if record.id.eq_ignore_ascii_case(package_id) && record.is_upgradable() {
            return ProbeVerdict::Confirmed(record);
        }
    }
    ProbeVerdict::Unknown
}

/// Issues per-package probe commands. Abstracted so batch probing is
/// testable without a winget binary.
pub trait ProbeRunner: Sync {
    fn probe(&self, package_id: &str, timeout: Duration) -> CaptureOutput;
}

/// Live runner invoking `winget upgrade --id <id>`.
pub struct WingetProbeRunner;

impl ProbeRunner for WingetProbeRunner {
    fn probe(&self, package_id: &str, timeout: Duration) -> CaptureOutput {
        run_capture(
            "winget",
            &[
                "upgrade",
                "--id",
                package_id,
                "--accept-source-agreements",
                "--accept-package-agreements",
            ],
            timeout,
        )
    }
}

/// Probes one package, retrying once with the longer retry timeout when the
/// first capture comes back empty.
pub fn probe_package(
    runner: &dyn ProbeRunner,
    config: &ScanConfig,
    package_id: &str,
) -> ProbeVerdict {
    let mut capture = runner.probe(package_id, Duration::from_secs(config.probe_timeout_secs));
    if capture.is_empty() {
        debug!(package_id, "empty probe capture, retrying with longer timeout");
        capture = runner.probe(
            package_id,
            Duration::from_secs(config.probe_retry_timeout_secs),
        );
    }
    if capture.is_empty() {
        return ProbeVerdict::Unknown;
    }
    classify_probe_output(&capture.text, package_id)
}

/// Merged outcome of a probe batch.
#[derive(Debug, Default)]
pub struct ProbeResults {
    pub confirmed: Vec<PackageRecord>,
    pub not_applicable: BTreeSet<String>,
}

/// Probes a batch of candidate ids in parallel.
///
/// Worker count is hardware parallelism capped by the configured maximum.
/// Probes fail independently; an unknown verdict drops the id without
/// affecting the rest of the batch. Results merge under mutexes, batch
/// order is not preserved.
pub fn probe_candidates(
    runner: &(dyn ProbeRunner + Sync),
    config: &ScanConfig,
    candidates: &BTreeSet<String>,
) -> ProbeResults {
    use rayon::prelude::*;

    let confirmed = Mutex::new(Vec::new());
    let not_applicable = Mutex::new(BTreeSet::new());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_probe_jobs())
        .build()
        .expect("failed to build rayon thread pool");

    pool.install(|| {
        candidates.par_iter().for_each(|id| {
            match probe_package(runner, config, id) {
                ProbeVerdict::Confirmed(record) => {
                    confirmed.lock().expect("probe lock poisoned").push(record);
                }
                ProbeVerdict::NotApplicable => {
                    not_applicable
                        .lock()
                        .expect("probe lock poisoned")
                        .insert(id.clone());
                }
                ProbeVerdict::Unknown => {
                    debug!(package_id = %id, "probe inconclusive");
                }
            }
        });
    });

    let mut results = ProbeResults {
        confirmed: confirmed.into_inner().expect("probe lock poisoned"),
        not_applicable: not_applicable.into_inner().expect("probe lock poisoned"),
    };
    results.confirmed.sort_by(|a, b| a.id.cmp(&b.id));
    results
}

/// Returns the contents of the most recently modified `<prefix>*.txt`
/// capture file in `dir`, if any.
///
/// Fallback source when a live invocation produced nothing: a previous run
/// may have left a usable raw capture behind.
pub fn read_latest_capture(dir: &Path, prefix: &str) -> Result<Option<String>> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(prefix) || !name.ends_with(".txt") {
            continue;
        }
        let modified = entry.metadata()?.modified()?;
        if newest.as_ref().is_none_or(|(ts, _)| modified > *ts) {
            newest = Some((modified, entry.path()));
        }
    }

    match newest {
        Some((_, path)) => Ok(Some(std::fs::read_to_string(path)?)),
        None => Ok(None),
    }
}
