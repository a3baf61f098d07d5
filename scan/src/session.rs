//! Scan session: state machine, command sourcing, and shared sets.
//!
//! A session owns the installed and not-applicable id sets behind one mutex
//! each. Mutations run as whole batches under the lock so a concurrent
//! reader never observes a half-applied sync.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::time::Duration;

use tracing::{debug, info, warn};
use winget_recon_config::ScanConfig;
use winget_recon_core::{ScanOutcome, SyncPlan};

use crate::extract::{
    extract_name_id_pairs, parse_list_output, parse_upgrade_output, scan_candidate_ids,
};
use crate::probe::{read_latest_capture, run_capture, CaptureOutput};
use crate::reconcile::{classify_upgrade_scan, plan_installed_sync, upgrade_candidates};
use crate::registry::InstalledGroundTruth;

/// Phases of one scan cycle, in order. No phase may be skipped; a timeout
/// during `Upgrading` still passes through `Reconciling` on the degraded
/// path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Listing,
    Upgrading,
    Reconciling,
    Done,
}

/// Produces the raw captures a scan consumes. Abstracted so full cycles run
/// in tests without a winget binary.
pub trait CommandSource {
    fn list(&self) -> CaptureOutput;
    fn upgrade(&self) -> CaptureOutput;
}

/// Live source invoking winget, with a capture-file fallback.
///
/// When a live invocation yields nothing, the most recent raw capture file
/// (`winget_raw_*.txt`) left in the configured capture directory is used
/// instead; a previous cycle's data beats no data.
pub struct WingetSource {
    config: ScanConfig,
}

impl WingetSource {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    fn with_fallback(&self, capture: CaptureOutput, prefix: &str) -> CaptureOutput {
        if !capture.is_empty() || capture.timed_out {
            return capture;
        }
        let Some(dir) = self.config.capture_dir.as_ref() else {
            return capture;
        };
        match read_latest_capture(dir, prefix) {
            Ok(Some(text)) => {
                info!(prefix, "live capture empty, using saved capture file");
                CaptureOutput {
                    text,
                    exit_code: None,
                    timed_out: false,
                }
            }
            Ok(None) => capture,
            Err(e) => {
                warn!(prefix, error = %e, "capture file fallback failed");
                capture
            }
        }
    }
}

impl CommandSource for WingetSource {
    fn list(&self) -> CaptureOutput {
        let capture = run_capture(
            "winget",
            &["list", "--accept-source-agreements"],
            Duration::from_secs(self.config.list_timeout_secs),
        );
        self.with_fallback(capture, "winget_raw_list")
    }

    fn upgrade(&self) -> CaptureOutput {
        let capture = run_capture(
            "winget",
            &[
                "upgrade",
                "--accept-source-agreements",
                "--accept-package-agreements",
            ],
            Duration::from_secs(self.config.upgrade_timeout_secs),
        );
        self.with_fallback(capture, "winget_raw_upgrade")
    }
}

/// Outcome of one full scan cycle.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    /// Ids whose listed upgrade does not apply to this system.
    pub not_applicable: BTreeSet<String>,
    /// Full catalog from the listing, id to display name.
    pub catalog: BTreeMap<String, String>,
    /// The upgrade capture timed out and only list-derived candidates exist.
    pub degraded: bool,
    pub warnings: Vec<String>,
}

/// One reconciliation session: scan state plus the shared id sets.
pub struct ScanSession {
    state: ScanState,
    installed: Mutex<BTreeSet<String>>,
    not_applicable: Mutex<BTreeSet<String>>,
}

impl ScanSession {
    /// Starts a session seeded with the persisted installed set.
    pub fn new(installed: BTreeSet<String>) -> Self {
        Self {
            state: ScanState::Idle,
            installed: Mutex::new(installed),
            not_applicable: Mutex::new(BTreeSet::new()),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Snapshot of the installed set.
    pub fn installed_ids(&self) -> BTreeSet<String> {
        self.installed.lock().expect("installed lock poisoned").clone()
    }

    /// Snapshot of the not-applicable set.
    pub fn not_applicable_ids(&self) -> BTreeSet<String> {
        self.not_applicable
            .lock()
            .expect("not-applicable lock poisoned")
            .clone()
    }

    /// Runs one full scan cycle through every state.
    ///
    /// An upgrade capture that times out degrades the cycle: all candidates
    /// from the listing become not-applicable and the outcome is up to date
    /// with `degraded` set. An empty capture without a timeout is a failed
    /// scan; previous results stay untouched and the caller must not read
    /// it as "nothing to upgrade".
    pub fn run_scan(&mut self, source: &dyn CommandSource) -> ScanReport {
        self.state = ScanState::Listing;
        let list_capture = source.list();
        let list_report = parse_list_output(&list_capture.text);
        let mut catalog: BTreeMap<String, String> = list_report
            .records
            .iter()
            .map(|record| (record.id.clone(), record.name.clone()))
            .collect();
        if catalog.is_empty() {
            catalog = extract_name_id_pairs(&list_capture.text);
            if !catalog.is_empty() {
                debug!(
                    count = catalog.len(),
                    "listing table unparsed, catalog built from name-id pairs"
                );
            }
        }
        let mut candidates = scan_candidate_ids(&list_capture.text);
        candidates.extend(upgrade_candidates(&catalog, &list_report.records));
        debug!(
            catalog = catalog.len(),
            candidates = candidates.len(),
            "listing parsed"
        );

        self.state = ScanState::Upgrading;
        let upgrade_capture = source.upgrade();

        let mut warnings = list_report.warnings;
        let report = if upgrade_capture.timed_out {
            warn!("upgrade capture timed out, degrading to list-derived candidates");
            self.state = ScanState::Reconciling;
            self.replace_not_applicable(candidates.clone());
            ScanReport {
                outcome: ScanOutcome::UpToDate,
                not_applicable: candidates,
                catalog,
                degraded: true,
                warnings,
            }
        } else if upgrade_capture.is_empty() {
            self.state = ScanState::Reconciling;
            warnings.push("upgrade capture was empty".to_string());
            ScanReport {
                outcome: ScanOutcome::ScanFailed,
                not_applicable: self.not_applicable_ids(),
                catalog,
                degraded: false,
                warnings,
            }
        } else {
            let upgrade_report = parse_upgrade_output(&upgrade_capture.text);
            warnings.extend(upgrade_report.warnings.iter().cloned());
            let scan = classify_upgrade_scan(
                &upgrade_report.records,
                upgrade_report.saw_not_applicable_banner,
                &candidates,
            );
            self.state = ScanState::Reconciling;
            self.replace_not_applicable(scan.not_applicable.clone());
            let outcome = if scan.upgradable.is_empty() {
                ScanOutcome::UpToDate
            } else {
                ScanOutcome::Records {
                    records: scan.upgradable,
                }
            };
            ScanReport {
                outcome,
                not_applicable: scan.not_applicable,
                catalog,
                degraded: false,
                warnings,
            }
        };

        self.state = ScanState::Done;
        report
    }

    /// Plans the sync of the session's installed set against ground truth.
    pub fn reconcile_installed(
        &self,
        catalog: &BTreeMap<String, String>,
        ground_truth: &dyn InstalledGroundTruth,
    ) -> SyncPlan {
        let marked = self.installed_ids();
        plan_installed_sync(catalog, &marked, ground_truth)
    }

    /// Applies a sync plan to the installed set as one batch under the lock.
    pub fn apply_sync(&self, plan: &SyncPlan) {
        let mut installed = self.installed.lock().expect("installed lock poisoned");
        for id in &plan.to_add {
            installed.insert(id.clone());
        }
        for id in &plan.to_remove {
            installed.remove(id);
        }
    }

    fn replace_not_applicable(&self, ids: BTreeSet<String>) {
        *self
            .not_applicable
            .lock()
            .expect("not-applicable lock poisoned") = ids;
    }
}
