//! Winget output parsing and update reconciliation.
//!
//! The pipeline turns the free-form, column-aligned text of `winget list`,
//! `winget upgrade`, and `schtasks /Query` into structured records and
//! decisions:
//!
//! - [`table`] locates the tabular section and resolves column offsets.
//! - [`strategies`] extract records per row, with ordered fallbacks for
//!   localized headers and misaligned rows.
//! - [`extract`] runs the strategies over whole captures.
//! - [`reconcile`] classifies upgrades, suppresses not-applicable false
//!   positives, and plans installed-set syncs.
//! - [`probe`] runs bounded winget subprocesses, in parallel for candidate
//!   batches.
//! - [`session`] drives one scan cycle through its state machine.
//! - [`schedule`] parses localized scheduler queries.
//!
//! Parsing is deliberately forgiving: malformed input produces fewer
//! records, never an error, and the session layer decides what an empty
//! result means.

pub mod error;
pub mod extract;
pub mod probe;
pub mod reconcile;
pub mod registry;
pub mod schedule;
pub mod session;
pub mod strategies;
pub mod table;

pub use error::{Result, ScanError};
pub use extract::{
    extract_name_id_pairs, parse_list_output, parse_upgrade_output, scan_candidate_ids,
    ParseReport,
};
pub use probe::{
    classify_probe_output, probe_candidates, probe_package, read_latest_capture, run_capture,
    CaptureOutput, ProbeResults, ProbeRunner, ProbeVerdict, WingetProbeRunner,
};
pub use reconcile::{
    classify_upgrade_scan, contains_not_applicable_banner, plan_installed_sync,
    upgrade_candidates, UpgradeScan, NOT_APPLICABLE_BANNER, NO_APPLICABLE_UPGRADE,
};
pub use registry::{InstalledGroundTruth, InstalledProgram, InstalledPrograms};
pub use schedule::{parse_task_query, task_query_args};
pub use session::{CommandSource, ScanReport, ScanSession, ScanState, WingetSource};
