//! Shared data model for the winget-recon workspace.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::version::compare_versions;

/// One row of a winget upgrade or list table.
///
/// `installed_version` and `available_version` are optional because the
/// heuristic recovery paths can confirm a package id without recovering
/// version columns, and `winget list` rows have no `Available` column at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_version: Option<String>,
}

impl PackageRecord {
    /// Returns `true` when both versions are present and the available one is
    /// strictly newer than the installed one.
    pub fn is_upgradable(&self) -> bool {
        match (&self.installed_version, &self.available_version) {
            (Some(installed), Some(available)) => {
                compare_versions(installed, available) == Ordering::Less
            }
            _ => false,
        }
    }
}

/// Persisted record of a package this tool has seen installed.
///
/// Timestamps are stored as `%Y-%m-%d %H:%M:%S` local-time strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    pub package_id: String,
    pub installed_date: String,
    pub last_seen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
    pub source: String,
}

/// What a scheduler query learned about the maintenance task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskScheduleInfo {
    pub exists: bool,
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_run: Option<String>,
    pub raw_info: String,
}

/// Outcome of a full upgrade scan.
///
/// `ScanFailed` is distinct from `UpToDate`: an empty capture that did not
/// time out means the command produced nothing usable, and callers must not
/// treat that as "no upgrades pending".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanOutcome {
    UpToDate,
    ScanFailed,
    Records { records: Vec<PackageRecord> },
}

impl ScanOutcome {
    pub fn records(&self) -> &[PackageRecord] {
        match self {
            ScanOutcome::Records { records } => records,
            _ => &[],
        }
    }
}

/// Additive reconciliation plan between a scan and the persisted catalog.
///
/// Sets are ordered so plans serialize deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub to_add: BTreeSet<String>,
    pub to_remove: BTreeSet<String>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
