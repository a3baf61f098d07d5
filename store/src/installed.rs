//! Persisted installed-package set.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, warn};
use winget_recon_core::{InstalledApp, SyncPlan};

use crate::error::Result;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now_stamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Outcome of applying a [`SyncPlan`] to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Ids whose writes failed; the rest of the batch still went through.
    pub failed: Vec<String>,
}

/// SQLite-backed store of packages this tool believes are installed.
///
/// One row per package id; timestamps are local-time strings in
/// `%Y-%m-%d %H:%M:%S` format.
///
/// # Examples
///
/// ```no_run
/// use winget_recon_store::InstalledStore;
///
/// let store = InstalledStore::open("installed.db").unwrap();
/// store.mark_installed("Git.Git", Some("2.43.0"), "winget").unwrap();
/// assert!(store.load_ids().unwrap().contains("Git.Git"));
/// ```
pub struct InstalledStore {
    conn: Connection,
}

impl InstalledStore {
    /// Opens (or creates) the store at `path` and ensures the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory store, used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS installed_apps (
                package_id        TEXT PRIMARY KEY,
                installed_date    TEXT NOT NULL,
                last_seen         TEXT NOT NULL,
                installed_version TEXT,
                source            TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// All package ids currently marked installed.
    pub fn load_ids(&self) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT package_id FROM installed_apps")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut ids = BTreeSet::new();
        for id in rows {
            ids.insert(id?);
        }
        Ok(ids)
    }

    /// Full record for one package id.
    pub fn get(&self, package_id: &str) -> Result<Option<InstalledApp>> {
        let mut stmt = self.conn.prepare(
            "SELECT package_id, installed_date, last_seen, installed_version, source
             FROM installed_apps WHERE package_id = ?1",
        )?;
        let app = stmt
            .query_row(params![package_id], |row| {
                Ok(InstalledApp {
                    package_id: row.get(0)?,
                    installed_date: row.get(1)?,
                    last_seen: row.get(2)?,
                    installed_version: row.get(3)?,
                    source: row.get(4)?,
                })
            })
            .optional()?;
        Ok(app)
    }

    /// Marks a package installed, preserving the original install date on
    /// re-marking.
    pub fn mark_installed(
        &self,
        package_id: &str,
        installed_version: Option<&str>,
        source: &str,
    ) -> Result<()> {
        let stamp = now_stamp();
        self.conn.execute(
            "INSERT INTO installed_apps
                 (package_id, installed_date, last_seen, installed_version, source)
             VALUES (?1, ?2, ?2, ?3, ?4)
             ON CONFLICT(package_id) DO UPDATE SET
                 last_seen = excluded.last_seen,
                 installed_version = COALESCE(excluded.installed_version, installed_version),
                 source = excluded.source",
            params![package_id, stamp, installed_version, source],
        )?;
        Ok(())
    }

    /// Removes a package from the installed set.
    pub fn remove(&self, package_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM installed_apps WHERE package_id = ?1",
            params![package_id],
        )?;
        Ok(())
    }

    /// Refreshes `last_seen` for a package that is still present.
    pub fn touch_last_seen(&self, package_id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE installed_apps SET last_seen = ?2 WHERE package_id = ?1",
            params![package_id, now_stamp()],
        )?;
        Ok(())
    }

    /// Applies a sync plan additively.
    ///
    /// Id-level write failures are logged and collected; they never abort
    /// the rest of the batch. Applying the same plan twice leaves the store
    /// in the same state.
    pub fn apply_plan(&self, plan: &SyncPlan, source: &str) -> ApplyReport {
        let mut report = ApplyReport::default();

        for id in &plan.to_add {
            match self.mark_installed(id, None, source) {
                Ok(()) => report.added.push(id.clone()),
                Err(e) => {
                    warn!(package_id = %id, error = %e, "failed to mark installed");
                    report.failed.push(id.clone());
                }
            }
        }
        for id in &plan.to_remove {
            match self.remove(id) {
                Ok(()) => report.removed.push(id.clone()),
                Err(e) => {
                    warn!(package_id = %id, error = %e, "failed to remove");
                    report.failed.push(id.clone());
                }
            }
        }

        debug!(
            added = report.added.len(),
            removed = report.removed.len(),
            failed = report.failed.len(),
            "sync plan applied"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_and_load() {
        let store = InstalledStore::open_in_memory().unwrap();
        store
            .mark_installed("Git.Git", Some("2.43.0"), "winget")
            .unwrap();
        store.mark_installed("7zip.7zip", None, "registry").unwrap();

        let ids = store.load_ids().unwrap();
        assert_eq!(
            ids,
            BTreeSet::from(["7zip.7zip".to_string(), "Git.Git".to_string()])
        );

        let app = store.get("Git.Git").unwrap().unwrap();
        assert_eq!(app.installed_version.as_deref(), Some("2.43.0"));
        assert_eq!(app.source, "winget");
        assert!(!app.installed_date.is_empty());
    }

    #[test]
    fn test_remark_preserves_install_date() {
        let store = InstalledStore::open_in_memory().unwrap();
        store.mark_installed("Git.Git", None, "winget").unwrap();
        let first = store.get("Git.Git").unwrap().unwrap();

        store
            .mark_installed("Git.Git", Some("2.44.0"), "winget")
            .unwrap();
        let second = store.get("Git.Git").unwrap().unwrap();
        assert_eq!(first.installed_date, second.installed_date);
        assert_eq!(second.installed_version.as_deref(), Some("2.44.0"));
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let store = InstalledStore::open_in_memory().unwrap();
        store.remove("Never.Existed").unwrap();
    }

    #[test]
    fn test_timestamp_format() {
        let stamp = now_stamp();
        assert_eq!(stamp.len(), 19);
        assert_eq!(&stamp[4..5], "-");
        assert_eq!(&stamp[13..14], ":");
    }
}
