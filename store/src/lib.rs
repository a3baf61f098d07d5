//! SQLite persistence for the installed-package set.
//!
//! A single `installed_apps` table keyed by package id, with install and
//! last-seen timestamps. [`InstalledStore`] loads the set the reconciliation
//! session starts from and applies its sync plans back, tolerating id-level
//! write failures.

mod error;
mod installed;

pub use error::{Result, StoreError};
pub use installed::{ApplyReport, InstalledStore};
