//! Configuration for winget-recon scans.
//!
//! Two YAML-backed tables: [`ScanConfig`] for timeouts and probe concurrency,
//! and [`LocaleKeywords`] for the localized keyword sets the scheduler parser
//! matches against.

pub mod config;
pub mod error;
pub mod locale;

pub use config::ScanConfig;
pub use error::{ConfigError, Result};
pub use locale::LocaleKeywords;
