//! Core types for winget output reconciliation.
//!
//! This crate defines the data model shared across the winget-recon workspace:
//! [`PackageRecord`] rows extracted from `winget` table output, the persisted
//! [`InstalledApp`] shape, the [`TaskScheduleInfo`] projection of scheduler
//! state, and the [`SyncPlan`] produced by the reconciliation engine.
//!
//! It also hosts the two leaf algorithms everything else builds on:
//!
//! - [`compare_versions`]: dotted-numeric version comparison (segment-wise
//!   integer comparison, not lexical, not semver).
//! - [`is_candidate_package_id`]: the vendor.product id shape filter used when
//!   scanning free-form listing text for candidate package ids.

pub mod ids;
pub mod types;
pub mod version;

pub use ids::{is_candidate_package_id, normalize_id};
pub use types::{InstalledApp, PackageRecord, ScanOutcome, SyncPlan, TaskScheduleInfo};
pub use version::compare_versions;
