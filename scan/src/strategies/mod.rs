//! Pluggable row-extraction strategies for winget table rows.
//!
//! Each strategy handles a different failure mode of the column-aligned
//! output: [`column_slice`] slices rows at resolved header offsets,
//! [`token_scan`] recovers rows when header names did not resolve (localized
//! consoles), and [`repair`] runs a final pass over every line to pick up
//! records both of the others lost to column misalignment.

pub mod column_slice;
pub mod repair;
pub mod token_scan;

use std::sync::LazyLock;

use regex::Regex;
use winget_recon_core::PackageRecord;

use crate::table::TableLayout;

/// Strict dotted-numeric version shape. Deliberately excludes pre-release
/// suffixes so that display-name words never pass as versions.
pub(crate) static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+(\.[0-9]+)*$").expect("static regex must compile"));

pub(crate) fn is_version_token(token: &str) -> bool {
    VERSION_PATTERN.is_match(token)
}

/// Which strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    ColumnSlice,
    TokenScan,
    HeuristicRepair,
}

/// Pluggable strategy for extracting a [`PackageRecord`] from one data row.
///
/// Strategies run in a fixed priority order and never guess: a line that
/// does not carry enough evidence yields `None` rather than a partial record.
pub trait RowStrategy {
    fn kind(&self) -> StrategyKind;
    fn extract(&self, line: &str, layout: Option<&TableLayout>) -> Option<PackageRecord>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_token_shape() {
        for ok in ["1", "22.00", "1.2.3.4", "2024.1.1"] {
            assert!(is_version_token(ok), "{ok}");
        }
        for bad in ["v1.2", "1.2-beta", "winget", "", "1.", ".1"] {
            assert!(!is_version_token(bad), "{bad}");
        }
    }
}
