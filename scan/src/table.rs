//! Tabular section detection in raw winget output.
//!
//! Winget prints a header line, a dash separator, data rows, and usually a
//! trailing summary line, all mixed with progress-spinner noise and source
//! agreement banners. This module finds the table and resolves column start
//! offsets from the header text when the console locale is English; on other
//! locales the offsets do not resolve and extraction falls back to
//! whitespace tokenization.

use crate::error::ScanError;

/// Column headers of `winget upgrade` output, in display order.
pub const UPGRADE_COLUMNS: &[&str] = &["Name", "Id", "Version", "Available", "Source"];

/// Column headers of `winget list` output, in display order. The Available
/// column only appears when some listed package has a pending upgrade;
/// resolution tolerates its absence.
pub const LIST_COLUMNS: &[&str] = &["Name", "Id", "Version", "Available", "Source"];

/// How header column names resolved against the known column set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnResolution {
    /// At least two column start offsets were located in the header.
    Resolved(TableLayout),
    /// Fewer than two names matched; the caller must tokenize by whitespace.
    Ambiguous,
}

/// Column start offsets resolved from a header line, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub col_starts: Vec<usize>,
}

impl TableLayout {
    /// Byte range of column `i` within a data line.
    pub fn column_range(&self, i: usize, line_len: usize) -> Option<(usize, usize)> {
        let start = *self.col_starts.get(i)?;
        if start >= line_len {
            return None;
        }
        let end = self
            .col_starts
            .get(i + 1)
            .copied()
            .unwrap_or(line_len)
            .min(line_len);
        Some((start, end))
    }
}

/// The located tabular section: resolved columns plus the raw data rows.
#[derive(Debug, Clone)]
pub struct TableSection {
    pub columns: ColumnResolution,
    /// Data rows between the separator and the summary line, with blank and
    /// spinner lines removed. Continuation rows are still present.
    pub rows: Vec<String>,
}

/// Returns `true` for lines made only of spinner glyphs and whitespace.
pub fn is_spinner_line(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| matches!(c, '-' | '\\' | '|' | '/') || c.is_whitespace())
}

/// Returns `true` for the trailing "N upgrades available." summary line.
pub fn is_summary_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    lower.contains("upgrade") && lower.contains("available")
}

fn is_separator_line(line: &str) -> bool {
    line.contains("----")
}

fn resolve_columns(header: &str, column_names: &[&str]) -> ColumnResolution {
    let mut col_starts: Vec<usize> = column_names
        .iter()
        .filter_map(|name| header.find(name))
        .collect();
    col_starts.sort_unstable();
    col_starts.dedup();

    if col_starts.len() < 2 {
        ColumnResolution::Ambiguous
    } else {
        ColumnResolution::Resolved(TableLayout { col_starts })
    }
}

/// Locates the tabular section of `text`.
///
/// The separator is the first line containing a run of four dashes; the
/// header is the line immediately above it. Rows are collected until the
/// summary line or end of input, skipping blanks and spinner noise.
///
/// # Errors
///
/// Returns [`ScanError::NoTable`] when no separator line exists.
///
/// # Examples
///
/// ```
/// use winget_recon_scan::table::{locate_table, ColumnResolution, UPGRADE_COLUMNS};
///
/// let text = "\
/// Name   Id          Version  Available  Source
/// ----------------------------------------------
/// 7-Zip  7zip.7zip   22.00    23.01      winget
/// 1 upgrades available.
/// ";
/// let section = locate_table(text, UPGRADE_COLUMNS).unwrap();
/// assert_eq!(section.rows.len(), 1);
/// assert!(matches!(section.columns, ColumnResolution::Resolved(_)));
/// ```
pub fn locate_table(text: &str, column_names: &[&str]) -> Result<TableSection, ScanError> {
    let lines: Vec<&str> = text.lines().collect();

    let separator_idx = lines
        .iter()
        .position(|line| is_separator_line(line))
        .ok_or(ScanError::NoTable)?;

    let columns = if separator_idx == 0 {
        ColumnResolution::Ambiguous
    } else {
        resolve_columns(lines[separator_idx - 1], column_names)
    };

    let mut rows = Vec::new();
    for line in &lines[separator_idx + 1..] {
        if is_summary_line(line) {
            break;
        }
        if line.trim().is_empty() || is_spinner_line(line) {
            continue;
        }
        rows.push(line.to_string());
    }

    Ok(TableSection { columns, rows })
}
