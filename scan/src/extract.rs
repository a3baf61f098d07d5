//! Record extraction pipelines over raw winget captures.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};
use winget_recon_core::{compare_versions, is_candidate_package_id, normalize_id, PackageRecord};

use crate::reconcile::contains_not_applicable_banner;
use crate::strategies::column_slice::ColumnSlice;
use crate::strategies::repair::recover_records;
use crate::strategies::token_scan::TokenScan;
use crate::strategies::{is_version_token, RowStrategy, StrategyKind};
use crate::table::{locate_table, ColumnResolution, TableLayout, LIST_COLUMNS, UPGRADE_COLUMNS};
use crate::ScanError;

/// Result of one extraction run.
#[derive(Debug, Clone)]
pub struct ParseReport {
    pub records: Vec<PackageRecord>,
    /// Primary strategy used for the table rows.
    pub strategy: StrategyKind,
    pub warnings: Vec<String>,
    /// The capture carried the "does not apply to your system" banner.
    pub saw_not_applicable_banner: bool,
}

/// Parses `winget upgrade` output into records.
///
/// Rows go through column slicing when the header resolved, with a per-row
/// token-scan fallback; a row shorter than the id column start continues the
/// previous row's wrapped name. A final recovery pass over the whole capture
/// picks up rows both strategies lost to misalignment. Duplicate ids keep
/// their first record.
///
/// A capture without any tabular section yields zero records, never an
/// error; the caller decides what an empty result means.
pub fn parse_upgrade_output(text: &str) -> ParseReport {
    let mut report = ParseReport {
        records: Vec::new(),
        strategy: StrategyKind::ColumnSlice,
        warnings: Vec::new(),
        saw_not_applicable_banner: contains_not_applicable_banner(text),
    };
    let mut seen: BTreeSet<String> = BTreeSet::new();

    match locate_table(text, UPGRADE_COLUMNS) {
        Ok(section) => {
            let layout = match section.columns {
                ColumnResolution::Resolved(layout) => Some(layout),
                ColumnResolution::Ambiguous => {
                    debug!("header columns unresolved, tokenizing rows by whitespace");
                    report.strategy = StrategyKind::TokenScan;
                    None
                }
            };
            let slice = ColumnSlice {
                has_available: true,
            };

            for row in &section.rows {
                if let Some(layout) = layout.as_ref() {
                    if is_continuation_row(row, layout) {
                        if let Some(prev) = report.records.last_mut() {
                            prev.name.push(' ');
                            prev.name.push_str(row.trim());
                        }
                        continue;
                    }
                }

                let record = match layout.as_ref() {
                    Some(layout) => slice
                        .extract(row, Some(layout))
                        .or_else(|| TokenScan.extract(row, None)),
                    None => TokenScan.extract(row, None),
                };
                match record {
                    Some(record) => {
                        if seen.insert(record.id.clone()) {
                            report.records.push(record);
                        }
                    }
                    None => {
                        warn!(row = %row, "row yielded no record");
                        report.warnings.push(format!("unparsed row: {row}"));
                    }
                }
            }
        }
        Err(ScanError::NoTable) => {
            report
                .warnings
                .push("no table found in upgrade output".to_string());
        }
        Err(other) => {
            report.warnings.push(other.to_string());
        }
    }

    let recovered = recover_records(text, &mut seen);
    if !recovered.is_empty() {
        debug!(count = recovered.len(), "recovery pass found extra records");
        report.records.extend(recovered);
    }
    report
}

/// Parses `winget list` output into records.
///
/// The listing grows an Available column when any listed package has a
/// pending upgrade; with all five columns resolved the fourth is read as the
/// available version, otherwise it is the source and stays out of the
/// record. On an unresolved header, falls back to per-row candidate-id
/// scanning: the first token with the vendor.product shape is the id, tokens
/// before it are the name, and the following token is kept as the installed
/// version when it is version-shaped.
pub fn parse_list_output(text: &str) -> ParseReport {
    let mut report = ParseReport {
        records: Vec::new(),
        strategy: StrategyKind::ColumnSlice,
        warnings: Vec::new(),
        saw_not_applicable_banner: contains_not_applicable_banner(text),
    };
    let mut seen: BTreeSet<String> = BTreeSet::new();

    let section = match locate_table(text, LIST_COLUMNS) {
        Ok(section) => section,
        Err(err) => {
            report.warnings.push(err.to_string());
            return report;
        }
    };

    let layout = match section.columns {
        ColumnResolution::Resolved(layout) => Some(layout),
        ColumnResolution::Ambiguous => {
            report.strategy = StrategyKind::TokenScan;
            None
        }
    };
    let slice = ColumnSlice {
        has_available: layout
            .as_ref()
            .is_some_and(|layout| layout.col_starts.len() >= 5),
    };

    for row in &section.rows {
        if let Some(layout) = layout.as_ref() {
            if is_continuation_row(row, layout) {
                if let Some(prev) = report.records.last_mut() {
                    prev.name.push(' ');
                    prev.name.push_str(row.trim());
                }
                continue;
            }
        }

        let record = match layout.as_ref() {
            Some(layout) => slice.extract(row, Some(layout)),
            None => extract_list_row_tokens(row),
        };
        if let Some(record) = record {
            if seen.insert(record.id.clone()) {
                report.records.push(record);
            }
        }
    }
    report
}

/// A data row shorter than the id column start is a wrapped name fragment.
fn is_continuation_row(row: &str, layout: &TableLayout) -> bool {
    layout
        .col_starts
        .get(1)
        .is_some_and(|id_start| row.trim_end().len() < *id_start)
}

fn extract_list_row_tokens(row: &str) -> Option<PackageRecord> {
    let tokens: Vec<&str> = row.split_whitespace().collect();
    let idx = tokens.iter().position(|t| is_candidate_package_id(t))?;

    let id = normalize_id(tokens[idx]);
    let name = if idx == 0 {
        id.clone()
    } else {
        tokens[..idx].join(" ")
    };
    let installed_version = tokens
        .get(idx + 1)
        .filter(|t| is_version_token(t))
        .map(|t| t.to_string());

    Some(PackageRecord {
        id,
        name,
        installed_version,
        available_version: None,
    })
}

/// Scans free-form listing text for package ids with upgrade evidence.
///
/// An id qualifies only when it has the vendor.product shape and the two
/// tokens after it are version-shaped with the first strictly older than the
/// second. A line carrying a single version column, or prose mentioning a
/// dotted name, yields nothing.
pub fn scan_candidate_ids(text: &str) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }
        for i in 0..tokens.len() - 2 {
            if !is_candidate_package_id(tokens[i])
                || !is_version_token(tokens[i + 1])
                || !is_version_token(tokens[i + 2])
            {
                continue;
            }
            if compare_versions(tokens[i + 1], tokens[i + 2]) != Ordering::Less {
                continue;
            }
            let id = normalize_id(tokens[i]);
            if !id.is_empty() {
                ids.insert(id);
            }
            break;
        }
    }
    ids
}

/// Extracts id-to-name pairs from tolerant two-column name/id text.
///
/// Fallback for listings whose table never materialized: each line's last
/// token is taken as the id when it has the vendor.product shape, with the
/// rest of the line as the display name. Separator and header lines are
/// skipped. The first name seen for an id wins.
pub fn extract_name_id_pairs(text: &str) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.contains("----") {
            continue;
        }
        if trimmed.contains("Name") && trimmed.contains("Id") {
            continue;
        }
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        if tokens.len() < 2 {
            continue;
        }
        let last = tokens[tokens.len() - 1];
        if !is_candidate_package_id(last) {
            continue;
        }
        let id = normalize_id(last);
        if id.is_empty() {
            continue;
        }
        pairs
            .entry(id)
            .or_insert_with(|| tokens[..tokens.len() - 1].join(" "));
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const UPGRADE_OUTPUT: &str = "\
Name               Id                 Version   Available  Source
-----------------------------------------------------------------
7-Zip              7zip.7zip          22.00     23.01      winget
Mozilla Firefox    Mozilla.Firefox    120.0     121.0      winget
2 upgrades available.
";

    #[test]
    fn test_parse_upgrade_table() {
        let report = parse_upgrade_output(UPGRADE_OUTPUT);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.strategy, StrategyKind::ColumnSlice);
        assert!(!report.saw_not_applicable_banner);

        let seven_zip = &report.records[0];
        assert_eq!(seven_zip.name, "7-Zip");
        assert_eq!(seven_zip.id, "7zip.7zip");
        assert_eq!(seven_zip.installed_version.as_deref(), Some("22.00"));
        assert_eq!(seven_zip.available_version.as_deref(), Some("23.01"));
    }

    #[test]
    fn test_continuation_row_extends_previous_name() {
        let text = "\
Name               Id                 Version   Available  Source
-----------------------------------------------------------------
Microsoft Visual   Microsoft.VCRedist 14.38     14.40      winget
Studio Runtime
1 upgrades available.
";
        let report = parse_upgrade_output(text);
        assert_eq!(report.records.len(), 1);
        assert_eq!(
            report.records[0].name,
            "Microsoft Visual Studio Runtime"
        );
    }

    #[test]
    fn test_no_table_yields_zero_records() {
        let report = parse_upgrade_output("winget encountered an error.\n");
        assert!(report.records.is_empty());
        assert!(!report.warnings.is_empty());
    }

    #[test]
    fn test_banner_flag_set() {
        let text = format!(
            "{}\nNo installed package found matching input criteria.\n",
            crate::reconcile::NOT_APPLICABLE_BANNER
        );
        let report = parse_upgrade_output(&text);
        assert!(report.saw_not_applicable_banner);
        assert!(report.records.is_empty());
    }

    #[test]
    fn test_recovery_pass_adds_missed_record() {
        // second row is shifted so column slicing misreads it, and carries
        // no aligned version pair either
        let text = "\
Name               Id                 Version   Available  Source
-----------------------------------------------------------------
7-Zip              7zip.7zip          22.00     23.01      winget
2 upgrades available.
stray diagnostics: Vendor.App 1.0 2.0
";
        let report = parse_upgrade_output(text);
        let ids: Vec<&str> = report.records.iter().map(|r| r.id.as_str()).collect();
        assert!(ids.contains(&"7zip.7zip"));
        assert!(ids.contains(&"Vendor.App"));
    }

    #[test]
    fn test_parse_list_output() {
        let text = "\
Name               Id                 Version   Source
-------------------------------------------------------
Git                Git.Git            2.43.0    winget
7-Zip              7zip.7zip          23.01     winget
";
        let report = parse_list_output(text);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[0].installed_version.as_deref(), Some("2.43.0"));
        assert!(report.records[0].available_version.is_none());
    }

    #[test]
    fn test_list_fallback_on_localized_header() {
        let text = "\
Navn               Identifikator      Versjon   Kilde
-------------------------------------------------------
Git                Git.Git            2.43.0    winget
";
        let report = parse_list_output(text);
        assert_eq!(report.strategy, StrategyKind::TokenScan);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].id, "Git.Git");
        assert_eq!(report.records[0].installed_version.as_deref(), Some("2.43.0"));
    }

    #[test]
    fn test_list_with_available_column_slices_versions_apart() {
        let text = "\
Name               Id                 Version   Available  Source
-----------------------------------------------------------------
7-Zip              7zip.7zip          22.00     23.01      winget
Git                Git.Git            2.43.0               winget
";
        let report = parse_list_output(text);
        assert_eq!(report.records.len(), 2);

        let seven_zip = &report.records[0];
        assert_eq!(seven_zip.installed_version.as_deref(), Some("22.00"));
        assert_eq!(seven_zip.available_version.as_deref(), Some("23.01"));

        let git = &report.records[1];
        assert_eq!(git.installed_version.as_deref(), Some("2.43.0"));
        assert!(git.available_version.is_none());
    }

    #[test]
    fn test_scan_candidate_ids_requires_version_pair() {
        let text = "\
7-Zip              7zip.7zip          22.00     23.01
Git                Git.Git            2.43.0    winget
Windows SDK        10.0.19045         10.0      10.1
Old.App            3.0                2.0
prose mentioning Vendor.Thing with no version at all
";
        let ids = scan_candidate_ids(text);
        assert_eq!(ids, BTreeSet::from(["7zip.7zip".to_string()]));
    }

    #[test]
    fn test_extract_name_id_pairs() {
        let text = "\
Name                        Id
--------------------------------------
7-Zip 23.01 (x64)           7zip.7zip
Git                         Git.Git
orphan line without any identifier
";
        let pairs = extract_name_id_pairs(text);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs.get("7zip.7zip").map(String::as_str), Some("7-Zip 23.01 (x64)"));
        assert_eq!(pairs.get("Git.Git").map(String::as_str), Some("Git"));
    }
}
