//! Column-offset slicing of table rows.

use winget_recon_core::{normalize_id, PackageRecord};

use super::{RowStrategy, StrategyKind};
use crate::table::TableLayout;

/// Slices each row at the column start offsets resolved from the header.
///
/// Requires a resolved [`TableLayout`]; with none this strategy abstains.
/// Slicing is byte-offset based, which matches the fixed-width padding winget
/// emits for ASCII output. Rows whose name column lands mid-codepoint are
/// abandoned rather than sliced wrongly.
///
/// `has_available` distinguishes upgrade tables (Name, Id, Version,
/// Available, Source) from list tables (Name, Id, Version, Source), where
/// the fourth column is the source and must not be read as a version.
pub struct ColumnSlice {
    pub has_available: bool,
}

impl RowStrategy for ColumnSlice {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ColumnSlice
    }

    fn extract(&self, line: &str, layout: Option<&TableLayout>) -> Option<PackageRecord> {
        let layout = layout?;

        let slice = |i: usize| -> Option<String> {
            let (start, end) = layout.column_range(i, line.len())?;
            if !line.is_char_boundary(start) || !line.is_char_boundary(end) {
                return None;
            }
            let value = line[start..end].trim();
            if value.is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };

        let name = slice(0)?;
        let id = normalize_id(&slice(1)?);
        if id.is_empty() {
            return None;
        }

        Some(PackageRecord {
            id,
            name,
            installed_version: slice(2),
            available_version: if self.has_available { slice(3) } else { None },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> TableLayout {
        // Name @0, Id @19, Version @38, Available @48, Source @59
        TableLayout {
            col_starts: vec![0, 19, 38, 48, 59],
        }
    }

    fn upgrade_slice() -> ColumnSlice {
        ColumnSlice {
            has_available: true,
        }
    }

    #[test]
    fn test_slices_full_row() {
        let line = "7-Zip              7zip.7zip          22.00     23.01      winget";
        let record = upgrade_slice().extract(line, Some(&layout())).unwrap();
        assert_eq!(record.name, "7-Zip");
        assert_eq!(record.id, "7zip.7zip");
        assert_eq!(record.installed_version.as_deref(), Some("22.00"));
        assert_eq!(record.available_version.as_deref(), Some("23.01"));
        assert!(record.is_upgradable());
    }

    #[test]
    fn test_short_row_missing_trailing_columns() {
        let line = "Git                Git.Git            2.43.0";
        let record = upgrade_slice().extract(line, Some(&layout())).unwrap();
        assert_eq!(record.installed_version.as_deref(), Some("2.43.0"));
        assert_eq!(record.available_version, None);
    }

    #[test]
    fn test_list_table_fourth_column_is_not_a_version() {
        // list layout: Name @0, Id @19, Version @38, Source @48
        let layout = TableLayout {
            col_starts: vec![0, 19, 38, 48],
        };
        let line = "Git                Git.Git            2.43.0    winget";
        let record = ColumnSlice {
            has_available: false,
        }
        .extract(line, Some(&layout))
        .unwrap();
        assert_eq!(record.installed_version.as_deref(), Some("2.43.0"));
        assert_eq!(record.available_version, None);
    }

    #[test]
    fn test_abstains_without_layout() {
        let line = "7-Zip 7zip.7zip 22.00 23.01 winget";
        assert!(upgrade_slice().extract(line, None).is_none());
    }

    #[test]
    fn test_abstains_on_empty_id_column() {
        let line = "Orphan name only";
        assert!(upgrade_slice().extract(line, Some(&layout())).is_none());
    }
}
