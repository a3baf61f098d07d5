//! Whitespace-token fallback extraction.

use winget_recon_core::{normalize_id, PackageRecord};

use super::{is_version_token, RowStrategy, StrategyKind};
use crate::table::TableLayout;

/// Recovers a record from a whitespace-tokenized row.
///
/// Used when the header columns did not resolve (localized console) or a row
/// did not line up with the header offsets. Scans tokens from the right for
/// two consecutive dotted-numeric versions; the token left of the pair is the
/// id and everything before it rejoins into the display name. Needs at least
/// three tokens and a matched version pair, otherwise the row yields nothing.
pub struct TokenScan;

impl RowStrategy for TokenScan {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TokenScan
    }

    fn extract(&self, line: &str, _layout: Option<&TableLayout>) -> Option<PackageRecord> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            return None;
        }

        // rightmost adjacent version pair wins, trailing source column ignored
        for i in (1..tokens.len() - 1).rev() {
            if !is_version_token(tokens[i]) || !is_version_token(tokens[i + 1]) {
                continue;
            }
            let id = normalize_id(tokens[i - 1]);
            if id.is_empty() {
                return None;
            }
            let name = tokens[..i - 1].join(" ");
            let name = if name.is_empty() { id.clone() } else { name };
            return Some(PackageRecord {
                id,
                name,
                installed_version: Some(tokens[i].to_string()),
                available_version: Some(tokens[i + 1].to_string()),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_from_collapsed_row() {
        let record = TokenScan
            .extract("Mozilla Firefox Mozilla.Firefox 120.0 121.0 winget", None)
            .unwrap();
        assert_eq!(record.name, "Mozilla Firefox");
        assert_eq!(record.id, "Mozilla.Firefox");
        assert_eq!(record.installed_version.as_deref(), Some("120.0"));
        assert_eq!(record.available_version.as_deref(), Some("121.0"));
    }

    #[test]
    fn test_rightmost_pair_wins() {
        // first two numeric tokens belong to the name, not the version pair
        let record = TokenScan
            .extract("Tool 2000 Pro Vendor.Tool 1.0 2.0 winget", None)
            .unwrap();
        assert_eq!(record.id, "Vendor.Tool");
        assert_eq!(record.installed_version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_no_version_pair_yields_nothing() {
        assert!(TokenScan.extract("Some prose about upgrades", None).is_none());
        assert!(TokenScan.extract("App Vendor.App 1.2.3", None).is_none());
    }

    #[test]
    fn test_too_few_tokens_yields_nothing() {
        assert!(TokenScan.extract("1.0 2.0", None).is_none());
    }

    #[test]
    fn test_bare_id_row_uses_id_as_name() {
        let record = TokenScan.extract("Vendor.App 1.0 2.0", None).unwrap();
        assert_eq!(record.id, "Vendor.App");
        assert_eq!(record.name, "Vendor.App");
    }
}
