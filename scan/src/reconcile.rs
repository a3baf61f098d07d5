//! Upgrade classification and installed-set reconciliation.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;
use winget_recon_core::{PackageRecord, SyncPlan};

use crate::registry::InstalledGroundTruth;

/// Banner winget prints when a listed upgrade cannot be applied here
/// (architecture, scope, or source mismatch).
pub const NOT_APPLICABLE_BANNER: &str = "A newer package version is available in a configured source, but it does not apply to your system or requirements";

/// Shorter per-probe variant of the same condition.
pub const NO_APPLICABLE_UPGRADE: &str = "No applicable upgrade found";

/// Returns `true` if `text` carries either not-applicable banner.
pub fn contains_not_applicable_banner(text: &str) -> bool {
    text.contains(NOT_APPLICABLE_BANNER) || text.contains(NO_APPLICABLE_UPGRADE)
}

/// Result of classifying one upgrade capture.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeScan {
    /// Records whose available version is strictly newer than installed.
    pub upgradable: Vec<PackageRecord>,
    /// Ids whose listed upgrade cannot be applied on this system.
    pub not_applicable: BTreeSet<String>,
}

/// Ids from `known_list` whose upgrade rows show a strictly newer available
/// version. `known_list` maps id to display name; ids absent from it are
/// still accepted (the full listing can be stale or truncated).
pub fn upgrade_candidates(
    known_list: &BTreeMap<String, String>,
    upgrade_records: &[PackageRecord],
) -> BTreeSet<String> {
    upgrade_records
        .iter()
        .filter(|record| record.is_upgradable())
        .filter(|record| known_list.is_empty() || known_list.contains_key(&record.id))
        .map(|record| record.id.clone())
        .collect()
}

/// Classifies an upgrade capture into upgradable records and not-applicable
/// ids.
///
/// The suppression rule: when the capture carries the not-applicable banner
/// and extraction confirmed zero upgrade records, every candidate id from
/// the listing is not-applicable and nothing is upgradable. Winget prints
/// that banner once for the whole run, so with no confirmed rows there is no
/// way to attribute it to a single package.
pub fn classify_upgrade_scan(
    records: &[PackageRecord],
    saw_banner: bool,
    list_candidates: &BTreeSet<String>,
) -> UpgradeScan {
    let upgradable: Vec<PackageRecord> = records
        .iter()
        .filter(|record| record.is_upgradable())
        .cloned()
        .collect();

    if saw_banner && upgradable.is_empty() {
        debug!(
            candidates = list_candidates.len(),
            "not-applicable banner with zero confirmed records, suppressing all candidates"
        );
        return UpgradeScan {
            upgradable: Vec::new(),
            not_applicable: list_candidates.clone(),
        };
    }

    UpgradeScan {
        upgradable,
        not_applicable: BTreeSet::new(),
    }
}

/// Plans the additive sync of the persisted installed set against ground
/// truth.
///
/// For every id in `catalog`, compares ground-truth presence with the
/// persisted mark: installed but unmarked goes to `to_add`, marked but not
/// installed goes to `to_remove`. Pure and idempotent; running it twice on
/// the same inputs yields the same plan.
pub fn plan_installed_sync(
    catalog: &BTreeMap<String, String>,
    marked_installed: &BTreeSet<String>,
    ground_truth: &dyn InstalledGroundTruth,
) -> SyncPlan {
    let mut plan = SyncPlan::default();

    for id in catalog.keys() {
        let actually_installed = ground_truth.is_installed(id);
        let marked = marked_installed.contains(id);
        if actually_installed && !marked {
            plan.to_add.insert(id.clone());
        } else if !actually_installed && marked {
            plan.to_remove.insert(id.clone());
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, installed: &str, available: &str) -> PackageRecord {
        PackageRecord {
            id: id.to_string(),
            name: id.to_string(),
            installed_version: Some(installed.to_string()),
            available_version: Some(available.to_string()),
        }
    }

    #[test]
    fn test_banner_with_zero_records_suppresses_all_candidates() {
        let candidates = BTreeSet::from(["A.App".to_string(), "B.App".to_string()]);
        let scan = classify_upgrade_scan(&[], true, &candidates);
        assert!(scan.upgradable.is_empty());
        assert_eq!(scan.not_applicable, candidates);
    }

    #[test]
    fn test_banner_with_confirmed_records_keeps_them() {
        let candidates = BTreeSet::from(["A.App".to_string()]);
        let records = vec![record("B.App", "1.0", "2.0")];
        let scan = classify_upgrade_scan(&records, true, &candidates);
        assert_eq!(scan.upgradable.len(), 1);
        assert!(scan.not_applicable.is_empty());
    }

    #[test]
    fn test_non_upgradable_records_filtered() {
        let records = vec![record("A.App", "2.0", "2.0"), record("B.App", "1.0", "1.1")];
        let scan = classify_upgrade_scan(&records, false, &BTreeSet::new());
        assert_eq!(scan.upgradable.len(), 1);
        assert_eq!(scan.upgradable[0].id, "B.App");
    }

    #[test]
    fn test_sync_plan_add_and_remove() {
        let catalog: BTreeMap<String, String> = [("A.App", "A"), ("B.App", "B"), ("C.App", "C")]
            .into_iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        let marked = BTreeSet::from(["A.App".to_string(), "C.App".to_string()]);
        let ground_truth: std::collections::HashSet<String> =
            ["A.App".to_string(), "B.App".to_string()].into();

        let plan = plan_installed_sync(&catalog, &marked, &ground_truth);
        assert_eq!(plan.to_add, BTreeSet::from(["B.App".to_string()]));
        assert_eq!(plan.to_remove, BTreeSet::from(["C.App".to_string()]));
    }

    #[test]
    fn test_sync_plan_idempotent() {
        let catalog: BTreeMap<String, String> =
            [("A.App".to_string(), "A".to_string())].into_iter().collect();
        let marked = BTreeSet::new();
        let ground_truth: std::collections::HashSet<String> = ["A.App".to_string()].into();

        let first = plan_installed_sync(&catalog, &marked, &ground_truth);
        let second = plan_installed_sync(&catalog, &marked, &ground_truth);
        assert_eq!(first, second);
        assert_eq!(first.to_add, BTreeSet::from(["A.App".to_string()]));
        assert!(first.to_remove.is_empty());
    }

    #[test]
    fn test_upgrade_candidates_respects_known_list() {
        let known: BTreeMap<String, String> =
            [("A.App".to_string(), "A".to_string())].into_iter().collect();
        let records = vec![record("A.App", "1.0", "2.0"), record("B.App", "1.0", "2.0")];
        let candidates = upgrade_candidates(&known, &records);
        assert_eq!(candidates, BTreeSet::from(["A.App".to_string()]));
    }

    #[test]
    fn test_banner_detection() {
        assert!(contains_not_applicable_banner(
            "A newer package version is available in a configured source, but it does not apply to your system or requirements."
        ));
        assert!(contains_not_applicable_banner("No applicable upgrade found."));
        assert!(!contains_not_applicable_banner("2 upgrades available."));
    }
}
