//! Fuzzy matching of package ids against registry-style program entries.
//!
//! Uninstall-registry entries rarely carry winget package ids, so presence
//! checks go through normalized substring matching against display names and
//! publishers. The matching is intentionally permissive; registry naming is
//! too inconsistent for anything stricter to keep real matches.

use serde::{Deserialize, Serialize};

/// One installed-program entry as read from the OS uninstall registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledProgram {
    pub display_name: String,
    #[serde(default)]
    pub publisher: String,
}

/// Authoritative installed-presence check used by sync planning.
pub trait InstalledGroundTruth {
    fn is_installed(&self, package_id: &str) -> bool;
}

/// Exact-id ground truth, used when presence comes from `winget list` itself.
impl InstalledGroundTruth for std::collections::HashSet<String> {
    fn is_installed(&self, package_id: &str) -> bool {
        self.contains(package_id)
    }
}

/// Registry-backed ground truth over fuzzy name matching.
#[derive(Debug, Clone, Default)]
pub struct InstalledPrograms {
    pub programs: Vec<InstalledProgram>,
}

impl InstalledPrograms {
    pub fn new(programs: Vec<InstalledProgram>) -> Self {
        Self { programs }
    }
}

impl InstalledGroundTruth for InstalledPrograms {
    /// A package id matches an entry when its normalized form, or either
    /// dot-separated half, appears as a substring of the normalized display
    /// name or publisher.
    fn is_installed(&self, package_id: &str) -> bool {
        let whole = normalize(package_id);
        if whole.is_empty() {
            return false;
        }
        let halves: Vec<String> = package_id
            .splitn(2, '.')
            .map(normalize)
            .filter(|half| !half.is_empty())
            .collect();

        self.programs.iter().any(|program| {
            let name = normalize(&program.display_name);
            let publisher = normalize(&program.publisher);
            let hit = |needle: &str| {
                !needle.is_empty() && (name.contains(needle) || publisher.contains(needle))
            };
            hit(&whole) || halves.iter().any(|half| hit(half))
        })
    }
}

/// Lowercased alphanumerics only; everything else is stripped.
fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn programs() -> InstalledPrograms {
        InstalledPrograms::new(vec![
            InstalledProgram {
                display_name: "Mozilla Firefox (x64 en-US)".to_string(),
                publisher: "Mozilla".to_string(),
            },
            InstalledProgram {
                display_name: "7-Zip 23.01".to_string(),
                publisher: "Igor Pavlov".to_string(),
            },
        ])
    }

    #[test]
    fn test_matches_by_product_half() {
        // "firefox" half appears in the display name
        assert!(programs().is_installed("Mozilla.Firefox"));
    }

    #[test]
    fn test_matches_by_publisher() {
        assert!(programs().is_installed("Mozilla.Thunderbird"));
    }

    #[test]
    fn test_matches_despite_punctuation() {
        // "7zip" normalizes to the same form as "7-Zip"
        assert!(programs().is_installed("7zip.7zip"));
    }

    #[test]
    fn test_no_match() {
        assert!(!programs().is_installed("VideoLAN.VLC"));
    }

    #[test]
    fn test_exact_set_ground_truth() {
        let set: std::collections::HashSet<String> = ["Git.Git".to_string()].into();
        assert!(set.is_installed("Git.Git"));
        assert!(!set.is_installed("git.git"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("7-Zip 23.01"), "7zip2301");
        assert_eq!(normalize("Mozilla.Firefox"), "mozillafirefox");
        assert_eq!(normalize("---"), "");
    }
}
