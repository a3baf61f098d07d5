//! Heuristic recovery pass over the full capture.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use winget_recon_core::{compare_versions, normalize_id, PackageRecord};

use super::is_version_token;

/// Recovers records the row strategies lost to column misalignment.
///
/// Runs over every line of the raw capture, not just the located table. A
/// recovery needs a token immediately followed by two dotted-numeric version
/// tokens, an id not already in `seen`, and an available version strictly
/// newer than the installed one. At most one record per line.
pub fn recover_records(text: &str, seen: &mut BTreeSet<String>) -> Vec<PackageRecord> {
    let mut recovered = Vec::new();

    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 {
            continue;
        }
        for i in 0..tokens.len() - 2 {
            if is_version_token(tokens[i])
                || !is_version_token(tokens[i + 1])
                || !is_version_token(tokens[i + 2])
            {
                continue;
            }
            let id = normalize_id(tokens[i]);
            if id.is_empty() || seen.contains(&id) {
                continue;
            }
            let installed = tokens[i + 1];
            let available = tokens[i + 2];
            if compare_versions(installed, available) != Ordering::Less {
                continue;
            }
            seen.insert(id.clone());
            recovered.push(PackageRecord {
                name: tokens[..i].join(" "),
                id,
                installed_version: Some(installed.to_string()),
                available_version: Some(available.to_string()),
            });
            break;
        }
    }
    recovered
}
