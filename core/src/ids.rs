//! Package id shape validation and cleanup.

use std::sync::LazyLock;

use regex::Regex;

/// Matches the `Vendor.Product` shape winget package ids take: two halves
/// joined by a dot, each half containing at least one letter. The letter
/// requirement is what rejects bare version strings like `10.0.19045`.
static CANDIDATE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9+_-]*[A-Za-z][A-Za-z0-9+._-]*\.[A-Za-z0-9+_-]*[A-Za-z][A-Za-z0-9+._-]*$")
        .expect("static regex must compile")
});

/// Returns `true` if `token` looks like a winget package id.
///
/// # Examples
///
/// ```
/// use winget_recon_core::is_candidate_package_id;
///
/// assert!(is_candidate_package_id("Mozilla.Firefox"));
/// assert!(is_candidate_package_id("7zip.7zip"));
/// assert!(!is_candidate_package_id("10.0.19045"));
/// assert!(!is_candidate_package_id("Firefox"));
/// ```
pub fn is_candidate_package_id(token: &str) -> bool {
    CANDIDATE_ID.is_match(token)
}

/// Strips the punctuation and control characters that cling to ids lifted out
/// of raw console captures: surrounding quotes, trailing sentence punctuation,
/// and anything below `0x20` (progress-spinner carriage returns included).
pub fn normalize_id(raw: &str) -> String {
    let mut s: String = raw.chars().filter(|c| *c as u32 >= 0x20).collect();
    s = s.trim().to_string();

    if s.len() >= 2 {
        let bytes = s.as_bytes();
        if (bytes[0] == b'"' && bytes[s.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[s.len() - 1] == b'\'')
        {
            s = s[1..s.len() - 1].to_string();
        }
    }

    while s.ends_with(',') || s.ends_with('.') || s.ends_with('"') {
        s.pop();
    }
    s.trim().to_string()
}
