//! Dotted-numeric version comparison.

use std::cmp::Ordering;

/// Compares two version strings segment-wise as integers.
///
/// String-equal inputs compare equal immediately, which covers opaque build-tag
/// versions (`"2024-12 hotfix"`) without attempting to interpret them.
/// Otherwise both strings are split on `.` and compared pairwise; a segment
/// that fails to parse counts as 0, and a missing segment counts as 0, so
/// `"1.2"` equals `"1.2.0"`.
///
/// This is deliberately **not** a semver comparator: there is no pre-release
/// or build-metadata handling. It only needs to answer "is available newer
/// than installed" for the dotted numeric schemes real packages use.
///
/// # Examples
///
/// ```
/// use std::cmp::Ordering;
/// use winget_recon_core::compare_versions;
///
/// assert_eq!(compare_versions("1.2.3", "1.10.0"), Ordering::Less);
/// assert_eq!(compare_versions("2024.1.1", "2024.1.1"), Ordering::Equal);
/// assert_eq!(compare_versions("23.01", "22.00"), Ordering::Greater);
/// ```
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();
    let len = left.len().max(right.len());

    for i in 0..len {
        let va = left.get(i).map_or(0, |s| parse_segment(s));
        let vb = right.get(i).map_or(0, |s| parse_segment(s));
        match va.cmp(&vb) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn parse_segment(segment: &str) -> u64 {
    segment.trim().parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_not_lexical() {
        assert_eq!(compare_versions("1.2.3", "1.10.0"), Ordering::Less);
        assert_eq!(compare_versions("1.10.0", "1.2.3"), Ordering::Greater);
    }

    #[test]
    fn test_reflexive() {
        for v in ["1.2.3", "2024.1.1", "0", "", "not-a-version"] {
            assert_eq!(compare_versions(v, v), Ordering::Equal);
        }
    }

    #[test]
    fn test_missing_segments_count_as_zero() {
        assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.2", "1.2.1"), Ordering::Less);
        assert_eq!(compare_versions("2", "1.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_unparsable_segment_counts_as_zero() {
        assert_eq!(compare_versions("1.beta", "1.0"), Ordering::Equal);
        assert_eq!(compare_versions("1.beta", "1.1"), Ordering::Less);
    }

    #[test]
    fn test_componentwise_leq_never_greater() {
        let pairs = [("1.0.0", "1.0.1"), ("0.9", "1.0"), ("22.00", "23.01")];
        for (a, b) in pairs {
            assert_ne!(compare_versions(a, b), Ordering::Greater, "{a} vs {b}");
        }
    }
}
