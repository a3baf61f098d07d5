//! Best-effort parsing of `schtasks /Query /V /FO LIST` output.
//!
//! The LIST format prints `Label:   Value` pairs with both label and value
//! in the console locale. Parsing therefore goes through the keyword tables
//! in [`LocaleKeywords`] and degrades field by field: anything that does not
//! match stays at its default instead of failing the whole query.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;
use winget_recon_config::LocaleKeywords;
use winget_recon_core::TaskScheduleInfo;

/// First whole-number token between 1 and 365.
static INTERVAL_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([0-9]{1,3})\b").expect("static regex must compile"));

/// Time of day, `H:MM` or `HH:MM`.
static TIME_OF_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([01]?[0-9]|2[0-3]):([0-5][0-9])\b").expect("static regex must compile")
});

/// Looks like part of a date, timestamp, or hyphenated name rather than a
/// bare interval.
fn is_date_like(line: &str) -> bool {
    TIME_OF_DAY.is_match(line)
        || line.contains('/')
        || line.contains('.')
        || line.contains('-')
}

fn first_interval_number(line: &str) -> Option<u32> {
    INTERVAL_NUMBER
        .captures_iter(line)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .find(|n| (1..=365).contains(n))
}

/// Command line for querying the maintenance task, ready for a capture run.
pub fn task_query_args(task_name: &str) -> Vec<String> {
    vec![
        "/Query".to_string(),
        "/V".to_string(),
        "/FO".to_string(),
        "LIST".to_string(),
        "/TN".to_string(),
        task_name.to_string(),
    ]
}

/// Parses verbose task query output into a [`TaskScheduleInfo`].
///
/// Missing-task markers (or empty output) mean the task does not exist.
/// The enabled flag comes from the state line, checking disabled keywords
/// before enabled ones since several locales use the same stem for both.
/// The repeat interval is taken from modifier lines first (week counts are
/// converted to days), then from the schedule type, then from a last-resort
/// scan for a bare day count on a value side that is not date-like.
pub fn parse_task_query(text: &str, keywords: &LocaleKeywords) -> TaskScheduleInfo {
    let trimmed = text.trim();
    if trimmed.is_empty() || LocaleKeywords::matches_any(trimmed, &keywords.missing_task_markers) {
        return TaskScheduleInfo::default();
    }

    let mut info = TaskScheduleInfo {
        exists: true,
        enabled: true,
        interval_days: None,
        next_run: None,
        raw_info: text.to_string(),
    };

    let mut weekly_type = false;
    let mut daily_type = false;

    for line in text.lines() {
        let (label, value) = match line.split_once(':') {
            Some((label, value)) => (label.trim(), value.trim()),
            None => continue,
        };
        if value.is_empty() {
            continue;
        }

        if LocaleKeywords::matches_any(label, &keywords.state_keys) {
            if LocaleKeywords::matches_any(value, &keywords.disabled_values) {
                info.enabled = false;
            } else if LocaleKeywords::matches_any(value, &keywords.enabled_values) {
                info.enabled = true;
            }
            continue;
        }

        if LocaleKeywords::matches_any(value, &keywords.weekly_values) {
            weekly_type = true;
        } else if LocaleKeywords::matches_any(value, &keywords.daily_values) {
            daily_type = true;
        }

        // Interval keywords match the whole line: the LIST format nests
        // colons inside labels ("Repeat: Every:"), so label splitting alone
        // cannot be trusted here.
        if info.interval_days.is_none() {
            if LocaleKeywords::matches_any(line, &keywords.week_keys) {
                info.interval_days = first_interval_number(line).map(|n| n * 7);
            } else if LocaleKeywords::matches_any(line, &keywords.day_keys)
                || LocaleKeywords::matches_any(line, &keywords.modifier_keys)
            {
                info.interval_days = first_interval_number(line);
            }
        }

        if info.next_run.is_none() {
            if let Some(m) = TIME_OF_DAY.find(value) {
                info.next_run = Some(m.as_str().to_string());
            }
        }
    }

    if info.interval_days.is_none() {
        if weekly_type {
            info.interval_days = Some(7);
        } else if daily_type {
            info.interval_days = Some(1);
        } else {
            // last resort: a bare day count on the value side of a
            // `Label: Value` line, so host names and task paths never
            // contribute numbers
            info.interval_days = text
                .lines()
                .filter_map(|line| line.split_once(':'))
                .map(|(_, value)| value.trim())
                .filter(|value| !value.is_empty() && !is_date_like(value))
                .find_map(first_interval_number);
            if info.interval_days.is_some() {
                debug!(interval = ?info.interval_days, "interval recovered by bare number scan");
            }
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;

    const EN_WEEKLY: &str = "\
Folder: \\
HostName:                             DESKTOP-1
TaskName:                             \\UpdateCheck
Next Run Time:                        01/09/2026 09:30:00
Status:                               Ready
Scheduled Task State:                 Enabled
Schedule Type:                        Weekly
Days:                                 MON
Repeat: Every:                        2 Week(s)
";

    const NB_DAILY_DISABLED: &str = "\
Mappe: \\
Oppgavenavn:                          \\UpdateCheck
Neste kj\u{f8}retid:                        01.09.2026 06:15:00
Status for planlagt oppgave:          Deaktivert
Planleggingstype:                     Daglig
";

    #[test]
    fn test_english_weekly_task() {
        let info = parse_task_query(EN_WEEKLY, &LocaleKeywords::default());
        assert!(info.exists);
        assert!(info.enabled);
        assert_eq!(info.interval_days, Some(14));
        assert_eq!(info.next_run.as_deref(), Some("09:30"));
    }

    #[test]
    fn test_norwegian_daily_disabled_task() {
        let info = parse_task_query(NB_DAILY_DISABLED, &LocaleKeywords::default());
        assert!(info.exists);
        assert!(!info.enabled);
        assert_eq!(info.interval_days, Some(1));
        assert_eq!(info.next_run.as_deref(), Some("06:15"));
    }

    #[test]
    fn test_missing_task() {
        let text = "ERROR: The system cannot find the file specified.";
        let info = parse_task_query(text, &LocaleKeywords::default());
        assert!(!info.exists);
        assert!(!info.enabled);
    }

    #[test]
    fn test_empty_output_means_missing() {
        let info = parse_task_query("   \n", &LocaleKeywords::default());
        assert!(!info.exists);
    }

    #[test]
    fn test_host_name_number_is_not_an_interval() {
        let text = "\
HostName:                             DESKTOP-1
TaskName:                             \\UpdateCheck
Status:                               Ready
";
        let info = parse_task_query(text, &LocaleKeywords::default());
        assert!(info.exists);
        assert_eq!(info.interval_days, None);
    }

    #[test]
    fn test_bare_day_count_comes_from_value_side() {
        let text = "\
TaskName:                             \\UpdateCheck
Interval:                             3
";
        let info = parse_task_query(text, &LocaleKeywords::default());
        assert_eq!(info.interval_days, Some(3));
    }

    #[test]
    fn test_weekly_type_without_modifier_defaults_to_seven() {
        let text = "\
Scheduled Task State:                 Enabled
Schedule Type:                        Weekly
";
        let info = parse_task_query(text, &LocaleKeywords::default());
        assert_eq!(info.interval_days, Some(7));
    }

    #[test]
    fn test_raw_info_is_verbatim() {
        let info = parse_task_query(EN_WEEKLY, &LocaleKeywords::default());
        assert_eq!(info.raw_info, EN_WEEKLY);
    }

    #[test]
    fn test_task_query_args() {
        let args = task_query_args("\\UpdateCheck");
        assert_eq!(args.first().map(String::as_str), Some("/Query"));
        assert_eq!(args.last().map(String::as_str), Some("\\UpdateCheck"));
    }
}
