//! Locale keyword tables for scheduler output parsing.
//!
//! `schtasks /Query /V /FO LIST` emits field labels and values in the console
//! locale, so the parser matches substrings against configurable keyword sets
//! instead of fixed English strings. The defaults cover English plus the
//! Scandinavian locales seen in the field; deployments on other locales ship
//! their own YAML table.

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Keyword sets used when parsing localized scheduler output.
///
/// All matching is done case-insensitively on substrings, so short stems like
/// `"deaktiv"` cover both `Deaktivert` and `Deaktiverad`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocaleKeywords {
    /// Values meaning a task is enabled.
    pub enabled_values: Vec<String>,
    /// Values meaning a task is disabled. Checked before `enabled_values`.
    pub disabled_values: Vec<String>,
    /// Schedule-type values meaning a weekly recurrence.
    pub weekly_values: Vec<String>,
    /// Schedule-type values meaning a daily recurrence.
    pub daily_values: Vec<String>,
    /// Field labels carrying the enabled or disabled state.
    pub state_keys: Vec<String>,
    /// Field labels carrying the repeat modifier (every N periods).
    pub modifier_keys: Vec<String>,
    /// Field labels whose numeric value is an interval in weeks.
    pub week_keys: Vec<String>,
    /// Field labels whose numeric value is an interval in days.
    pub day_keys: Vec<String>,
    /// Phrases in query output meaning the task does not exist.
    pub missing_task_markers: Vec<String>,
}

impl Default for LocaleKeywords {
    fn default() -> Self {
        Self {
            enabled_values: to_strings(&["enabled", "yes", "true", "ja", "aktiv", "aktivert", "1"]),
            disabled_values: to_strings(&["disabled", "deaktiv", "ikke", "nei", "0"]),
            weekly_values: to_strings(&["weekly", "ukentlig", "veckovis", "uge"]),
            daily_values: to_strings(&["daily", "daglig", "dagligen"]),
            state_keys: to_strings(&["scheduled task state", "status", "tilstand"]),
            modifier_keys: to_strings(&["repeat: every", "modifier", "gjenta", "upprepa"]),
            week_keys: to_strings(&["weeks", "week(s)", "uker", "veckor"]),
            day_keys: to_strings(&[
                "days interval",
                "daysinterval",
                "day(s)",
                "dagersintervall",
            ]),
            missing_task_markers: to_strings(&[
                "cannot find the file",
                "does not exist",
                "finner ikke",
                "finnes ikke",
                "hittades inte",
            ]),
        }
    }
}

impl LocaleKeywords {
    /// Loads a keyword table from a YAML file. Absent fields keep their
    /// default values, so a table only needs to override what differs.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let keywords = serde_yaml::from_reader(reader)?;
        Ok(keywords)
    }

    /// Saves the keyword table as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Returns `true` if any keyword in `set` occurs in `text`
    /// (case-insensitive substring match).
    pub fn matches_any(text: &str, set: &[String]) -> bool {
        let lower = text.to_lowercase();
        set.iter().any(|k| lower.contains(&k.to_lowercase()))
    }
}
