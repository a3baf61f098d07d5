//! Scan configuration: timeouts, probe concurrency, and capture fallback.
//!
//! # Example YAML
//!
//! ```yaml
//! list_timeout_secs: 8
//! upgrade_timeout_secs: 30
//! probe_timeout_secs: 4
//! probe_retry_timeout_secs: 8
//! max_probe_concurrency: 8
//! capture_dir: C:\ProgramData\winget-recon\captures
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Timeouts and limits for a scan run.
///
/// All timeouts are in whole seconds. `probe_retry_timeout_secs` bounds the
/// single retry issued when a probe capture comes back empty; it should be
/// at least double `probe_timeout_secs`.
///
/// # Examples
///
/// ```
/// use winget_recon_config::ScanConfig;
///
/// let config = ScanConfig::default();
/// assert_eq!(config.list_timeout_secs, 8);
/// assert!(config.effective_probe_jobs() >= 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Timeout for the `winget list` capture.
    pub list_timeout_secs: u64,
    /// Timeout for the `winget upgrade` capture.
    pub upgrade_timeout_secs: u64,
    /// Timeout for a single per-package probe.
    pub probe_timeout_secs: u64,
    /// Timeout for the retry issued when a probe returns empty output.
    pub probe_retry_timeout_secs: u64,
    /// Upper bound on concurrent probe subprocesses.
    pub max_probe_concurrency: usize,
    /// Directory searched for raw capture files when live invocation fails.
    pub capture_dir: Option<PathBuf>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            list_timeout_secs: 8,
            upgrade_timeout_secs: 30,
            probe_timeout_secs: 4,
            probe_retry_timeout_secs: 8,
            max_probe_concurrency: 8,
            capture_dir: None,
        }
    }
}

impl ScanConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot be
    /// read, or [`YamlError`](crate::ConfigError::YamlError) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::ConfigError::IoError) if the file cannot be
    /// written, or [`YamlError`](crate::ConfigError::YamlError) if
    /// serialization fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Number of probe workers to actually spawn: hardware parallelism capped
    /// by `max_probe_concurrency`, never less than 1.
    pub fn effective_probe_jobs(&self) -> usize {
        let hardware = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        hardware.min(self.max_probe_concurrency).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.list_timeout_secs, 8);
        assert_eq!(config.upgrade_timeout_secs, 30);
        assert_eq!(config.probe_timeout_secs, 4);
        assert_eq!(config.probe_retry_timeout_secs, 8);
        assert_eq!(config.max_probe_concurrency, 8);
        assert!(config.capture_dir.is_none());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config: ScanConfig = serde_yaml::from_str("upgrade_timeout_secs: 60\n").unwrap();
        assert_eq!(config.upgrade_timeout_secs, 60);
        assert_eq!(config.list_timeout_secs, 8);
    }

    #[test]
    fn test_effective_probe_jobs_capped() {
        let mut config = ScanConfig::default();
        config.max_probe_concurrency = 1;
        assert_eq!(config.effective_probe_jobs(), 1);
        config.max_probe_concurrency = 10_000;
        assert!(config.effective_probe_jobs() <= 10_000);
        assert!(config.effective_probe_jobs() >= 1);
    }

    #[test]
    fn test_load_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.yml");

        let mut original = ScanConfig::default();
        original.probe_timeout_secs = 6;
        original.capture_dir = Some(PathBuf::from("/var/tmp/captures"));
        original.save(&path).unwrap();

        let loaded = ScanConfig::load(&path).unwrap();
        assert_eq!(loaded.probe_timeout_secs, 6);
        assert_eq!(loaded.capture_dir, original.capture_dir);
    }
}
