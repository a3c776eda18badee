//! Fetch configuration.
//!
//! Settings come from three places, highest priority first: command-line
//! flags, an optional INI file, and the built-in defaults below.
//!
//! ```ini
//! [download]
//! block_size = 100
//! ; seconds, 0 disables the per-request timeout
//! timeout = 30
//! user_agent = demofetch/0.1
//!
//! [pairing]
//! primary_extension = .mp4
//! metadata_extension = .jsonl
//! ```

use std::path::Path;
use std::time::Duration;

use ini::{Ini, Properties};

use crate::error::ConfigError;
use crate::manifest::PairingRule;

/// Default number of targets fetched concurrently per block.
pub const DEFAULT_BLOCK_SIZE: usize = 100;

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Targets per block; also the ceiling on concurrent downloads.
    pub block_size: usize,

    /// Per-request timeout. `None` means a stalled request waits forever.
    pub request_timeout: Option<Duration>,

    /// User-Agent header sent with every request.
    pub user_agent: String,

    /// How metadata file names are derived from primary file names.
    pub pairing: PairingRule,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            request_timeout: None,
            user_agent: format!("demofetch/{}", crate::VERSION),
            pairing: PairingRule::default(),
        }
    }
}

impl FetchConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an INI file, layering its values over the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Load {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::default().apply_ini(&ini)
    }

    /// Override settings with whatever keys `ini` defines.
    pub fn apply_ini(mut self, ini: &Ini) -> Result<Self, ConfigError> {
        if let Some(section) = ini.section(Some("download")) {
            if let Some(size) = parse_number(section, "download", "block_size")? {
                if size == 0 {
                    return Err(invalid("download", "block_size", "0", "must be at least 1"));
                }
                self.block_size = size as usize;
            }
            if let Some(secs) = parse_number(section, "download", "timeout")? {
                self.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            if let Some(agent) = section.get("user_agent") {
                self.user_agent = agent.trim().to_string();
            }
        }

        if let Some(section) = ini.section(Some("pairing")) {
            if let Some(ext) = section.get("primary_extension") {
                self.pairing.primary_extension = ext.trim().to_string();
            }
            if let Some(ext) = section.get("metadata_extension") {
                let ext = ext.trim();
                if ext.is_empty() {
                    return Err(invalid("pairing", "metadata_extension", ext, "must not be empty"));
                }
                self.pairing.metadata_extension = ext.to_string();
            }
            if self.pairing.primary_extension == self.pairing.metadata_extension {
                return Err(invalid(
                    "pairing",
                    "metadata_extension",
                    &self.pairing.metadata_extension,
                    "must differ from primary_extension",
                ));
            }
        }

        Ok(self)
    }

    /// Set the block size.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the pairing rule.
    pub fn with_pairing(mut self, pairing: PairingRule) -> Self {
        self.pairing = pairing;
        self
    }
}

fn parse_number(
    section: &Properties,
    section_name: &'static str,
    key: &'static str,
) -> Result<Option<u64>, ConfigError> {
    match section.get(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| invalid(section_name, key, raw, &e.to_string())),
    }
}

fn invalid(section: &'static str, key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        section,
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_str(source: &str) -> Result<FetchConfig, ConfigError> {
        let ini = Ini::load_from_str(source).unwrap();
        FetchConfig::default().apply_ini(&ini)
    }

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.block_size, 100);
        assert!(config.request_timeout.is_none());
        assert!(config.user_agent.starts_with("demofetch/"));
        assert_eq!(config.pairing, PairingRule::default());
    }

    #[test]
    fn test_builder_pattern() {
        let config = FetchConfig::new()
            .with_block_size(8)
            .with_request_timeout(Some(Duration::from_secs(60)))
            .with_user_agent("tester")
            .with_pairing(PairingRule::new(".mkv", ".json"));

        assert_eq!(config.block_size, 8);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(60)));
        assert_eq!(config.user_agent, "tester");
        assert_eq!(config.pairing.metadata_extension, ".json");
    }

    #[test]
    fn test_ini_overrides_defaults() {
        let config = load_str(
            "[download]\nblock_size = 25\ntimeout = 30\nuser_agent = bot/1\n\
             [pairing]\nprimary_extension = .webm\nmetadata_extension = .json\n",
        )
        .unwrap();

        assert_eq!(config.block_size, 25);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.user_agent, "bot/1");
        assert_eq!(config.pairing, PairingRule::new(".webm", ".json"));
    }

    #[test]
    fn test_ini_partial_keeps_defaults() {
        let config = load_str("[download]\ntimeout = 0\n").unwrap();
        assert_eq!(config.block_size, DEFAULT_BLOCK_SIZE);
        assert!(config.request_timeout.is_none());
    }

    #[test]
    fn test_ini_rejects_zero_block_size() {
        let err = load_str("[download]\nblock_size = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "block_size", .. }));
    }

    #[test]
    fn test_ini_rejects_non_numeric() {
        let err = load_str("[download]\ntimeout = soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "timeout", .. }));
    }

    #[test]
    fn test_ini_rejects_identical_extensions() {
        let err = load_str("[pairing]\nmetadata_extension = .mp4\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "metadata_extension",
                ..
            }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        let err = FetchConfig::load(&temp.path().join("missing.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
    }

    #[test]
    fn test_load_from_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("demofetch.ini");
        std::fs::write(&path, "[download]\nblock_size = 7\n").unwrap();

        let config = FetchConfig::load(&path).unwrap();
        assert_eq!(config.block_size, 7);
    }
}
