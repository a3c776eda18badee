//! Shared setup for a CLI invocation: logging, config file and runtime.

use std::path::Path;
use std::time::Duration;

use demofetch::config::FetchConfig;
use demofetch::logging::{init_logging, LogGuard, LogOptions};
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::error::CliError;

/// Values from the command line that override the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub block_size: Option<usize>,
    /// Seconds; 0 disables the per-request timeout.
    pub timeout: Option<u64>,
}

/// Holds the logging guard and the resolved configuration.
pub struct CliRunner {
    config: FetchConfig,
    _log_guard: LogGuard,
}

impl CliRunner {
    /// Install logging, then load the optional config file.
    pub fn new(log: &LogOptions, config_path: Option<&Path>) -> Result<Self, CliError> {
        let log_guard = init_logging(log)?;

        let config = match config_path {
            Some(path) => {
                debug!(path = %path.display(), "Loading config file");
                FetchConfig::load(path)?
            }
            None => FetchConfig::default(),
        };

        Ok(Self {
            config,
            _log_guard: log_guard,
        })
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&mut self, overrides: &Overrides) {
        self.config = resolve_config(self.config.clone(), overrides);
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Log the effective settings once at startup.
    pub fn log_startup(&self) {
        info!(
            version = demofetch::VERSION,
            block_size = self.config.block_size,
            timeout_secs = self.config.request_timeout.map(|t| t.as_secs()),
            primary = %self.config.pairing.primary_extension,
            metadata = %self.config.pairing.metadata_extension,
            "demofetch starting"
        );
    }

    /// Build the multi-threaded runtime the download runs on.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}

/// CLI > config file > default.
pub fn resolve_config(config: FetchConfig, overrides: &Overrides) -> FetchConfig {
    let config = match overrides.block_size {
        Some(size) => config.with_block_size(size),
        None => config,
    };

    match overrides.timeout {
        Some(0) => config.with_request_timeout(None),
        Some(secs) => config.with_request_timeout(Some(Duration::from_secs(secs))),
        None => config,
    }
}
