//! CLI error type and exit code mapping.

use std::fmt;
use std::io;

use demofetch::error::{BlockError, ConfigError, FetchError, ManifestError, SinkError};
use demofetch::logging::LogError;

/// Exit code for a run stopped by Ctrl-C.
pub const EXIT_INTERRUPTED: i32 = 130;

/// Errors that stop the CLI before or around a batch run.
///
/// Per-target download failures are not errors at this level; they are
/// reported in the run summary and the process still exits with 0.
#[derive(Debug)]
pub enum CliError {
    Logging(LogError),
    Config(ConfigError),
    Manifest(ManifestError),
    Block(BlockError),
    Fetch(FetchError),
    Runtime(io::Error),
    SignalHandler(String),
    Report(String),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Logging(e) => write!(f, "{}", e),
            CliError::Config(e) => write!(f, "{}", e),
            CliError::Manifest(e) => write!(f, "{}", e),
            CliError::Block(e) => write!(f, "{}", e),
            CliError::Fetch(e) => write!(f, "{}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Report(msg) => write!(f, "Failed to write report: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Logging(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Manifest(e) => Some(e),
            CliError::Block(e) => Some(e),
            CliError::Fetch(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::SignalHandler(_) | CliError::Report(_) => None,
        }
    }
}

impl From<LogError> for CliError {
    fn from(e: LogError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<ManifestError> for CliError {
    fn from(e: ManifestError) -> Self {
        CliError::Manifest(e)
    }
}

impl From<BlockError> for CliError {
    fn from(e: BlockError) -> Self {
        CliError::Block(e)
    }
}

impl From<FetchError> for CliError {
    fn from(e: FetchError) -> Self {
        CliError::Fetch(e)
    }
}

impl From<SinkError> for CliError {
    fn from(e: SinkError) -> Self {
        CliError::Report(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_exit_with_one() {
        let errors = [
            CliError::Manifest(ManifestError::Malformed("expected value".into())),
            CliError::Block(BlockError::InvalidBlockSize(0)),
            CliError::Report("disk full".into()),
        ];
        for err in errors {
            assert_eq!(err.exit_code(), 1);
        }
    }

    #[test]
    fn test_library_messages_pass_through() {
        let err = CliError::from(BlockError::InvalidBlockSize(0));
        assert_eq!(err.to_string(), "invalid block size 0: must be at least 1");
    }
}
