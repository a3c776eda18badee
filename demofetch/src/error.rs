//! Error types for demofetch.
//!
//! Fatal errors (`ManifestError`, `BlockError`, `SinkError`, `ConfigError`)
//! stop a run before any network activity. `FetchFailed` is the per-target,
//! non-fatal error: it is recorded in the run summary and never aborts
//! sibling downloads.

use std::fmt;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Result type for output sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for whole-run operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Errors raised while reading or resolving an index file.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The index file could not be read.
    #[error("failed to read manifest {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The index is not well-formed JSON or is missing required fields.
    #[error("malformed manifest: {0}")]
    Malformed(String),

    /// A relative path has no final file name component (e.g. ends in `/`).
    #[error("malformed manifest: relative path {relpath:?} has no file name")]
    EmptyFilename { relpath: String },

    /// Two relative paths resolve to the same local file name.
    #[error("malformed manifest: more than one target writes {name}")]
    DuplicateFilename { name: String },
}

/// Errors raised by the block partitioner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlockError {
    /// Block size must be at least one.
    #[error("invalid block size {0}: must be at least 1")]
    InvalidBlockSize(usize),
}

/// Errors raised by the output sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The output directory (or one of its ancestors) could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    DirectoryCreateFailed { path: PathBuf, source: io::Error },

    /// The output path exists but is not a directory.
    #[error("{} exists and is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// A file could not be written, flushed or moved into place.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// Errors raised while loading the INI configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or parsed as INI.
    #[error("failed to load config {}: {reason}", path.display())]
    Load { path: PathBuf, reason: String },

    /// A key holds a value of the wrong shape.
    #[error("invalid value for [{section}] {key}: {value:?} ({reason})")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Fatal errors that stop a batch run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Which of a target's two downloads failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchLeg {
    /// The video itself.
    Primary,
    /// The companion action log.
    Metadata,
}

impl fmt::Display for FetchLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchLeg::Primary => write!(f, "primary"),
            FetchLeg::Metadata => write!(f, "metadata"),
        }
    }
}

/// Why a leg failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "lowercase")]
pub enum FetchCause {
    /// The server answered with a non-success status code.
    Status(u16),
    /// The request or the body stream failed at the transport level.
    Transport(String),
    /// The body arrived but could not be written locally.
    Io(String),
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchCause::Status(code) => write!(f, "HTTP status {}", code),
            FetchCause::Transport(msg) => write!(f, "network error: {}", msg),
            FetchCause::Io(msg) => write!(f, "write error: {}", msg),
        }
    }
}

/// Per-target download failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{leg} leg failed: {cause}")]
pub struct FetchFailed {
    pub leg: FetchLeg,
    pub cause: FetchCause,
}

impl FetchFailed {
    pub fn new(leg: FetchLeg, cause: FetchCause) -> Self {
        Self { leg, cause }
    }

    /// Failure caused by a non-success HTTP status.
    pub fn status(leg: FetchLeg, code: u16) -> Self {
        Self::new(leg, FetchCause::Status(code))
    }

    /// Failure caused by a transport error.
    pub fn transport(leg: FetchLeg, reason: impl Into<String>) -> Self {
        Self::new(leg, FetchCause::Transport(reason.into()))
    }
}
