//! Tracing subscriber setup.
//!
//! Console output goes to stderr so stdout stays free for progress lines.
//! `RUST_LOG` takes precedence over the verbosity passed by the caller. When
//! a log file is requested, everything that passes the filter is also
//! written there, without ANSI colours, through a non-blocking writer.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("logging already initialized")]
    AlreadyInitialized,

    #[error("failed to open log file {}: {source}", path.display())]
    LogFile { path: PathBuf, source: io::Error },
}

/// Logging options.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// 0 = warnings only, 1 = info, 2 = debug, 3+ = trace.
    pub verbosity: u8,
    /// Also append log records to this file.
    pub log_file: Option<PathBuf>,
    /// Colourise console output.
    pub use_color: bool,
}

/// Keeps the background log writer alive; flushes on drop.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Install the global tracing subscriber.
pub fn init_logging(options: &LogOptions) -> Result<LogGuard, LogError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(options.verbosity)));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_ansi(options.use_color)
        .with_writer(io::stderr);

    let (file_layer, file_guard) = match options.log_file {
        Some(ref path) => {
            let (writer, guard) = tracing_appender::non_blocking(open_log_file(path)?);
            let layer = fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LogError::AlreadyInitialized)?;

    Ok(LogGuard {
        _file_guard: file_guard,
    })
}

/// Filter directive used when `RUST_LOG` is unset.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,demofetch=info",
        2 => "info,demofetch=debug",
        _ => "debug,demofetch=trace",
    }
}

fn open_log_file(path: &Path) -> Result<File, LogError> {
    let to_error = |source| LogError::LogFile {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(to_error)?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(to_error)
}
