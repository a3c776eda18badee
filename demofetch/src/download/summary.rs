//! Per-target outcomes and the aggregated run summary.

use serde::Serialize;

use crate::error::FetchFailed;
use crate::manifest::FetchTarget;

/// Outcome of fetching one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadResult {
    /// Both files were written.
    Success {
        primary_bytes: u64,
        metadata_bytes: u64,
    },
    /// One leg failed; see [`FetchFailed::leg`].
    Failed(FetchFailed),
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, DownloadResult::Success { .. })
    }
}

/// A target that did not complete, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetFailure {
    pub relative_path: String,
    #[serde(flatten)]
    pub error: FetchFailed,
}

/// Totals for a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Number of targets in the run.
    pub total_targets: usize,
    /// Targets whose two files were both written.
    pub succeeded: usize,
    /// Failed targets, in index order.
    pub failures: Vec<TargetFailure>,
    /// Bytes written by successful targets.
    pub bytes_written: u64,
    pub blocks_completed: usize,
    pub total_blocks: usize,
    /// Wall-clock duration of the run in milliseconds.
    pub elapsed_ms: u64,
}

impl RunSummary {
    /// Create an empty summary for a run of the given shape.
    pub fn new(total_targets: usize, total_blocks: usize) -> Self {
        Self {
            total_targets,
            total_blocks,
            ..Default::default()
        }
    }

    /// Record the outcome of one target.
    pub fn record(&mut self, target: &FetchTarget, result: &DownloadResult) {
        match result {
            DownloadResult::Success {
                primary_bytes,
                metadata_bytes,
            } => {
                self.succeeded += 1;
                self.bytes_written += primary_bytes + metadata_bytes;
            }
            DownloadResult::Failed(error) => {
                self.failures.push(TargetFailure {
                    relative_path: target.relative_path.clone(),
                    error: error.clone(),
                });
            }
        }
    }

    /// Whether any target failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Number of failed targets.
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Whether every block ran and every target succeeded.
    pub fn is_complete(&self) -> bool {
        self.blocks_completed == self.total_blocks && self.succeeded == self.total_targets
    }
}
