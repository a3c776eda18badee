//! Progress reporting for batch runs.
//!
//! Two granularities are offered:
//! - [`BlockProgress`] is emitted by the orchestrator each time a block's
//!   barrier is passed.
//! - [`ProgressCounters`] are atomic counters bumped by download tasks as
//!   each target finishes; a [`ProgressReporter`] thread polls them for live
//!   display while a block is in flight.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::summary::DownloadResult;

/// Emitted after every task in a block has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockProgress {
    /// Blocks finished so far, including the one just completed.
    pub blocks_completed: usize,
    pub total_blocks: usize,
    /// Targets finished so far (successful or not).
    pub targets_completed: usize,
    pub total_targets: usize,
}

impl fmt::Display for BlockProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.blocks_completed, self.total_blocks)
    }
}

/// Callback invoked once per completed block.
pub type BlockProgressCallback = Box<dyn Fn(BlockProgress) + Send + Sync>;

/// Live snapshot of target-level progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetProgress {
    pub completed: usize,
    pub failed: usize,
    pub total: usize,
    pub bytes_written: u64,
}

/// Callback invoked by [`ProgressReporter`] on every poll.
pub type TargetProgressCallback = Box<dyn Fn(TargetProgress) + Send + Sync>;

/// Shared progress counters for concurrent download tasks.
#[derive(Debug, Default)]
pub struct ProgressCounters {
    total: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    bytes_written: AtomicU64,
}

impl ProgressCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero the counters for a new run of `total` targets.
    pub fn reset(&self, total: usize) {
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);
        self.failed.store(0, Ordering::SeqCst);
        self.bytes_written.store(0, Ordering::SeqCst);
    }

    /// Count one finished target.
    pub fn record(&self, result: &DownloadResult) {
        match result {
            DownloadResult::Success {
                primary_bytes,
                metadata_bytes,
            } => {
                self.bytes_written
                    .fetch_add(primary_bytes + metadata_bytes, Ordering::SeqCst);
            }
            DownloadResult::Failed(_) => {
                self.failed.fetch_add(1, Ordering::SeqCst);
            }
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> TargetProgress {
        TargetProgress {
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            total: self.total.load(Ordering::SeqCst),
            bytes_written: self.bytes_written.load(Ordering::SeqCst),
        }
    }
}

/// Polls [`ProgressCounters`] on a background thread.
///
/// The thread stops, after one final report, when the reporter is dropped.
pub struct ProgressReporter {
    handle: Option<JoinHandle<()>>,
    done: Arc<AtomicBool>,
}

impl ProgressReporter {
    /// Start polling `counters` every `poll_interval`.
    pub fn start(
        counters: Arc<ProgressCounters>,
        callback: TargetProgressCallback,
        poll_interval: Duration,
    ) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let done_clone = Arc::clone(&done);

        let handle = thread::spawn(move || {
            while !done_clone.load(Ordering::SeqCst) {
                callback(counters.snapshot());
                thread::sleep(poll_interval);
            }

            // Final report
            callback(counters.snapshot());
        });

        Self {
            handle: Some(handle),
            done,
        }
    }

    /// Start a reporter with the default 100ms poll interval.
    pub fn start_default(
        counters: Arc<ProgressCounters>,
        callback: TargetProgressCallback,
    ) -> Self {
        Self::start(counters, callback, Duration::from_millis(100))
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.done.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.join().ok();
        }
    }
}
