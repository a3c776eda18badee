//! Block-by-block download orchestration.
//!
//! Each block is fanned out as one task per target. The orchestrator waits
//! for every task in the block to finish before it starts the next block, so
//! at most `block_size` targets (two sequential requests each) are ever in
//! flight. A slow request holds up its whole block; there is no run-level
//! timeout.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::block::{partition, Block};
use super::http::HttpClient;
use super::pair::fetch_pair;
use super::progress::{BlockProgress, BlockProgressCallback, ProgressCounters};
use super::summary::{DownloadResult, RunSummary};
use crate::error::{FetchFailed, FetchLeg, FetchResult};
use crate::manifest::{Manifest, PairingRule};
use crate::sink::ensure_dir;

/// Batch download orchestrator.
///
/// Holds the HTTP client for the lifetime of a run; every task in every
/// block shares it.
pub struct BatchDownloader {
    client: Arc<dyn HttpClient>,
    counters: Arc<ProgressCounters>,
}

impl BatchDownloader {
    /// Create an orchestrator around a shared client.
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            counters: Arc::new(ProgressCounters::new()),
        }
    }

    /// Live target-level counters for the current run.
    pub fn counters(&self) -> Arc<ProgressCounters> {
        Arc::clone(&self.counters)
    }

    /// Resolve `manifest`, create `output_dir`, and download everything.
    ///
    /// Fails only on setup errors, all of which are raised before any
    /// request is made. Per-target failures end up in the returned summary.
    pub async fn run_manifest(
        &self,
        manifest: &Manifest,
        rule: &PairingRule,
        block_size: usize,
        output_dir: &Path,
        on_progress: Option<BlockProgressCallback>,
    ) -> FetchResult<RunSummary> {
        let targets = manifest.targets(rule)?;
        let blocks = partition(targets, block_size)?;
        ensure_dir(output_dir)?;

        info!(
            base = %manifest.base_uri,
            targets = manifest.len(),
            blocks = blocks.len(),
            block_size,
            output = %output_dir.display(),
            "Starting download"
        );

        Ok(self.run_all(blocks, output_dir, on_progress).await)
    }

    /// Download every block in order, one wave at a time.
    ///
    /// `output_dir` must already exist.
    pub async fn run_all(
        &self,
        blocks: Vec<Block>,
        output_dir: &Path,
        on_progress: Option<BlockProgressCallback>,
    ) -> RunSummary {
        let started = Instant::now();
        let total_targets: usize = blocks.iter().map(Block::len).sum();
        let total_blocks = blocks.len();

        let mut summary = RunSummary::new(total_targets, total_blocks);
        self.counters.reset(total_targets);

        for block in blocks {
            let block_number = block.index + 1;
            debug!(block = block_number, targets = block.len(), "Starting block");

            let results = self.run_block(&block, output_dir).await;

            for (target, result) in block.targets.iter().zip(&results) {
                if let DownloadResult::Failed(failed) = result {
                    warn!(
                        relpath = %target.relative_path,
                        leg = %failed.leg,
                        error = %failed.cause,
                        "Target failed"
                    );
                }
                summary.record(target, result);
            }
            summary.blocks_completed += 1;

            info!(
                block = block_number,
                total = total_blocks,
                succeeded = summary.succeeded,
                failed = summary.failure_count(),
                "Block complete"
            );

            if let Some(ref cb) = on_progress {
                cb(BlockProgress {
                    blocks_completed: summary.blocks_completed,
                    total_blocks,
                    targets_completed: summary.succeeded + summary.failure_count(),
                    total_targets,
                });
            }
        }

        summary.elapsed_ms = started.elapsed().as_millis() as u64;
        summary
    }

    /// Fan out one task per target and wait for all of them.
    ///
    /// Results come back in the block's target order regardless of
    /// completion order.
    async fn run_block(&self, block: &Block, output_dir: &Path) -> Vec<DownloadResult> {
        let mut tasks = JoinSet::new();

        for (slot, target) in block.targets.iter().enumerate() {
            let target = target.clone();
            let client = Arc::clone(&self.client);
            let counters = Arc::clone(&self.counters);
            let output_dir = output_dir.to_path_buf();

            tasks.spawn(async move {
                let result = fetch_pair(&target, &output_dir, client.as_ref()).await;
                counters.record(&result);
                (slot, result)
            });
        }

        let mut results: Vec<Option<DownloadResult>> = vec![None; block.len()];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((slot, result)) => results[slot] = Some(result),
                Err(join_err) => {
                    // The slot stays empty and is reported below.
                    warn!(error = %join_err, "Download task panicked");
                }
            }
        }

        results
            .into_iter()
            .map(|result| {
                result.unwrap_or_else(|| {
                    let failed = DownloadResult::Failed(FetchFailed::transport(
                        FetchLeg::Primary,
                        "download task panicked",
                    ));
                    self.counters.record(&failed);
                    failed
                })
            })
            .collect()
    }
}
