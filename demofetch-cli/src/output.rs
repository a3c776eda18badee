//! Terminal output for the fetch command.
//!
//! Block progress lines and the final summary go to stdout. When stderr is
//! a terminal, a target-level progress bar is drawn there as well.

use std::path::Path;
use std::sync::Arc;

use console::Term;
use demofetch::download::{
    Block, BlockProgress, BlockProgressCallback, ProgressCounters, ProgressReporter, RunSummary,
    TargetFailure, TargetProgress,
};
use demofetch::manifest::Manifest;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::error::CliError;

/// Line printed each time a block finishes.
pub fn block_line(progress: &BlockProgress) -> String {
    format!(
        "Downloaded block {} of {}",
        progress.blocks_completed, progress.total_blocks
    )
}

/// One line per failed target: `relpath: leg leg failed (cause)`.
pub fn failure_line(failure: &TargetFailure) -> String {
    format!(
        "{}: {} leg failed ({})",
        failure.relative_path, failure.error.leg, failure.error.cause
    )
}

/// Progress output for a single run.
pub struct ProgressDisplay {
    bar: Option<ProgressBar>,
}

impl ProgressDisplay {
    /// Draw a bar on stderr only if it is a terminal.
    pub fn new(total_targets: usize) -> Self {
        let bar = (Term::stderr().is_term() && total_targets > 0).then(|| {
            let style = ProgressStyle::with_template(
                "[{elapsed_precise}] {wide_bar} {pos}/{len} targets {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

            let bar =
                ProgressBar::with_draw_target(Some(total_targets as u64), ProgressDrawTarget::stderr());
            bar.set_style(style);
            bar
        });

        Self { bar }
    }

    /// Callback that prints the per-block line above the bar and snaps the
    /// bar to the block's settled target count.
    pub fn block_callback(&self) -> BlockProgressCallback {
        let bar = self.bar.clone();
        Box::new(move |progress: BlockProgress| {
            let line = block_line(&progress);
            match bar {
                Some(ref bar) => {
                    bar.set_length(progress.total_targets as u64);
                    bar.set_position(progress.targets_completed as u64);
                    bar.suspend(|| println!("{}", line));
                }
                None => println!("{}", line),
            }
        })
    }

    /// Poll the downloader's counters into the bar while the run is going.
    ///
    /// Returns `None` when no bar is drawn. Dropping the reporter stops it.
    pub fn start_reporter(&self, counters: Arc<ProgressCounters>) -> Option<ProgressReporter> {
        let bar = self.bar.clone()?;
        Some(ProgressReporter::start_default(
            counters,
            Box::new(move |snap: TargetProgress| {
                bar.set_position(snap.completed as u64);
                if snap.failed > 0 {
                    bar.set_message(format!("({} failed)", snap.failed));
                }
            }),
        ))
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

/// Print the block plan for `--dry-run`.
pub fn print_plan(manifest: &Manifest, blocks: &[Block], output_dir: &Path) {
    let targets: usize = blocks.iter().map(Block::len).sum();
    println!("Base URL:   {}", manifest.base_uri);
    println!("Output dir: {}", output_dir.display());
    println!("Targets:    {}", targets);
    println!("Blocks:     {}", blocks.len());

    for block in blocks {
        println!();
        println!("Block {} of {}", block.index + 1, blocks.len());
        for target in &block.targets {
            println!("  {} -> {}", target.primary_url, target.primary_filename);
            println!("  {} -> {}", target.metadata_url, target.metadata_filename);
        }
    }
}

/// Print the end-of-run summary.
pub fn print_summary(summary: &RunSummary) {
    println!();
    println!(
        "Downloaded {} of {} targets ({}) in {:.1}s",
        summary.succeeded,
        summary.total_targets,
        format_bytes(summary.bytes_written),
        summary.elapsed_ms as f64 / 1000.0
    );

    if summary.has_failures() {
        println!("Failed: {}", summary.failure_count());
        for failure in &summary.failures {
            println!("  {}", failure_line(failure));
        }
    }
}

/// Write the run summary to `path` as pretty-printed JSON.
pub fn write_report(path: &Path, summary: &RunSummary) -> Result<(), CliError> {
    let json = serde_json::to_vec_pretty(summary).map_err(|e| CliError::Report(e.to_string()))?;
    demofetch::sink::write(path, &json)?;
    Ok(())
}

/// Format a byte count with binary units.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
