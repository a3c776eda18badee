//! Fetch command - download every pair listed in an index file.

use std::path::PathBuf;
use std::sync::Arc;

use demofetch::download::{partition, BatchDownloader, ReqwestClient};
use demofetch::logging::LogOptions;
use demofetch::manifest::Manifest;
use tracing::{info, warn};

use crate::error::{CliError, EXIT_INTERRUPTED};
use crate::output::{self, ProgressDisplay};
use crate::runner::{CliRunner, Overrides};

/// Arguments for the fetch command.
pub struct FetchArgs {
    pub manifest: PathBuf,
    pub output_dir: PathBuf,
    pub max_count: Option<usize>,
    pub overrides: Overrides,
    pub config: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub dry_run: bool,
    pub log: LogOptions,
}

/// Run the fetch command.
///
/// Returns `Ok` once every block has been attempted, whether or not some
/// targets failed.
pub fn run(args: FetchArgs) -> Result<(), CliError> {
    let mut runner = CliRunner::new(&args.log, args.config.as_deref())?;
    runner.apply(&args.overrides);
    runner.log_startup();
    let config = runner.config();

    let manifest = Manifest::from_path(&args.manifest, args.max_count)?;

    if args.dry_run {
        let targets = manifest.targets(&config.pairing)?;
        let blocks = partition(targets, config.block_size)?;
        output::print_plan(&manifest, &blocks, &args.output_dir);
        return Ok(());
    }

    install_interrupt_handler()?;

    let client = ReqwestClient::from_config(config)?;
    let downloader = BatchDownloader::new(Arc::new(client));
    let display = ProgressDisplay::new(manifest.len());
    let runtime = runner.runtime()?;

    let reporter = display.start_reporter(downloader.counters());
    let result = runtime.block_on(downloader.run_manifest(
        &manifest,
        &config.pairing,
        config.block_size,
        &args.output_dir,
        Some(display.block_callback()),
    ));
    drop(reporter);
    display.finish();

    let summary = result?;
    output::print_summary(&summary);

    if let Some(ref path) = args.report {
        output::write_report(path, &summary)?;
        info!(path = %path.display(), "Report written");
    }

    info!(
        succeeded = summary.succeeded,
        failed = summary.failure_count(),
        elapsed_ms = summary.elapsed_ms,
        "Run finished"
    );
    Ok(())
}

/// Ctrl-C abandons in-flight downloads and exits with 130.
fn install_interrupt_handler() -> Result<(), CliError> {
    ctrlc::set_handler(|| {
        warn!("Interrupted, abandoning in-flight downloads");
        eprintln!();
        eprintln!("Interrupted");
        std::process::exit(EXIT_INTERRUPTED);
    })
    .map_err(|e| CliError::SignalHandler(e.to_string()))
}
