//! demofetch CLI - download paired demonstration videos and action logs.

mod error;
mod fetch;
mod output;
mod runner;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use demofetch::logging::LogOptions;

use fetch::FetchArgs;
use runner::Overrides;

#[derive(Debug, Parser)]
#[command(name = "demofetch")]
#[command(version = demofetch::VERSION)]
#[command(about = "Download paired video/action-log files listed in an index", long_about = None)]
struct Cli {
    /// Index file: JSON with `basedir` and `relpaths`
    #[arg(long, value_name = "PATH")]
    manifest: PathBuf,

    /// Directory the files are written to (created if missing)
    #[arg(long, value_name = "DIR")]
    output_dir: PathBuf,

    /// Only fetch the first N entries of the index
    #[arg(long, value_name = "N")]
    max_count: Option<usize>,

    /// Targets downloaded concurrently per block [default: 100]
    #[arg(long, value_name = "N")]
    block_size: Option<usize>,

    /// Per-request timeout in seconds, 0 for none [default: none]
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// INI config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Write the run summary as JSON to this file
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Print the resolved targets and blocks without downloading
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl From<Cli> for FetchArgs {
    fn from(cli: Cli) -> Self {
        FetchArgs {
            manifest: cli.manifest,
            output_dir: cli.output_dir,
            max_count: cli.max_count,
            overrides: Overrides {
                block_size: cli.block_size,
                timeout: cli.timeout,
            },
            config: cli.config,
            report: cli.report,
            dry_run: cli.dry_run,
            log: LogOptions {
                verbosity: cli.verbose,
                log_file: cli.log_file,
                use_color: console::colors_enabled_stderr(),
            },
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = fetch::run(cli.into()) {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}
