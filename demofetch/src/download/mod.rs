//! Batch download engine.
//!
//! This module provides:
//! - Splitting targets into fixed-size blocks (`block`)
//! - The HTTP client seam and its reqwest implementation (`http`)
//! - Fetching one target's primary and metadata files (`pair`)
//! - Block-by-block orchestration with a completion barrier (`orchestrator`)
//! - Block and target progress reporting (`progress`)
//! - Per-target outcomes and run totals (`summary`)
//!
//! # Architecture
//!
//! ```text
//! BatchDownloader (orchestrator)
//!         │
//!         ├── partition() ──► Block, Block, ...        (one wave each)
//!         │
//!         ├── per block: JoinSet ──► fetch_pair() x N  (primary, then metadata)
//!         │                               │
//!         │                               ├── Arc<dyn HttpClient>
//!         │                               └── sink::StagedFile
//!         │
//!         ├── ProgressCounters (atomic, per target)
//!         │
//!         └── RunSummary + BlockProgress callback (after each barrier)
//! ```

mod block;
mod http;
mod orchestrator;
mod pair;
mod progress;
mod summary;

pub use block::{partition, Block};
pub use http::{BodyStream, HttpClient, HttpResponse, ReqwestClient, ResponseFuture, TransportError};
pub use orchestrator::BatchDownloader;
pub use pair::fetch_pair;
pub use progress::{
    BlockProgress, BlockProgressCallback, ProgressCounters, ProgressReporter, TargetProgress,
    TargetProgressCallback,
};
pub use summary::{DownloadResult, RunSummary, TargetFailure};
