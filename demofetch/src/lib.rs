//! demofetch - bounded batch fetcher for paired demonstration datasets
//!
//! An index file names a base URL and a list of relative paths. Each path is
//! a video whose action log lives next to it under the same stem with a
//! different extension. This library resolves that index into fetch targets,
//! splits them into fixed-size blocks, and downloads each block concurrently
//! before moving on to the next, so the number of open connections never
//! exceeds the block size.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use demofetch::download::{BatchDownloader, ReqwestClient};
//! use demofetch::manifest::{Manifest, PairingRule};
//!
//! let manifest = Manifest::from_path("index.json".as_ref(), Some(10))?;
//! let client = Arc::new(ReqwestClient::new()?);
//! let downloader = BatchDownloader::new(client);
//!
//! let summary = downloader
//!     .run_manifest(&manifest, &PairingRule::default(), 100, "out".as_ref(), None)
//!     .await?;
//! println!("{} of {} succeeded", summary.succeeded, summary.total_targets);
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod manifest;
pub mod sink;

/// Crate version, as recorded in Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
