//! Index file parsing and fetch target resolution.
//!
//! An index file is a JSON document of the form
//!
//! ```text
//! {"basedir": "https://host/prefix/", "relpaths": ["data/a.mp4", ...]}
//! ```
//!
//! Each relative path names a video. Its action log is found by swapping the
//! video extension for the log extension (see [`PairingRule`]). The base
//! directory is concatenated with each relative path as-is; no escaping or
//! URL validation is done.
//!
//! The document is untrusted input and is only ever deserialized as data.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{FetchLeg, ManifestError, ManifestResult};
use crate::sink::STAGING_SUFFIX;

/// Default extension of the primary (video) file.
pub const DEFAULT_PRIMARY_EXTENSION: &str = ".mp4";

/// Default extension of the companion metadata (action log) file.
pub const DEFAULT_METADATA_EXTENSION: &str = ".jsonl";

/// Parsed index file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// URL prefix every relative path is appended to.
    #[serde(rename = "basedir")]
    pub base_uri: String,

    /// Relative paths of the primary files, in fetch order.
    #[serde(rename = "relpaths")]
    pub relative_paths: Vec<String>,
}

impl Manifest {
    /// Parse an index document.
    ///
    /// When `max_count` is given, only the first `max_count` relative paths
    /// are kept. Repeats of a relative path already listed are then dropped,
    /// keeping the first occurrence.
    pub fn parse(source: &str, max_count: Option<usize>) -> ManifestResult<Self> {
        let mut manifest: Manifest =
            serde_json::from_str(source).map_err(|e| ManifestError::Malformed(e.to_string()))?;

        if let Some(max) = max_count {
            manifest.relative_paths.truncate(max);
        }

        let listed = manifest.relative_paths.len();
        let mut seen = HashSet::with_capacity(listed);
        manifest.relative_paths.retain(|relpath| seen.insert(relpath.clone()));

        let dropped = listed - manifest.relative_paths.len();
        if dropped > 0 {
            warn!(dropped, "Ignoring repeated relative paths in manifest");
        }

        Ok(manifest)
    }

    /// Read and parse an index file from disk.
    pub fn from_path(path: &Path, max_count: Option<usize>) -> ManifestResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&source, max_count)
    }

    /// Number of relative paths in the index.
    pub fn len(&self) -> usize {
        self.relative_paths.len()
    }

    /// Whether the index lists no paths at all.
    pub fn is_empty(&self) -> bool {
        self.relative_paths.is_empty()
    }

    /// Resolve every relative path into a fetch target, preserving order.
    ///
    /// Fails if a path has no file name, or if two targets would touch the
    /// same local file. Staging names (`<name>.part`) count as local files.
    pub fn targets(&self, rule: &PairingRule) -> ManifestResult<Vec<FetchTarget>> {
        let mut seen = HashSet::with_capacity(self.relative_paths.len() * 4);
        let mut targets = Vec::with_capacity(self.relative_paths.len());

        for relpath in &self.relative_paths {
            let target = FetchTarget::new(&self.base_uri, relpath, rule)?;

            for name in [&target.primary_filename, &target.metadata_filename] {
                let staged = format!("{}{}", name, STAGING_SUFFIX);
                if seen.contains(name) || seen.contains(&staged) {
                    return Err(ManifestError::DuplicateFilename { name: name.clone() });
                }
                seen.insert(name.clone());
                seen.insert(staged);
            }

            targets.push(target);
        }

        Ok(targets)
    }
}

/// How a metadata path is derived from a primary path.
///
/// Only the final path segment is rewritten. If it ends with the primary
/// extension, that suffix is replaced; otherwise the metadata extension is
/// appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairingRule {
    pub primary_extension: String,
    pub metadata_extension: String,
}

impl Default for PairingRule {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_EXTENSION, DEFAULT_METADATA_EXTENSION)
    }
}

impl PairingRule {
    pub fn new(primary_extension: impl Into<String>, metadata_extension: impl Into<String>) -> Self {
        Self {
            primary_extension: primary_extension.into(),
            metadata_extension: metadata_extension.into(),
        }
    }

    /// Rewrite `path` (a URL suffix or a file name) into its metadata twin.
    pub fn metadata_path(&self, path: &str) -> String {
        let (dir, name) = split_last_segment(path);
        let stem = name
            .strip_suffix(self.primary_extension.as_str())
            .unwrap_or(name);
        format!("{}{}{}", dir, stem, self.metadata_extension)
    }
}

/// One unit of work: a primary file and its metadata twin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    /// Relative path as listed in the index.
    pub relative_path: String,
    pub primary_url: String,
    pub metadata_url: String,
    /// Local file name of the primary file (basename of the relative path).
    pub primary_filename: String,
    pub metadata_filename: String,
}

impl FetchTarget {
    /// Resolve a single relative path against the base URL.
    pub fn new(base_uri: &str, relative_path: &str, rule: &PairingRule) -> ManifestResult<Self> {
        let (_, basename) = split_last_segment(relative_path);
        if basename.is_empty() || basename == "." || basename == ".." {
            return Err(ManifestError::EmptyFilename {
                relpath: relative_path.to_string(),
            });
        }

        Ok(Self {
            relative_path: relative_path.to_string(),
            primary_url: format!("{}{}", base_uri, relative_path),
            metadata_url: format!("{}{}", base_uri, rule.metadata_path(relative_path)),
            primary_filename: basename.to_string(),
            metadata_filename: rule.metadata_path(basename),
        })
    }

    /// URL fetched for the given leg.
    pub fn url(&self, leg: FetchLeg) -> &str {
        match leg {
            FetchLeg::Primary => &self.primary_url,
            FetchLeg::Metadata => &self.metadata_url,
        }
    }

    /// Local file name written for the given leg.
    pub fn filename(&self, leg: FetchLeg) -> &str {
        match leg {
            FetchLeg::Primary => &self.primary_filename,
            FetchLeg::Metadata => &self.metadata_filename,
        }
    }
}

/// Split `path` into everything up to and including the last `/`, and the rest.
fn split_last_segment(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => path.split_at(idx + 1),
        None => ("", path),
    }
}
