//! Output directory handling.
//!
//! Downloads stream into `<name>.part` next to their final name and are
//! renamed into place only once the whole body has been written, so a final
//! file name never holds a truncated body.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::{SinkError, SinkResult};

/// Suffix appended to a file name while its body is still being written.
pub const STAGING_SUFFIX: &str = ".part";

/// Buffer size for streamed writes (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// Create `path` and any missing ancestors.
///
/// Succeeds without doing anything if the directory already exists.
pub fn ensure_dir(path: &Path) -> SinkResult<()> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(SinkError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    fs::create_dir_all(path).map_err(|source| SinkError::DirectoryCreateFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Create or truncate `path` and write all of `bytes` to it.
pub fn write(path: &Path, bytes: &[u8]) -> SinkResult<()> {
    fs::write(path, bytes).map_err(|source| SinkError::WriteFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// Staging path used while `final_path` is being written.
pub fn staging_path(final_path: &Path) -> PathBuf {
    let mut name: OsString = final_path.as_os_str().to_owned();
    name.push(STAGING_SUFFIX);
    PathBuf::from(name)
}

/// A file being streamed to disk under its staging name.
///
/// Call [`StagedFile::commit`] once the body is complete, or
/// [`StagedFile::discard`] to throw the partial body away.
#[derive(Debug)]
pub struct StagedFile {
    final_path: PathBuf,
    staging_path: PathBuf,
    writer: BufWriter<File>,
    bytes_written: u64,
}

impl StagedFile {
    /// Open (create or truncate) the staging file for `final_path`.
    pub async fn create(final_path: &Path) -> SinkResult<Self> {
        let staging_path = staging_path(final_path);
        let file = File::create(&staging_path)
            .await
            .map_err(|source| SinkError::WriteFailed {
                path: staging_path.clone(),
                source,
            })?;

        Ok(Self {
            final_path: final_path.to_path_buf(),
            staging_path,
            writer: BufWriter::with_capacity(BUFFER_SIZE, file),
            bytes_written: 0,
        })
    }

    /// Append a chunk of the body.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> SinkResult<()> {
        self.writer
            .write_all(chunk)
            .await
            .map_err(|source| SinkError::WriteFailed {
                path: self.staging_path.clone(),
                source,
            })?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush, sync to disk and move the file to its final name.
    ///
    /// An existing file at the final name is replaced. On failure the staging
    /// file is removed.
    pub async fn commit(self) -> SinkResult<u64> {
        let StagedFile {
            final_path,
            staging_path,
            mut writer,
            bytes_written,
        } = self;

        let closed = match writer.shutdown().await {
            Ok(()) => writer.get_ref().sync_all().await,
            Err(e) => Err(e),
        };
        drop(writer);
        if let Err(source) = closed {
            remove_quietly(&staging_path).await;
            return Err(SinkError::WriteFailed {
                path: staging_path,
                source,
            });
        }

        if let Err(source) = tokio::fs::rename(&staging_path, &final_path).await {
            remove_quietly(&staging_path).await;
            return Err(SinkError::WriteFailed {
                path: final_path,
                source,
            });
        }

        Ok(bytes_written)
    }

    /// Close and delete the staging file, leaving the final name untouched.
    pub async fn discard(self) {
        let StagedFile {
            staging_path,
            writer,
            ..
        } = self;
        drop(writer);
        remove_quietly(&staging_path).await;
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::debug!(path = %path.display(), error = %e, "Could not remove staging file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_dir_creates_ancestors() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b").join("c");

        ensure_dir(&nested).unwrap();

        assert!(nested.is_dir());
    }

    #[test]
    fn test_ensure_dir_is_idempotent() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("out");

        ensure_dir(&dir).unwrap();
        fs::write(dir.join("keep.txt"), b"x").unwrap();
        ensure_dir(&dir).unwrap();

        assert!(dir.join("keep.txt").exists());
    }

    #[test]
    fn test_ensure_dir_rejects_file() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, b"x").unwrap();

        let err = ensure_dir(&file).unwrap_err();
        assert!(matches!(err, SinkError::NotADirectory { .. }));
    }

    #[test]
    fn test_ensure_dir_below_file_fails() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file");
        fs::write(&file, b"x").unwrap();

        let err = ensure_dir(&file.join("sub")).unwrap_err();
        assert!(matches!(err, SinkError::DirectoryCreateFailed { .. }));
    }

    #[test]
    fn test_write_truncates_existing() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("f.bin");

        write(&path, b"a much longer body").unwrap();
        write(&path, b"short").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"short");
    }

    #[test]
    fn test_staging_path_appends_suffix() {
        assert_eq!(
            staging_path(Path::new("/out/1.mp4")),
            PathBuf::from("/out/1.mp4.part")
        );
    }

    #[tokio::test]
    async fn test_staged_file_commit_moves_into_place() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("1.mp4");

        let mut staged = StagedFile::create(&path).await.unwrap();
        staged.write_chunk(b"hello ").await.unwrap();
        staged.write_chunk(b"world").await.unwrap();
        assert!(!path.exists());
        assert_eq!(staged.bytes_written(), 11);

        let written = staged.commit().await.unwrap();

        assert_eq!(written, 11);
        assert_eq!(fs::read(&path).unwrap(), b"hello world");
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn test_staged_file_commit_replaces_existing() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("1.jsonl");
        fs::write(&path, b"old contents that are longer").unwrap();

        let mut staged = StagedFile::create(&path).await.unwrap();
        staged.write_chunk(b"new").await.unwrap();
        staged.commit().await.unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_staged_file_commit_empty_body() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("empty.jsonl");

        let staged = StagedFile::create(&path).await.unwrap();
        let written = staged.commit().await.unwrap();

        assert_eq!(written, 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(!staging_path(&path).exists());
    }

    #[tokio::test]
    async fn test_staged_file_discard_leaves_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("2.mp4");

        let mut staged = StagedFile::create(&path).await.unwrap();
        staged.write_chunk(b"partial").await.unwrap();
        staged.discard().await;

        assert!(!path.exists());
        assert!(!staging_path(&path).exists());
    }
}
