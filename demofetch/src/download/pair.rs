//! Fetching a single target: the primary file, then its metadata twin.

use std::path::Path;

use futures::StreamExt;
use tracing::{debug, trace};

use super::http::HttpClient;
use super::summary::DownloadResult;
use crate::error::{FetchCause, FetchFailed, FetchLeg, SinkError};
use crate::manifest::FetchTarget;
use crate::sink::StagedFile;

/// Download both files of `target` into `output_dir`.
///
/// The metadata leg is only attempted once the primary leg has succeeded.
/// On success exactly two files exist in `output_dir` under the target's
/// file names. A failed leg leaves no file behind for that leg; a primary
/// file that was already written stays in place if the metadata leg fails.
pub async fn fetch_pair(
    target: &FetchTarget,
    output_dir: &Path,
    client: &dyn HttpClient,
) -> DownloadResult {
    let primary_bytes = match fetch_leg(target, FetchLeg::Primary, output_dir, client).await {
        Ok(bytes) => bytes,
        Err(failed) => return DownloadResult::Failed(failed),
    };

    let metadata_bytes = match fetch_leg(target, FetchLeg::Metadata, output_dir, client).await {
        Ok(bytes) => bytes,
        Err(failed) => return DownloadResult::Failed(failed),
    };

    DownloadResult::Success {
        primary_bytes,
        metadata_bytes,
    }
}

/// GET one URL and stream its body into the output directory.
async fn fetch_leg(
    target: &FetchTarget,
    leg: FetchLeg,
    output_dir: &Path,
    client: &dyn HttpClient,
) -> Result<u64, FetchFailed> {
    let url = target.url(leg);
    let dest = output_dir.join(target.filename(leg));
    debug!(url = %url, leg = %leg, "Requesting");

    let response = client
        .get(url)
        .await
        .map_err(|e| FetchFailed::transport(leg, e.0))?;

    if !response.is_success() {
        return Err(FetchFailed::status(leg, response.status));
    }

    let mut file = StagedFile::create(&dest)
        .await
        .map_err(|e| write_failure(leg, e))?;
    let mut body = response.body;

    while let Some(chunk) = body.next().await {
        let written = match chunk {
            Ok(bytes) => file
                .write_chunk(&bytes)
                .await
                .map_err(|e| write_failure(leg, e)),
            Err(e) => Err(FetchFailed::transport(leg, e.0)),
        };

        if let Err(failed) = written {
            trace!(
                path = %dest.display(),
                bytes = file.bytes_written(),
                "Discarding partial body"
            );
            file.discard().await;
            return Err(failed);
        }
    }

    let bytes = file.commit().await.map_err(|e| write_failure(leg, e))?;
    debug!(path = %dest.display(), bytes, "Saved");
    Ok(bytes)
}

fn write_failure(leg: FetchLeg, err: SinkError) -> FetchFailed {
    FetchFailed::new(leg, FetchCause::Io(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::http::tests::{MockHttpClient, MockRoute};
    use crate::manifest::PairingRule;
    use crate::sink::staging_path;

    const BASE: &str = "https://example.test/";

    fn target(relpath: &str) -> FetchTarget {
        FetchTarget::new(BASE, relpath, &PairingRule::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_pair_writes_both_files() {
        let temp = tempfile::tempdir().unwrap();
        let client = MockHttpClient::new()
            .body("https://example.test/a/1.mp4", b"video-bytes")
            .body("https://example.test/a/1.jsonl", b"{\"t\":0}\n");

        let result = fetch_pair(&target("a/1.mp4"), temp.path(), &client).await;

        assert_eq!(
            result,
            DownloadResult::Success {
                primary_bytes: 11,
                metadata_bytes: 8
            }
        );
        assert_eq!(std::fs::read(temp.path().join("1.mp4")).unwrap(), b"video-bytes");
        assert_eq!(
            std::fs::read(temp.path().join("1.jsonl")).unwrap(),
            b"{\"t\":0}\n"
        );
    }

    #[tokio::test]
    async fn test_primary_404_skips_metadata() {
        let temp = tempfile::tempdir().unwrap();
        let client = MockHttpClient::new()
            .route("https://example.test/a/2.mp4", MockRoute::Status(404))
            .body("https://example.test/a/2.jsonl", b"{}");

        let result = fetch_pair(&target("a/2.mp4"), temp.path(), &client).await;

        assert_eq!(
            result,
            DownloadResult::Failed(FetchFailed::status(FetchLeg::Primary, 404))
        );
        assert_eq!(client.requests(), vec!["GET https://example.test/a/2.mp4"]);
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_metadata_failure_keeps_primary() {
        let temp = tempfile::tempdir().unwrap();
        let client = MockHttpClient::new()
            .body("https://example.test/3.mp4", b"v")
            .route("https://example.test/3.jsonl", MockRoute::Status(503));

        let result = fetch_pair(&target("3.mp4"), temp.path(), &client).await;

        assert_eq!(
            result,
            DownloadResult::Failed(FetchFailed::status(FetchLeg::Metadata, 503))
        );
        assert!(temp.path().join("3.mp4").exists());
        assert!(!temp.path().join("3.jsonl").exists());
    }

    #[tokio::test]
    async fn test_transport_error_on_primary() {
        let temp = tempfile::tempdir().unwrap();
        let client = MockHttpClient::new().route(
            "https://example.test/4.mp4",
            MockRoute::Refuse("connection refused".into()),
        );

        let result = fetch_pair(&target("4.mp4"), temp.path(), &client).await;

        assert_eq!(
            result,
            DownloadResult::Failed(FetchFailed::transport(
                FetchLeg::Primary,
                "connection refused"
            ))
        );
    }

    #[tokio::test]
    async fn test_mid_stream_error_leaves_no_file() {
        let temp = tempfile::tempdir().unwrap();
        let client = MockHttpClient::new().route(
            "https://example.test/5.mp4",
            MockRoute::BreakAfter(b"half a video".to_vec(), "connection reset".into()),
        );

        let result = fetch_pair(&target("5.mp4"), temp.path(), &client).await;

        assert!(matches!(
            result,
            DownloadResult::Failed(FetchFailed {
                leg: FetchLeg::Primary,
                cause: FetchCause::Transport(_)
            })
        ));
        let dest = temp.path().join("5.mp4");
        assert!(!dest.exists());
        assert!(!staging_path(&dest).exists());
    }

    #[tokio::test]
    async fn test_missing_output_dir_is_write_failure() {
        let temp = tempfile::tempdir().unwrap();
        let client = MockHttpClient::new().body("https://example.test/6.mp4", b"v");

        let result = fetch_pair(&target("6.mp4"), &temp.path().join("absent"), &client).await;

        assert!(matches!(
            result,
            DownloadResult::Failed(FetchFailed {
                leg: FetchLeg::Primary,
                cause: FetchCause::Io(_)
            })
        ));
    }

    #[tokio::test]
    async fn test_refetch_overwrites_identically() {
        let temp = tempfile::tempdir().unwrap();
        let client = MockHttpClient::new()
            .body("https://example.test/7.mp4", b"same bytes")
            .body("https://example.test/7.jsonl", b"same log");

        let first = fetch_pair(&target("7.mp4"), temp.path(), &client).await;
        let second = fetch_pair(&target("7.mp4"), temp.path(), &client).await;

        assert!(first.is_success());
        assert_eq!(first, second);
        assert_eq!(std::fs::read(temp.path().join("7.mp4")).unwrap(), b"same bytes");
        assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 2);
    }
}
