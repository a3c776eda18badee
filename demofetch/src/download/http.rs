//! HTTP client abstraction for testability.
//!
//! Downloads go through the [`HttpClient`] trait so the orchestrator can be
//! driven by an in-memory client in tests. The trait returns boxed futures
//! and streams so it stays dyn-compatible; one `Arc<dyn HttpClient>` is
//! created per run and shared by every download task.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use thiserror::Error;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Transport-level failure: connection, TLS, timeout or body read error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Response body, delivered in chunks as they arrive.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Future returned by [`HttpClient::get`].
pub type ResponseFuture<'a> =
    Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + Send + 'a>>;

/// Status line and streaming body of a GET response.
pub struct HttpResponse {
    pub status: u16,
    pub body: BodyStream,
}

impl HttpResponse {
    /// Whether the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Trait for HTTP client operations.
///
/// Implementations must be safe to share between concurrently running
/// download tasks.
pub trait HttpClient: Send + Sync {
    /// Issue a GET request.
    ///
    /// Returns `Err` only for transport failures; any status code the server
    /// sends back is reported through [`HttpResponse::status`].
    fn get<'a>(&'a self, url: &'a str) -> ResponseFuture<'a>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl ReqwestClient {
    /// Creates a new client with default configuration (no request timeout).
    pub fn new() -> Result<Self, FetchError> {
        Self::from_config(&FetchConfig::default())
    }

    /// Creates a client using the timeout and user agent from `config`.
    pub fn from_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.request_timeout,
        })
    }

    /// Per-request timeout this client was built with.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl HttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> ResponseFuture<'a> {
        Box::pin(async move {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(transport_error)?;

            let status = response.status().as_u16();
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(transport_error));

            Ok(HttpResponse {
                status,
                body: Box::pin(body),
            })
        })
    }
}

fn transport_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError(format!("request timed out: {}", e))
    } else {
        TransportError(e.to_string())
    }
}
