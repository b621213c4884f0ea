// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for the course catalog backend.
//!
//! Provides a trait-based backend layer that enables:
//! - Real HTTP calls against the catalog server for production
//! - Mock backends for unit testing

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use sb_core::{Course, Fields, ServerId};

/// Error type for backend operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete in time.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The server answered with a non-2xx status.
    #[error("server returned {code}: {message}")]
    Status { code: u16, message: String },

    /// Headers arrived but the body could not be read.
    #[error("response body failed: {0}")]
    Body(String),

    /// The body was read but is not what the endpoint should return.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Returns true for a 404 response.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransportError::Status { code: 404, .. })
    }

    /// Returns true if the failure says the server is unreachable rather
    /// than that it rejected the request.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TransportError::Timeout(_)
            | TransportError::ConnectionFailed(_)
            | TransportError::Body(_) => true,
            TransportError::Status { code, .. } => matches!(code, 502..=504),
            TransportError::Decode(_) => false,
        }
    }
}

/// Result type for backend operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by [`Backend`] methods.
pub type TransportFuture<'a, T> = Pin<Box<dyn Future<Output = TransportResult<T>> + Send + 'a>>;

/// The catalog server as seen by the engine.
///
/// This trait abstracts over the actual HTTP client, allowing for easy
/// testing with mock implementations.
pub trait Backend: Send + Sync {
    /// GET a health endpoint. Succeeds only on a 2xx status with a body
    /// that was read to the end.
    fn health(&self, endpoint: String) -> TransportFuture<'_, ()>;

    /// GET the record collection.
    fn list(&self, query: Vec<(String, String)>) -> TransportFuture<'_, Vec<Course>>;

    /// POST a new record. The server assigns its id.
    fn create(&self, record: Fields) -> TransportFuture<'_, Course>;

    /// PUT a partial update. Returns the updated record when the server
    /// echoes one.
    fn update(&self, id: ServerId, patch: Fields) -> TransportFuture<'_, Option<Course>>;

    /// DELETE a record.
    fn delete(&self, id: ServerId) -> TransportFuture<'_, ()>;
}

/// Expected shape of an error body.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP backend using reqwest.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    records_path: String,
}

impl HttpBackend {
    /// Creates a backend for the server at `base_url`.
    ///
    /// `request_timeout` bounds every call; probes apply their own shorter
    /// per-endpoint bound on top.
    pub fn new(
        base_url: &str,
        records_path: &str,
        request_timeout: Duration,
    ) -> TransportResult<Self> {
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(CONNECT_TIMEOUT.min(request_timeout))
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::ConnectionFailed(format!("failed to build client: {e}")))?;

        Ok(HttpBackend {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            records_path: format!("/{}", records_path.trim_matches('/')),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn records_url(&self) -> String {
        self.url(&self.records_path)
    }

    fn record_url(&self, id: ServerId) -> String {
        format!("{}/{}", self.records_url(), id)
    }
}

impl Backend for HttpBackend {
    fn health(&self, endpoint: String) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let response = self.client.get(self.url(&endpoint)).send().await.map_err(map_http_error)?;
            let response = check_status(response).await?;
            // Drain the body: headers alone do not prove the server is healthy.
            response.bytes().await.map_err(|e| TransportError::Body(e.to_string()))?;
            Ok(())
        })
    }

    fn list(&self, query: Vec<(String, String)>) -> TransportFuture<'_, Vec<Course>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.records_url())
                .query(&query)
                .send()
                .await
                .map_err(map_http_error)?;
            decode(check_status(response).await?).await
        })
    }

    fn create(&self, record: Fields) -> TransportFuture<'_, Course> {
        Box::pin(async move {
            let response = self
                .client
                .post(self.records_url())
                .json(&record)
                .send()
                .await
                .map_err(map_http_error)?;
            decode(check_status(response).await?).await
        })
    }

    fn update(&self, id: ServerId, patch: Fields) -> TransportFuture<'_, Option<Course>> {
        Box::pin(async move {
            let response = self
                .client
                .put(self.record_url(id))
                .json(&patch)
                .send()
                .await
                .map_err(map_http_error)?;
            let body = check_status(response)
                .await?
                .bytes()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;
            if body.iter().all(u8::is_ascii_whitespace) {
                return Ok(None);
            }
            serde_json::from_slice(&body).map(Some).map_err(|e| TransportError::Decode(e.to_string()))
        })
    }

    fn delete(&self, id: ServerId) -> TransportFuture<'_, ()> {
        Box::pin(async move {
            let response =
                self.client.delete(self.record_url(id)).send().await.map_err(map_http_error)?;
            check_status(response).await?.bytes().await.map_err(|e| TransportError::Body(e.to_string()))?;
            Ok(())
        })
    }
}

/// Maps a non-2xx response to [`TransportError::Status`], pulling the
/// message out of a `{ "message": ... }` body when there is one.
async fn check_status(response: Response) -> TransportResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|b| b.message)
        .unwrap_or_else(|_| default_message(status, &text));
    Err(TransportError::Status { code: status.as_u16(), message })
}

fn default_message(status: StatusCode, text: &str) -> String {
    let text = text.trim();
    if !text.is_empty() && text.len() <= 200 {
        return text.to_string();
    }
    status.canonical_reason().unwrap_or("unknown error").to_string()
}

async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> TransportResult<T> {
    let body = response.bytes().await.map_err(|e| TransportError::Body(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
}

fn map_http_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else if error.is_body() || error.is_decode() {
        TransportError::Body(error.to_string())
    } else {
        TransportError::ConnectionFailed(error.to_string())
    }
}
