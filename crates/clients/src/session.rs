//! Scoped client sessions.
//!
//! A [`ClientSession`] is opened right before a delegated call and closed when
//! it is dropped, so the connection handle is released on success, on early
//! return, and on error alike. A shared [`SessionTracker`] counts sessions
//! that are currently open.

use askpanda_core::client::ClientKind;
use askpanda_core::error::ClientError;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Connection parameters of one routing-table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub base_url: String,
    pub timeout: Duration,
}

impl ConnectionParams {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

/// Counts open and total sessions across clones.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    open: Arc<AtomicUsize>,
    opened_total: Arc<AtomicU64>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions currently held.
    pub fn open_sessions(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    /// Sessions ever opened.
    pub fn opened_total(&self) -> u64 {
        self.opened_total.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        self.open.fetch_add(1, Ordering::SeqCst);
        self.opened_total.fetch_add(1, Ordering::SeqCst);
    }

    fn release(&self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An open HTTP connection handle for one delegated call.
pub struct ClientSession {
    kind: ClientKind,
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    tracker: SessionTracker,
}

impl ClientSession {
    /// Build the HTTP client for `params` and register the session with `tracker`.
    pub fn open(
        kind: ClientKind,
        params: &ConnectionParams,
        tracker: &SessionTracker,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(params.timeout)
            .build()
            .map_err(|e| ClientError::SessionFailed {
                client: kind.to_string(),
                reason: e.to_string(),
            })?;

        tracker.acquire();
        tracing::debug!(client = %kind, base_url = %params.base_url, "Client session opened");

        Ok(Self {
            kind,
            base_url: params.base_url.trim_end_matches('/').to_string(),
            timeout: params.timeout,
            http,
            tracker: tracker.clone(),
        })
    }

    pub fn kind(&self) -> ClientKind {
        self.kind
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Join a path onto the session's base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }
}

impl Drop for ClientSession {
    fn drop(&mut self) {
        self.tracker.release();
        tracing::debug!(client = %self.kind, "Client session closed");
    }
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSession")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
