//! Persistent per-upstream HTTP sessions.
//!
//! The upstreams this proxy fronts sit behind challenge layers that hand
//! out a clearance cookie on the first request. A fresh client per request
//! would re-trigger the challenge every time, so the pool keeps exactly
//! one [`UpstreamSession`] per base URL for the process lifetime: its
//! cookie jar, TLS state, and keep-alive connections accumulate across
//! every request routed through it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use mg_domain::config::UpstreamConfig;
use mg_domain::error::{Error, Result};
use mg_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One long-lived outbound HTTP client, bound to a single upstream.
///
/// Cookie state is shared by every request through this session; the
/// underlying `reqwest::Client` synchronizes jar and pool access.
#[derive(Debug)]
pub struct UpstreamSession {
    base_url: String,
    http: reqwest::Client,
}

impl UpstreamSession {
    fn new(base_url: String, config: &UpstreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(config.response_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| Error::Config(format!("upstream client build failed: {e}")))?;

        Ok(Self { base_url, http })
    }

    /// The normalized base URL this session is bound to (no trailing `/`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying client, for issuing requests.
    pub fn client(&self) -> &reqwest::Client {
        &self.http
    }

    /// Build the full URL for a path like `/chat/completions`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Pool
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Owns every [`UpstreamSession`], one per distinct base URL.
///
/// Lookups take the read lock; creating a session for a previously-unseen
/// URL takes the write lock and re-checks, so concurrent first requests
/// can never produce duplicates.
pub struct SessionPool {
    config: UpstreamConfig,
    sessions: RwLock<HashMap<String, Arc<UpstreamSession>>>,
}

impl SessionPool {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            config,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The persistent session for `base_url`, created on first use.
    ///
    /// Returns the same `Arc` for every caller passing the same URL
    /// (modulo trailing-slash normalization).
    pub fn get(&self, base_url: &str) -> Result<Arc<UpstreamSession>> {
        let key = base_url.trim_end_matches('/');

        if let Some(session) = self.sessions.read().get(key) {
            return Ok(session.clone());
        }

        let mut sessions = self.sessions.write();
        // Re-check: another caller may have won the race.
        if let Some(session) = sessions.get(key) {
            return Ok(session.clone());
        }

        let session = Arc::new(UpstreamSession::new(key.to_owned(), &self.config)?);
        sessions.insert(key.to_owned(), session.clone());

        TraceEvent::SessionCreated {
            base_url: key.to_owned(),
        }
        .emit();

        Ok(session)
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    /// Drop every session, releasing connections and cookie state.
    /// Called once at process shutdown.
    pub fn shutdown(&self) {
        let mut sessions = self.sessions.write();
        let count = sessions.len();
        sessions.clear();
        tracing::info!(sessions = count, "session pool drained");
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Error conversion helper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> SessionPool {
        SessionPool::new(UpstreamConfig::default())
    }

    #[tokio::test]
    async fn same_url_returns_same_session() {
        let pool = pool();
        let a = pool.get("https://api.example.com/v1").unwrap();
        let b = pool.get("https://api.example.com/v1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 1);
    }

    #[tokio::test]
    async fn trailing_slash_normalized_to_one_session() {
        let pool = pool();
        let a = pool.get("https://api.example.com/v1/").unwrap();
        let b = pool.get("https://api.example.com/v1").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.base_url(), "https://api.example.com/v1");
    }

    #[tokio::test]
    async fn distinct_urls_get_distinct_sessions() {
        let pool = pool();
        let a = pool.get("https://api.example.com/v1").unwrap();
        let b = pool.get("https://other.example.com/v1").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(pool.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_first_requests_create_one_session() {
        let pool = Arc::new(pool());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                pool.get("https://api.example.com/v1").unwrap()
            }));
        }
        let sessions: Vec<_> = futures_join(handles).await;
        assert_eq!(pool.len(), 1);
        for s in &sessions[1..] {
            assert!(Arc::ptr_eq(&sessions[0], s));
        }
    }

    #[tokio::test]
    async fn shutdown_drains_the_pool() {
        let pool = pool();
        pool.get("https://api.example.com/v1").unwrap();
        pool.get("https://other.example.com/v1").unwrap();
        pool.shutdown();
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn url_joins_base_and_path() {
        let pool = pool();
        let session = pool.get("https://api.example.com/v1").unwrap();
        assert_eq!(
            session.url("/chat/completions"),
            "https://api.example.com/v1/chat/completions"
        );
    }

    async fn futures_join(
        handles: Vec<tokio::task::JoinHandle<Arc<UpstreamSession>>>,
    ) -> Vec<Arc<UpstreamSession>> {
        let mut out = Vec::with_capacity(handles.len());
        for h in handles {
            out.push(h.await.unwrap());
        }
        out
    }
}
