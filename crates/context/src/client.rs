//! HTTP client for the memory backend's search API.
//!
//! The backend may sit behind the same kind of challenge layer as the LLM
//! upstreams, so the client keeps one long-lived `reqwest::Client` with a
//! cookie jar for the process lifetime — never a client per request.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use uuid::Uuid;

use mg_domain::config::MemoryConfig;
use mg_domain::error::{Error, Result};
use mg_domain::trace::TraceEvent;

use crate::types::{SearchRequest, SearchResponse};

/// Typed client for the memory backend.
#[derive(Debug, Clone)]
pub struct MemoryClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl MemoryClient {
    /// Build a client from the memory config. The credential must already
    /// have passed validation (present when retrieval is enabled).
    pub fn new(config: &MemoryConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(key) = config.resolved_api_key() {
            let mut val = HeaderValue::from_str(&format!("Bearer {key}"))
                .map_err(|e| Error::Config(format!("invalid memory API key: {e}")))?;
            val.set_sensitive(true);
            headers.insert(AUTHORIZATION, val);
        }

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("memory client build failed: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            timeout,
        })
    }

    /// The configured per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Search the memory store for context relevant to `query`, scoped to
    /// the given user. Results come back best-match first.
    pub async fn search(&self, req: &SearchRequest) -> Result<SearchResponse> {
        let url = format!("{}/api/memory/search", self.base_url);
        let trace_id = Uuid::new_v4().to_string();

        let start = Instant::now();
        let result = self
            .http
            .post(&url)
            .header("X-Trace-Id", &trace_id)
            .json(req)
            .send()
            .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                TraceEvent::MemoryCall {
                    endpoint: "/api/memory/search".into(),
                    status: 0,
                    duration_ms,
                }
                .emit();
                return Err(from_reqwest(e));
            }
        };

        let status = resp.status();
        TraceEvent::MemoryCall {
            endpoint: "/api/memory/search".into(),
            status: status.as_u16(),
            duration_ms,
        }
        .emit();

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Memory(format!(
                "search returned {}: {body}",
                status.as_u16()
            )));
        }

        let body = resp.text().await.map_err(from_reqwest)?;
        serde_json::from_str(&body)
            .map_err(|e| Error::Memory(format!("failed to parse search response: {e}")))
    }
}

/// Convert a `reqwest::Error` into a domain `Error`.
///
/// Timeout errors become `Error::Timeout`; everything else becomes
/// `Error::Http`.
fn from_reqwest(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout(e.to_string())
    } else {
        Error::Http(e.to_string())
    }
}
