//! Wire types for the memory backend's search API.

use serde::{Deserialize, Serialize};

/// `POST /api/memory/search` request body.
#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest {
    pub query: String,
    pub user_id: String,
    pub limit: usize,
}

/// `POST /api/memory/search` response body.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<MemoryEntry>,
}

/// One retrieved memory, best match first.
#[derive(Debug, Clone, Deserialize)]
pub struct MemoryEntry {
    pub content: String,
    #[serde(default)]
    pub score: Option<f64>,
}
