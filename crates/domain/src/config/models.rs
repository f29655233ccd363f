use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Model catalog
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One logical model exposed by the proxy.
///
/// Logical names must be unique across the catalog; validation rejects
/// duplicates at load time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Logical name clients send in the `model` field.
    pub name: String,

    /// Upstream base URL (e.g. `https://api.example.com/v1`).
    pub upstream_base_url: String,

    /// Model identifier sent upstream. Defaults to the logical name.
    #[serde(default)]
    pub upstream_model: Option<String>,

    /// Credential sent as `Authorization: Bearer <key>`.
    /// When neither `api_key` nor `api_key_env` is set, the client's own
    /// Authorization header is forwarded unchanged.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Env var to read the credential from (takes precedence over `api_key`).
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Skip context retrieval for this model even when globally enabled.
    #[serde(default)]
    pub disable_memory: bool,
}

impl ModelConfig {
    /// The model identifier to send upstream.
    pub fn upstream_model(&self) -> &str {
        self.upstream_model.as_deref().unwrap_or(&self.name)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// /v1/models behavior
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Selects what `GET /v1/models` returns.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelsEndpointConfig {
    /// Logical model whose upstream `/models` endpoint is mirrored.
    /// `None` (default) serves the local catalog instead.
    #[serde(default)]
    pub passthrough: Option<String>,
}
