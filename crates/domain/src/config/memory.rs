use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Memory backend (context retrieval)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Connection and behavior of the context-retrieval preflight.
///
/// Retrieval is an enhancement: any backend failure is logged and the
/// request proceeds with the original messages. `allow_models` and
/// `deny_models` are mutually exclusive; validation enforces this.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the memory backend REST API.
    #[serde(default = "d_base_url")]
    pub base_url: String,

    /// Credential sent as `Authorization: Bearer <key>`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Env var to read the credential from (takes precedence over `api_key`).
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// How the search query is extracted from the message list.
    #[serde(default)]
    pub query_strategy: QueryStrategy,

    /// How retrieved context is placed into the message list.
    #[serde(default)]
    pub injection_strategy: InjectionStrategy,

    /// Max entries taken from the backend result list.
    #[serde(default = "d_max_entries")]
    pub max_entries: usize,

    /// Char cap on the concatenated injected context.
    #[serde(default = "d_max_injected_chars")]
    pub max_injected_chars: usize,

    /// Separator between concatenated entries.
    #[serde(default = "d_separator")]
    pub separator: String,

    /// Per-request timeout for the backend call.
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,

    /// Only these logical models are eligible. Empty = no allow-list.
    #[serde(default)]
    pub allow_models: Vec<String>,

    /// These logical models are never eligible. Empty = no deny-list.
    #[serde(default)]
    pub deny_models: Vec<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: d_base_url(),
            api_key: None,
            api_key_env: None,
            query_strategy: QueryStrategy::default(),
            injection_strategy: InjectionStrategy::default(),
            max_entries: d_max_entries(),
            max_injected_chars: d_max_injected_chars(),
            separator: d_separator(),
            timeout_ms: d_timeout_ms(),
            allow_models: Vec::new(),
            deny_models: Vec::new(),
        }
    }
}

/// Which message the search query is extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum QueryStrategy {
    /// Content of the last `user` message (skip retrieval if none).
    #[default]
    LastUserMessage,
    /// Content of the first `user` message.
    FirstUserMessage,
    /// All `user` message contents joined with `" | "`.
    AllUserMessagesJoined,
    /// Content of the last `assistant` message (skip retrieval if none).
    LastAssistantMessage,
}

/// Where retrieved context lands in the outgoing message list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum InjectionStrategy {
    /// New `system` message inserted at position 0.
    #[default]
    PrependAsSystemMessage,
    /// First user message becomes `<context>\n\n<original>`.
    PrefixFirstUserMessage,
    /// Last user message becomes `<original>\n\n<context>`.
    SuffixLastUserMessage,
}

fn d_base_url() -> String {
    "http://localhost:8765".into()
}
fn d_max_entries() -> usize {
    5
}
fn d_max_injected_chars() -> usize {
    4_000
}
fn d_separator() -> String {
    "\n\n".into()
}
fn d_timeout_ms() -> u64 {
    3_000
}
