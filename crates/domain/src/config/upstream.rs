use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Upstream sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Tuning for the persistent per-upstream HTTP sessions.
///
/// The response timeout must cover slow LLM generations, so it is
/// measured in minutes rather than seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Total response timeout per upstream request (seconds).
    #[serde(default = "d_response_timeout_secs")]
    pub response_timeout_secs: u64,

    /// TCP connect timeout (seconds).
    #[serde(default = "d_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Keep-alive connections retained per upstream host.
    #[serde(default = "d_pool_max_idle")]
    pub pool_max_idle_per_host: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            response_timeout_secs: d_response_timeout_secs(),
            connect_timeout_secs: d_connect_timeout_secs(),
            pool_max_idle_per_host: d_pool_max_idle(),
        }
    }
}

fn d_response_timeout_secs() -> u64 {
    600
}
fn d_connect_timeout_secs() -> u64 {
    10
}
fn d_pool_max_idle() -> usize {
    32
}
