use serde::Serialize;

/// Structured trace events emitted across all MemGate crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    UserResolved {
        user_id: String,
        matched: String,
    },
    SessionCreated {
        base_url: String,
    },
    MemoryCall {
        endpoint: String,
        status: u16,
        duration_ms: u64,
    },
    ContextInjected {
        user_id: String,
        entries: usize,
        injected_chars: usize,
        strategy: String,
    },
    ContextSkipped {
        model: String,
        reason: String,
    },
    UpstreamRequest {
        model: String,
        base_url: String,
        status: u16,
        duration_ms: u64,
        streaming: bool,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "mg_event");
    }
}
