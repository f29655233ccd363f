//! The retrieval preflight: eligibility → query extraction → backend
//! search → bounded concatenation → injection.

use mg_domain::chat::ChatMessage;
use mg_domain::config::{MemoryConfig, ModelConfig};
use mg_domain::error::Result;
use mg_domain::trace::TraceEvent;

use crate::client::MemoryClient;
use crate::extract::extract_query;
use crate::inject::{assemble_context, inject};
use crate::types::SearchRequest;

/// Fetches and injects per-user context ahead of the upstream call.
///
/// Constructed once at startup when retrieval is enabled; the inner
/// [`MemoryClient`] keeps its own persistent session to the backend.
pub struct ContextRetriever {
    client: MemoryClient,
    config: MemoryConfig,
}

impl ContextRetriever {
    pub fn new(config: MemoryConfig) -> Result<Self> {
        let client = MemoryClient::new(&config)?;
        Ok(Self { client, config })
    }

    /// Whether retrieval applies to the given logical model name.
    ///
    /// An allow-list admits only its members; a deny-list excludes its
    /// members; with neither, every model is eligible. Validation
    /// guarantees the lists are never both non-empty.
    pub fn model_eligible(&self, model: &str) -> bool {
        if !self.config.allow_models.is_empty() {
            return self.config.allow_models.iter().any(|m| m == model);
        }
        if !self.config.deny_models.is_empty() {
            return !self.config.deny_models.iter().any(|m| m == model);
        }
        true
    }

    /// Enrich `messages` with retrieved context, or return them unchanged.
    ///
    /// Never fails: ineligible model, no extractable query, backend
    /// errors, and empty results all degrade to the original list.
    pub async fn maybe_inject(
        &self,
        messages: Vec<ChatMessage>,
        user_id: &str,
        model: &ModelConfig,
    ) -> Vec<ChatMessage> {
        if model.disable_memory {
            self.skip(&model.name, "disabled for model");
            return messages;
        }
        if !self.model_eligible(&model.name) {
            self.skip(&model.name, "model not eligible");
            return messages;
        }

        let query = match extract_query(self.config.query_strategy, &messages) {
            Some(q) if !q.is_empty() => q,
            _ => {
                self.skip(&model.name, "no query available");
                return messages;
            }
        };

        let req = SearchRequest {
            query,
            user_id: user_id.to_owned(),
            limit: self.config.max_entries,
        };

        let resp = match self.client.search(&req).await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(
                    user_id = %user_id,
                    model = %model.name,
                    error = %e,
                    "context retrieval failed — continuing without injection"
                );
                return messages;
            }
        };

        let entries: Vec<String> = resp
            .results
            .into_iter()
            .map(|r| r.content.trim().to_owned())
            .filter(|c| !c.is_empty())
            .collect();

        if entries.is_empty() {
            self.skip(&model.name, "no results");
            return messages;
        }

        let context = assemble_context(
            &entries,
            self.config.max_entries,
            self.config.max_injected_chars,
            &self.config.separator,
        );
        if context.is_empty() {
            self.skip(&model.name, "results exceed injection budget");
            return messages;
        }

        TraceEvent::ContextInjected {
            user_id: user_id.to_owned(),
            entries: entries.len(),
            injected_chars: context.len(),
            strategy: format!("{:?}", self.config.injection_strategy),
        }
        .emit();

        inject(self.config.injection_strategy, messages, &context)
    }

    fn skip(&self, model: &str, reason: &str) {
        TraceEvent::ContextSkipped {
            model: model.to_owned(),
            reason: reason.to_owned(),
        }
        .emit();
    }
}
