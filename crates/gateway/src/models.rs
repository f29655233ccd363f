//! The logical model catalog, built once from config.

use std::collections::HashMap;
use std::sync::Arc;

use mg_domain::config::ModelConfig;

/// One resolved catalog entry: the model config plus its credential,
/// read from the environment exactly once at startup.
#[derive(Debug)]
pub struct ModelEntry {
    pub config: ModelConfig,
    /// `None` means pass the client's own Authorization through.
    pub api_key: Option<String>,
}

impl ModelEntry {
    /// Upstream base URL, normalized (no trailing `/`).
    pub fn base_url(&self) -> &str {
        self.config.upstream_base_url.trim_end_matches('/')
    }

    /// The model identifier to send upstream.
    pub fn upstream_model(&self) -> &str {
        self.config.upstream_model()
    }
}

/// Logical name → [`ModelEntry`]. Immutable after startup; validation
/// guarantees unique names.
pub struct ModelRegistry {
    models: HashMap<String, Arc<ModelEntry>>,
}

impl ModelRegistry {
    pub fn from_config(models: &[ModelConfig]) -> Self {
        let models = models
            .iter()
            .map(|m| {
                let entry = ModelEntry {
                    config: m.clone(),
                    api_key: m.resolved_api_key(),
                };
                (m.name.clone(), Arc::new(entry))
            })
            .collect();
        Self { models }
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelEntry>> {
        self.models.get(name).cloned()
    }

    /// Logical names, sorted for stable listing.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
