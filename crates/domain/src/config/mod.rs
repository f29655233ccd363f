mod memory;
mod models;
mod routing;
mod server;
mod upstream;

pub use memory::*;
pub use models::*;
pub use routing::*;
pub use server::*;
pub use upstream::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Logical model catalog.
    #[serde(default)]
    pub models: Vec<ModelConfig>,
    #[serde(default)]
    pub models_endpoint: ModelsEndpointConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise return defaults.
    pub fn load_or_default(path: &str) -> Self {
        Self::load(path).unwrap_or_default()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Credential resolution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Resolve a credential from an inline value or an env-var indirection.
///
/// The env var wins when set and non-empty.
pub fn resolve_api_key(inline: Option<&str>, env_var: Option<&str>) -> Option<String> {
    if let Some(var) = env_var {
        if let Ok(val) = std::env::var(var) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    inline.filter(|k| !k.is_empty()).map(str::to_owned)
}

impl ModelConfig {
    /// The credential to attach upstream, if any is configured.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), self.api_key_env.as_deref())
    }
}

impl MemoryConfig {
    /// The memory-backend credential, if any is configured.
    pub fn resolved_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), self.api_key_env.as_deref())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

fn valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Startup aborts on
    /// any `Error`; `Warning`s are logged and tolerated. Invalid routing
    /// regexes are warnings because the resolver discards them at build
    /// time rather than failing requests.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        // Server port must be non-zero.
        if self.server.port == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.port".into(),
                message: "port must be greater than 0".into(),
            });
        }

        // Server host must not be empty.
        if self.server.host.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "server.host".into(),
                message: "host must not be empty".into(),
            });
        }

        self.validate_routing(&mut errors);
        self.validate_models(&mut errors);
        self.validate_memory(&mut errors);

        // CORS: warn if wildcard is used.
        if self.server.cors.allowed_origins.len() == 1
            && self.server.cors.allowed_origins[0] == "*"
        {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" allows all origins (not recommended for production)"
                    .into(),
            });
        }

        errors
    }

    fn validate_routing(&self, errors: &mut Vec<ConfigError>) {
        if self.routing.default_user_id.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "routing.default_user_id".into(),
                message: "default user id must not be empty".into(),
            });
        }

        if self.routing.user_id_header.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "routing.user_id_header".into(),
                message: "user id header name must not be empty".into(),
            });
        }

        if let Some(custom) = &self.routing.custom_header {
            if custom.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: "routing.custom_header".into(),
                    message: "empty custom header name — short-circuit disabled".into(),
                });
            }
        }

        for (i, p) in self.routing.patterns.iter().enumerate() {
            if p.header.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("routing.patterns[{i}].header"),
                    message: "header name must not be empty".into(),
                });
            }
            if p.user_id.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("routing.patterns[{i}].user_id"),
                    message: "user id must not be empty".into(),
                });
            }
            // Bad regexes are discarded at resolver build, never at
            // request time, so they only warrant a warning here.
            if let Err(e) = regex::Regex::new(&p.pattern) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("routing.patterns[{i}].pattern"),
                    message: format!("invalid regex — pattern will be ignored: {e}"),
                });
            }
        }
    }

    fn validate_models(&self, errors: &mut Vec<ConfigError>) {
        if self.models.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "models".into(),
                message: "no models configured — /v1/chat/completions will always 404".into(),
            });
        }

        let mut seen: HashSet<&str> = HashSet::new();

        for (i, model) in self.models.iter().enumerate() {
            if model.name.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("models[{i}].name"),
                    message: "model name must not be empty".into(),
                });
            }
            if !valid_http_url(&model.upstream_base_url) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("models[{i}].upstream_base_url"),
                    message: format!(
                        "must start with http:// or https:// (got \"{}\")",
                        model.upstream_base_url
                    ),
                });
            }
            if !model.name.is_empty() && !seen.insert(&model.name) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: format!("models[{i}].name"),
                    message: format!("duplicate model name \"{}\"", model.name),
                });
            }
            if model.resolved_api_key().is_none() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Warning,
                    field: format!("models[{i}]"),
                    message: format!(
                        "model \"{}\" has no credential — client Authorization will be forwarded as-is",
                        model.name
                    ),
                });
            }
        }

        if let Some(passthrough) = &self.models_endpoint.passthrough {
            if !self.models.iter().any(|m| &m.name == passthrough) {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: "models_endpoint.passthrough".into(),
                    message: format!("references unknown model \"{passthrough}\""),
                });
            }
        }
    }

    fn validate_memory(&self, errors: &mut Vec<ConfigError>) {
        if !self.memory.enabled {
            return;
        }

        if !valid_http_url(&self.memory.base_url) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "memory.base_url".into(),
                message: format!(
                    "must start with http:// or https:// (got \"{}\")",
                    self.memory.base_url
                ),
            });
        }

        if self.memory.resolved_api_key().is_none() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "memory".into(),
                message: "memory retrieval is enabled but no credential is configured".into(),
            });
        }

        if !self.memory.allow_models.is_empty() && !self.memory.deny_models.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "memory".into(),
                message: "allow_models and deny_models are mutually exclusive".into(),
            });
        }

        if self.memory.max_entries == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "memory.max_entries".into(),
                message: "max_entries is 0 — retrieval will never inject anything".into(),
            });
        }

        if self.memory.timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "memory.timeout_ms".into(),
                message: "timeout of 0 disables the backend call deadline".into(),
            });
        }
    }
}
