//! Command-line interface for the `memgate` binary.

use clap::{Parser, Subcommand};

use mg_domain::config::{Config, ConfigSeverity};

/// MemGate — a memory-routing proxy for OpenAI-compatible backends.
#[derive(Debug, Parser)]
#[command(name = "memgate", version, about)]
pub struct Cli {
    /// Path to the TOML config file.
    #[arg(long, default_value = "memgate.toml")]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the proxy server (default when no subcommand is given).
    Serve,
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    /// Credentials are redacted.
    Show,
}

/// Load the config, falling back to defaults when the file is absent.
pub fn load_config(path: &str) -> Config {
    match Config::load(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "config not loaded — using defaults");
            Config::default()
        }
    }
}

/// Parse and validate the config, printing any issues.
///
/// Returns false when errors are found.
pub fn validate(config: &Config, config_path: &str) -> bool {
    let issues = config.validate();

    if issues.is_empty() {
        println!("Config OK ({config_path})");
        return true;
    }

    let error_count = issues
        .iter()
        .filter(|e| e.severity == ConfigSeverity::Error)
        .count();
    let warning_count = issues.len() - error_count;

    for issue in &issues {
        println!("{issue}");
    }

    println!("\n{error_count} error(s), {warning_count} warning(s) in {config_path}");

    error_count == 0
}

/// Dump the resolved config (with all defaults filled in) as TOML,
/// credentials masked.
pub fn show(config: &Config) {
    match toml::to_string_pretty(&redacted(config)) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Failed to serialize config: {e}");
            std::process::exit(1);
        }
    }
}

fn redacted(config: &Config) -> Config {
    let mut config = config.clone();
    if config.memory.api_key.is_some() {
        config.memory.api_key = Some("•••".into());
    }
    for model in &mut config.models {
        if model.api_key.is_some() {
            model.api_key = Some("•••".into());
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_domain::config::ModelConfig;

    #[test]
    fn redaction_masks_credentials() {
        let mut config = Config::default();
        config.memory.api_key = Some("mk-secret".into());
        config.models.push(ModelConfig {
            name: "gpt-4".into(),
            upstream_base_url: "https://api.example.com/v1".into(),
            upstream_model: None,
            api_key: Some("sk-secret".into()),
            api_key_env: None,
            disable_memory: false,
        });

        let masked = redacted(&config);
        assert_eq!(masked.memory.api_key.as_deref(), Some("•••"));
        assert_eq!(masked.models[0].api_key.as_deref(), Some("•••"));

        let dumped = toml::to_string_pretty(&masked).unwrap();
        assert!(!dumped.contains("secret"));
    }

    #[test]
    fn redaction_leaves_absent_keys_alone() {
        let masked = redacted(&Config::default());
        assert!(masked.memory.api_key.is_none());
    }
}
