use mg_domain::config::{Config, InjectionStrategy, QueryStrategy};

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 4000);
}

#[test]
fn default_routing_headers() {
    let config = Config::default();
    assert_eq!(config.routing.custom_header.as_deref(), Some("x-sm-user-id"));
    assert_eq!(config.routing.user_id_header, "x-sm-user-id");
    assert_eq!(config.routing.default_user_id, "default-user");
}

#[test]
fn full_config_parses() {
    let toml_str = r#"
[server]
host = "0.0.0.0"
port = 8080

[routing]
custom_header = "x-sm-user-id"
default_user_id = "anonymous"

[[routing.patterns]]
header = "user-agent"
pattern = "OpenAIClientImpl/Java"
user_id = "pycharm-ai"

[[models]]
name = "gpt-4"
upstream_base_url = "https://api.example.com/v1"
upstream_model = "gpt-4-0613"
api_key = "sk-test"

[[models]]
name = "local-llama"
upstream_base_url = "http://localhost:11434/v1"
disable_memory = true

[memory]
enabled = true
base_url = "https://memory.example.com"
api_key = "mk-test"
query_strategy = "last-user-message"
injection_strategy = "prepend-as-system-message"
max_entries = 3
max_injected_chars = 2000
timeout_ms = 1500
deny_models = ["local-llama"]
"#;
    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.routing.patterns.len(), 1);
    assert_eq!(config.routing.patterns[0].user_id, "pycharm-ai");
    assert_eq!(config.models.len(), 2);
    assert_eq!(config.models[0].upstream_model(), "gpt-4-0613");
    assert_eq!(config.models[1].upstream_model(), "local-llama");
    assert!(config.models[1].disable_memory);
    assert!(config.memory.enabled);
    assert_eq!(config.memory.query_strategy, QueryStrategy::LastUserMessage);
    assert_eq!(
        config.memory.injection_strategy,
        InjectionStrategy::PrependAsSystemMessage
    );
    assert_eq!(config.memory.deny_models, vec!["local-llama"]);
    assert!(config.validate().is_empty());
}

#[test]
fn strategy_spellings_round_trip() {
    for (text, strategy) in [
        ("last-user-message", QueryStrategy::LastUserMessage),
        ("first-user-message", QueryStrategy::FirstUserMessage),
        ("all-user-messages-joined", QueryStrategy::AllUserMessagesJoined),
        ("last-assistant-message", QueryStrategy::LastAssistantMessage),
    ] {
        let parsed: QueryStrategy =
            serde_json::from_value(serde_json::Value::String(text.into())).unwrap();
        assert_eq!(parsed, strategy);
    }
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memgate.toml");
    std::fs::write(&path, "[server]\nport = 9999\n").unwrap();
    let config = Config::load(path.to_str().unwrap()).unwrap();
    assert_eq!(config.server.port, 9999);
}

#[test]
fn load_missing_file_falls_back_to_defaults() {
    let config = Config::load_or_default("/definitely/not/a/real/path.toml");
    assert_eq!(config.server.port, 4000);
    assert!(config.models.is_empty());
}
