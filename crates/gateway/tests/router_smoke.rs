//! Router-level tests for everything that resolves locally: health,
//! routing diagnostics, the model catalog, and the error envelopes.
//! None of these paths reach an upstream — the configured base URL is
//! unresolvable, so an accidental upstream call would surface as a 502
//! instead of the asserted status.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use mg_domain::config::{Config, ModelConfig, UserPatternConfig};
use mg_gateway::api;
use mg_gateway::models::ModelRegistry;
use mg_gateway::state::AppState;
use mg_sessions::{SessionPool, UserResolver};

fn test_config() -> Config {
    let mut config = Config::default();
    config.routing.patterns.push(UserPatternConfig {
        header: "user-agent".into(),
        pattern: "OpenAIClientImpl/Java".into(),
        user_id: "pycharm-ai".into(),
    });
    config.models.push(ModelConfig {
        name: "gpt-4".into(),
        upstream_base_url: "https://api.invalid/v1".into(),
        upstream_model: None,
        api_key: Some("sk-test".into()),
        api_key_env: None,
        disable_memory: false,
    });
    config
}

fn app() -> axum::Router {
    let config = Arc::new(test_config());
    let state = AppState {
        resolver: Arc::new(UserResolver::from_config(&config.routing)),
        models: Arc::new(ModelRegistry::from_config(&config.models)),
        pool: Arc::new(SessionPool::new(config.upstream.clone())),
        retriever: None,
        config,
    };
    api::router().with_state(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_healthy() {
    let response = app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json, serde_json::json!({"status": "healthy"}));
}

#[tokio::test]
async fn routing_info_reports_pattern_match() {
    let response = app()
        .oneshot(
            Request::get("/memory-routing/info")
                .header("user-agent", "OpenAIClientImpl/Java")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json,
        serde_json::json!({
            "user_id": "pycharm-ai",
            "matched": "pattern",
            "matched_pattern": {
                "header": "user-agent",
                "pattern": "OpenAIClientImpl/Java",
                "user_id": "pycharm-ai"
            },
            "custom_header_present": false,
            "is_default": false
        })
    );
}

#[tokio::test]
async fn routing_info_custom_header_wins() {
    let response = app()
        .oneshot(
            Request::get("/memory-routing/info")
                .header("user-agent", "OpenAIClientImpl/Java")
                .header("x-sm-user-id", "alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["user_id"], "alice");
    assert_eq!(json["matched"], "custom-header");
    assert_eq!(json["matched_pattern"], Value::Null);
    assert_eq!(json["custom_header_present"], true);
}

#[tokio::test]
async fn routing_info_default_fallback() {
    let response = app()
        .oneshot(
            Request::get("/memory-routing/info")
                .header("user-agent", "curl/8.4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_json(response).await;
    assert_eq!(json["user_id"], "default-user");
    assert_eq!(json["matched"], "default");
    assert_eq!(json["is_default"], true);
}

#[tokio::test]
async fn models_lists_local_catalog() {
    let response = app()
        .oneshot(Request::get("/v1/models").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["object"], "list");
    assert_eq!(json["data"][0]["id"], "gpt-4");
    assert_eq!(json["data"][0]["object"], "model");
}

#[tokio::test]
async fn unknown_model_is_404_with_envelope() {
    let body = r#"{"model":"gpt-9","messages":[{"role":"user","content":"hi"}]}"#;
    let response = app()
        .oneshot(
            Request::post("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "not_found_error");
    assert_eq!(json["error"]["code"], "model_not_found");
}

#[tokio::test]
async fn invalid_json_is_400() {
    let response = app()
        .oneshot(
            Request::post("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "invalid_request_error");
    assert_eq!(json["error"]["code"], "invalid_json");
}

#[tokio::test]
async fn missing_model_field_is_400() {
    let response = app()
        .oneshot(
            Request::post("/v1/chat/completions")
                .header("content-type", "application/json")
                .body(Body::from(r#"{"messages":[]}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "missing_field");
}

#[tokio::test]
async fn content_length_mismatch_is_400() {
    let body = r#"{"model":"gpt-4"}"#; // 17 bytes
    let response = app()
        .oneshot(
            Request::post("/v1/chat/completions")
                .header("content-type", "application/json")
                .header("content-length", "10")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["type"], "invalid_request_error");
    assert_eq!(json["error"]["code"], "content_length_mismatch");
}

#[tokio::test]
async fn empty_body_with_zero_content_length_is_400() {
    let response = app()
        .oneshot(
            Request::post("/v1/chat/completions")
                .header("content-type", "application/json")
                .header("content-length", "0")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // Content-Length agrees with the body, so the JSON parse is what fails.
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "invalid_json");
}

#[tokio::test]
async fn unknown_path_gets_enveloped_404() {
    let response = app()
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "unknown_endpoint");
}

#[tokio::test]
async fn wrong_method_gets_enveloped_405() {
    let response = app()
        .oneshot(Request::get("/v1/chat/completions").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "method_not_allowed");
}
