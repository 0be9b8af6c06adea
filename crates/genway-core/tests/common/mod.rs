//! Local fake provider for integration tests

#![allow(dead_code)]

use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Json;
use genway_core::{
    CandidateSpec, GatewayConfig, PreferenceTable, ProviderEntry, ProviderRegistry,
    StaticCredentials, WireFormat,
};
use genway_core::providers::TierModels;
use serde_json::{Value, json};
use std::sync::Arc;

pub const OPENAI_KEY: &str = "sk-test-openai-0123456789";
pub const ANTHROPIC_KEY: &str = "sk-ant-test-0123456789";

/// Start the fake provider and return its root URL
pub async fn spawn_fake_provider() -> String {
    let app = Router::new()
        .route("/ok/v1/chat/completions", post(openai_ok))
        .route("/ok/v1/messages", post(anthropic_ok))
        .route("/fail/v1/chat/completions", post(failing))
        .route("/fail/v1/messages", post(failing))
        .route("/garbled/v1/chat/completions", post(garbled))
        .route("/empty/v1/chat/completions", post(empty));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn event_stream(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"message": "bad credentials"}})),
    )
        .into_response()
}

async fn openai_ok(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let expected = format!("Bearer {}", OPENAI_KEY);
    if headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) != Some(expected.as_str()) {
        return unauthorized();
    }
    let model = body["model"].as_str().unwrap_or_default().to_string();

    if body["stream"].as_bool().unwrap_or(false) {
        let mut out = String::new();
        out.push_str("data: {\"choices\":[{\"delta\":{\"role\":\"assistant\"}}]}\n\n");
        for token in ["Hello", " from ", &model] {
            let chunk = json!({"choices": [{"delta": {"content": token}}]});
            out.push_str(&format!("data: {}\n\n", chunk));
        }
        out.push_str("data: [DONE]\n\n");
        return event_stream(out);
    }

    Json(json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": format!("```\nHello from {}\n```", model)},
            "finish_reason": "stop"
        }]
    }))
    .into_response()
}

async fn anthropic_ok(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let key = headers.get("x-api-key").and_then(|v| v.to_str().ok());
    let version = headers.get("anthropic-version").and_then(|v| v.to_str().ok());
    if key != Some(ANTHROPIC_KEY) || version.is_none() {
        return unauthorized();
    }
    if body["system"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, "system prompt missing").into_response();
    }
    let model = body["model"].as_str().unwrap_or_default().to_string();

    if body["stream"].as_bool().unwrap_or(false) {
        let events = [
            ("message_start", json!({"type": "message_start", "message": {"id": "msg_1"}})),
            ("ping", json!({"type": "ping"})),
            (
                "content_block_delta",
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": "Claude"}}),
            ),
            (
                "content_block_delta",
                json!({"type": "content_block_delta", "index": 0, "delta": {"type": "text_delta", "text": " says hi"}}),
            ),
            ("message_stop", json!({"type": "message_stop"})),
        ];
        let out: String = events
            .iter()
            .map(|(name, data)| format!("event: {}\ndata: {}\n\n", name, data))
            .collect();
        return event_stream(out);
    }

    Json(json!({
        "id": "msg_1",
        "type": "message",
        "role": "assistant",
        "model": model,
        "content": [{"type": "text", "text": "Claude says hi"}],
        "stop_reason": "end_turn"
    }))
    .into_response()
}

async fn failing() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": {"message": "upstream exploded", "api_key": OPENAI_KEY}})),
    )
        .into_response()
}

async fn garbled() -> Response {
    Json(json!({"result": "not a chat completion"})).into_response()
}

async fn empty() -> Response {
    Json(json!({"choices": [{"message": {"content": ""}}]})).into_response()
}

/// Provider entry pointing at `root` with the given behaviour prefix
pub fn entry(id: &str, root: &str, mode: &str, wire: WireFormat, key_env: &str) -> ProviderEntry {
    let model = format!("{}-model", id);
    ProviderEntry::new(id, format!("{}/{}/v1", root, mode), wire)
        .with_api_key_env(key_env)
        .with_models(TierModels {
            fast: Some(model.clone()),
            smart: Some(model.clone()),
            quality: Some(model),
        })
}

pub fn credentials() -> Arc<StaticCredentials> {
    Arc::new(
        StaticCredentials::new()
            .with("OPENAI_API_KEY", OPENAI_KEY)
            .with("ANTHROPIC_API_KEY", ANTHROPIC_KEY),
    )
}

/// Config whose smart tier tries `openai` then `anthropic`, with an
/// unreachable baseline
pub fn config(providers: Vec<ProviderEntry>) -> GatewayConfig {
    let mut all = providers;
    all.push(
        ProviderEntry::new("ollama", "http://127.0.0.1:9/v1", WireFormat::OpenAiChat)
            .without_api_key(),
    );
    GatewayConfig {
        providers: all,
        preferences: PreferenceTable {
            fast: vec![CandidateSpec::new("openai", None)],
            smart: vec![
                CandidateSpec::new("openai", None),
                CandidateSpec::new("anthropic", None),
            ],
            quality: vec![CandidateSpec::new("anthropic", None)],
        },
        baseline: CandidateSpec::new("ollama", Some("llama3.1")),
        ..GatewayConfig::default()
    }
}

pub fn registry(config: &GatewayConfig) -> Arc<ProviderRegistry> {
    Arc::new(ProviderRegistry::new(config.providers.clone(), credentials()))
}
