// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tests for the Ollama adapter against a faked HTTP API.

use recall_config::RecallConfig;
use recall_core::{
    ContextEntry, ContextSource, EmbeddingAdapter, EmbeddingInput, ErrorKind, GenerationAdapter,
    GenerationRequest, HealthStatus, PluginAdapter, Role,
};
use recall_ollama::OllamaClient;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OllamaClient {
    let mut config = RecallConfig::default();
    config.ollama.base_url = server.uri();
    config.ollama.request_timeout_secs = 5;
    OllamaClient::new(&config).unwrap()
}

fn input(texts: &[&str]) -> EmbeddingInput {
    EmbeddingInput {
        texts: texts.iter().map(|t| t.to_string()).collect(),
    }
}

#[tokio::test]
async fn embed_posts_model_and_inputs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_partial_json(serde_json::json!({
            "model": "all-minilm",
            "input": ["first", "second"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "all-minilm",
            "embeddings": [[0.1, 0.2, 0.3], [0.4, 0.5, 0.6]]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = client_for(&server)
        .embed(input(&["first", "second"]))
        .await
        .unwrap();

    assert_eq!(output.dimensions, 3);
    assert_eq!(output.embeddings.len(), 2);
    assert_eq!(output.embeddings[1], vec![0.4, 0.5, 0.6]);
}

#[tokio::test]
async fn embed_rejects_a_short_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embeddings": [[0.1, 0.2]]
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .embed(input(&["a", "b"]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmbeddingFailure);
}

#[tokio::test]
async fn embed_http_error_is_an_embedding_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": "model \"all-minilm\" not found, try pulling it first"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server).embed(input(&["a"])).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EmbeddingFailure);
    assert!(err.to_string().contains("not found"), "got: {err}");
}

#[tokio::test]
async fn chat_sends_non_streaming_request_and_returns_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(serde_json::json!({
            "model": "llama3.1:8b",
            "stream": false,
            "options": {"temperature": 0.5},
            "messages": [
                {"role": "system", "content": "be brief"},
                {"role": "user", "content": "hello"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "model": "llama3.1:8b",
            "message": {"role": "assistant", "content": "hi!"},
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = RecallConfig::default();
    config.ollama.base_url = server.uri();
    config.ollama.temperature = 0.5;
    let client = OllamaClient::new(&config).unwrap();

    let reply = client
        .generate(GenerationRequest {
            system_prompt: Some("be brief".into()),
            entries: vec![ContextEntry {
                role: Role::User,
                content: "hello".into(),
                source: ContextSource::Recent {
                    message_id: "m1".into(),
                },
            }],
        })
        .await
        .unwrap();

    assert_eq!(reply, "hi!");
}

#[tokio::test]
async fn chat_server_error_is_a_generation_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .generate(GenerationRequest {
            system_prompt: None,
            entries: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::GenerationFailure);
    assert!(err.to_string().contains("500"), "got: {err}");
}

#[tokio::test]
async fn unreachable_server_maps_to_capability_errors() {
    let mut config = RecallConfig::default();
    // Nothing listens on port 9 (discard) in the test environment.
    config.ollama.base_url = "http://127.0.0.1:9".into();
    let client = OllamaClient::new(&config).unwrap();

    let embed_err = client.embed(input(&["x"])).await.unwrap_err();
    assert_eq!(embed_err.kind(), ErrorKind::EmbeddingFailure);

    let gen_err = client
        .generate(GenerationRequest {
            system_prompt: None,
            entries: Vec::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(gen_err.kind(), ErrorKind::GenerationFailure);

    assert!(matches!(
        client.health_check().await.unwrap(),
        HealthStatus::Unhealthy(_)
    ));
}

#[tokio::test]
async fn health_check_uses_tags_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tags"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"models": []})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.health_check().await.unwrap(), HealthStatus::Healthy);
    assert_eq!(client.name(), "ollama");
}
