//! Integration tests for the OpenAI-compatible provider
//!
//! Runs the provider against a wiremock server to verify the request it sends
//! and how upstream failures are classified.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tripgenie::config::ApiKey;
use tripgenie::llm::{
    CompletionSettings, LlmGateway, OpenAiCompatibleProvider, ProviderError,
    TextCompletionProvider,
};
use tripgenie::metrics::Metrics;
use tripgenie::middleware::RequestId;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> CompletionSettings {
    CompletionSettings {
        model: "llama-3.3-70b-versatile".to_string(),
        temperature: 0.7,
        max_tokens: 2048,
    }
}

fn provider(server: &MockServer) -> OpenAiCompatibleProvider {
    OpenAiCompatibleProvider::new("groq", &format!("{}/v1", server.uri()), ApiKey::new("test-key"))
        .expect("provider should build")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn test_sends_bearer_auth_and_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "max_tokens": 2048,
            "messages": [{"role": "user", "content": "Plan a day in Kochi"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"days\":[]}")))
        .expect(1)
        .mount(&server)
        .await;

    let text = provider(&server)
        .complete("Plan a day in Kochi", &settings())
        .await;
    let text = assert_ok!(text);
    assert_eq!(text, "{\"days\":[]}");
}

#[tokio::test]
async fn test_non_success_status_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = assert_err!(provider(&server).complete("hi", &settings()).await);
    match err {
        ProviderError::Status {
            provider,
            status,
            body,
        } => {
            assert_eq!(provider, "groq");
            assert_eq!(status, 401);
            assert_eq!(body, "invalid api key");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn test_long_error_body_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("x".repeat(5_000)))
        .mount(&server)
        .await;

    let err = provider(&server)
        .complete("hi", &settings())
        .await
        .unwrap_err();
    let ProviderError::Status { body, .. } = err else {
        panic!("expected Status, got {err:?}");
    };
    assert!(body.chars().count() <= 300, "body kept {} chars", body.len());
}

#[tokio::test]
async fn test_missing_content_is_empty_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = provider(&server)
        .complete("hi", &settings())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ProviderError::EmptyCompletion {
            provider: "groq".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_request_error() {
    let provider =
        OpenAiCompatibleProvider::new("openai", "http://127.0.0.1:1/v1", ApiKey::new("k"))
            .unwrap();
    let err = provider.complete("hi", &settings()).await.unwrap_err();
    assert!(matches!(err, ProviderError::Request { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_gateway_times_out_slow_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("{}"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let gateway = LlmGateway::new(
        Arc::new(provider(&server)),
        settings(),
        Duration::from_secs(1),
        Arc::new(Metrics::new().unwrap()),
    );

    let err = gateway.complete("hi", RequestId::new()).await.unwrap_err();
    assert_eq!(
        err,
        ProviderError::Timeout {
            provider: "groq".to_string(),
            timeout_seconds: 1,
        }
    );
}
