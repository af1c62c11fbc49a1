//! HTTP-level tests for `HttpTransport` and `CompletionClient`.
//!
//! Uses [`wiremock`] to stand up a local OpenAI-compatible server, exercising
//! status classification, auth headers and model rotation over real HTTP.

use std::sync::Arc;
use std::time::Duration;

use reia_client::transport::{ChatTransport, HttpTransport};
use reia_client::{ClientError, CompletionClient, RetryPolicy};
use reia_models::chat::{ChatMessage, ChatRequest};
use reia_models::config::ApiConfig;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api(server: &MockServer, preferred: &[&str]) -> ApiConfig {
    ApiConfig {
        base_url: server.uri(),
        preferred_models: preferred.iter().map(|m| m.to_string()).collect(),
        fallback_models: vec![],
        request_timeout_seconds: 1,
        models_timeout_seconds: 1,
        ..ApiConfig::default()
    }
}

fn transport(server: &MockServer, preferred: &[&str]) -> HttpTransport {
    HttpTransport::new(&api(server, preferred), "gsk-test-key".to_string()).unwrap()
}

fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "model": "llama-3.3-70b-versatile",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 12, "completion_tokens": 4, "total_tokens": 16}
    })
}

fn request(model: &str) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::user("hello")],
        temperature: 0.7,
        max_tokens: 2000,
    }
}

async fn mount_models(server: &MockServer, ids: &[&str]) {
    let data: Vec<_> = ids.iter().map(|id| json!({"id": id, "object": "model"})).collect();
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": "list", "data": data})))
        .mount(server)
        .await;
}

#[tokio::test]
async fn send_success_with_bearer_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("Authorization", "Bearer gsk-test-key"))
        .and(body_partial_json(json!({"model": "m1", "max_tokens": 2000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server, &["m1"]).send(&request("m1")).await.unwrap();
    assert_eq!(response.content(), Some("hi there"));
}

#[tokio::test]
async fn list_models_parses_ids() {
    let server = MockServer::start().await;
    mount_models(&server, &["m1", "m2"]).await;

    let models = transport(&server, &[]).list_models().await.unwrap();
    assert_eq!(models, vec!["m1".to_string(), "m2".to_string()]);
}

#[tokio::test]
async fn status_429_reads_retry_after_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3"))
        .mount(&server)
        .await;

    let err = transport(&server, &["m1"]).send(&request("m1")).await.unwrap_err();
    match err {
        ClientError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(3)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn status_429_with_unrepresentable_hint_is_plain_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1e30"))
        .mount(&server)
        .await;

    let err = transport(&server, &["m1"]).send(&request("m1")).await.unwrap_err();
    assert!(matches!(err, ClientError::RateLimited { retry_after: None }));
}

#[tokio::test]
async fn status_429_without_hint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("Too Many Requests"))
        .mount(&server)
        .await;

    let err = transport(&server, &["m1"]).send(&request("m1")).await.unwrap_err();
    assert!(matches!(err, ClientError::RateLimited { retry_after: None }));
}

#[tokio::test]
async fn status_400_is_model_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"message": "The model `m1` has been decommissioned", "code": "model_decommissioned"}
        })))
        .mount(&server)
        .await;

    let err = transport(&server, &["m1"]).send(&request("m1")).await.unwrap_err();
    match err {
        ClientError::ModelUnavailable { model, status, body } => {
            assert_eq!(model, "m1");
            assert_eq!(status, 400);
            assert!(body.contains("decommissioned"));
        }
        other => panic!("expected ModelUnavailable, got {other:?}"),
    }
}

#[tokio::test]
async fn status_401_is_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = transport(&server, &["m1"]).send(&request("m1")).await.unwrap_err();
    assert!(matches!(err, ClientError::Unauthorized(_)));
}

#[tokio::test]
async fn status_500_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let err = transport(&server, &["m1"]).send(&request("m1")).await.unwrap_err();
    match err {
        ClientError::Transport(msg) => assert!(msg.contains("503")),
        other => panic!("expected Transport, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_success_body_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = transport(&server, &["m1"]).send(&request("m1")).await.unwrap_err();
    assert!(matches!(err, ClientError::InvalidResponse(_)));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion_body("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = transport(&server, &["m1"]).send(&request("m1")).await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(1)));
}

#[tokio::test]
async fn client_rotates_past_rejected_model_over_http() {
    let server = MockServer::start().await;
    mount_models(&server, &["m1", "m2"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "m1"})))
        .respond_with(ResponseTemplate::new(400).set_body_string("model_not_found"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "m2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("from m2")))
        .expect(1)
        .mount(&server)
        .await;

    let config = api(&server, &["m1", "m2"]);
    let transport = HttpTransport::new(&config, "gsk-test-key".to_string()).unwrap();
    let mut client = CompletionClient::new(
        Arc::new(transport),
        &config,
        RetryPolicy::new(3, Duration::from_millis(10)),
    );

    let response = client
        .send_completion(&[ChatMessage::user("hello")], None)
        .await
        .unwrap();
    assert_eq!(response.content(), Some("from m2"));
}

#[tokio::test]
async fn client_waits_out_rate_limit_over_http() {
    let server = MockServer::start().await;
    mount_models(&server, &["m1", "m2"]).await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": "m1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("after wait")))
        .expect(1)
        .mount(&server)
        .await;

    let config = api(&server, &["m1", "m2"]);
    let transport = HttpTransport::new(&config, "gsk-test-key".to_string()).unwrap();
    let mut client = CompletionClient::new(Arc::new(transport), &config, RetryPolicy::default());

    let response = client
        .send_completion(&[ChatMessage::user("hello")], None)
        .await
        .unwrap();
    assert_eq!(response.content(), Some("after wait"));
}

#[tokio::test]
async fn unreachable_catalog_falls_back_to_configured_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = ApiConfig {
        fallback_models: vec!["m2".to_string()],
        ..api(&server, &["m1", "m2"])
    };
    let transport = HttpTransport::new(&config, "gsk-test-key".to_string()).unwrap();
    let mut client = CompletionClient::new(Arc::new(transport), &config, RetryPolicy::default());

    assert_eq!(client.available_models().await, &["m2".to_string()]);
    assert!(client.catalog_is_fallback());
}
