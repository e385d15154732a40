use super::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GroqClient {
    let config = LlmConfig {
        base_url: format!("{}/openai/v1/", server.uri()),
        timeout_seconds: 5,
        ..LlmConfig::default()
    };
    GroqClient::new(&config, "gsk_test".to_string())
}

#[test]
fn trailing_slash_is_trimmed() {
    let config = LlmConfig {
        base_url: "https://api.groq.com/openai/v1/".to_string(),
        ..LlmConfig::default()
    };
    let client = GroqClient::new(&config, "key".to_string());

    assert_eq!(client.base_url, "https://api.groq.com/openai/v1");
    assert_eq!(client.model_name(), "llama-3.3-70b-versatile");
}

#[tokio::test(flavor = "multi_thread")]
async fn complete_sends_prompt_at_zero_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .and(header("authorization", "Bearer gsk_test"))
        .and(body_partial_json(json!({
            "model": "llama-3.3-70b-versatile",
            "temperature": 0.0,
            "messages": [{ "role": "user", "content": "Question: ping" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "pong" },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = client
        .complete("Question: ping")
        .await
        .expect("completion should succeed");

    assert_eq!(answer, "pong");
}

#[tokio::test(flavor = "multi_thread")]
async fn api_error_message_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "message": "Invalid API Key", "type": "invalid_request_error" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.complete("hello").await;

    match result {
        Err(RagError::Generation(message)) => {
            assert!(message.contains("401"));
            assert!(message.contains("Invalid API Key"));
        }
        other => panic!("expected generation error, got {:?}", other),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_choices_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/openai/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let result = client.complete("hello").await;

    assert!(matches!(result, Err(RagError::Generation(_))));
}
