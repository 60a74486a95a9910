//! Backend client tests against a mock HTTP server.

use murmur_core::api::BackendClient;
use murmur_core::config::BackendConfig;
use murmur_core::convo::Reward;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> BackendClient {
    BackendClient::new(&BackendConfig {
        base_url: server.uri(),
    })
    .expect("build client")
}

#[tokio::test]
async fn test_fetch_history_returns_decoded_messages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(query_param("conversation", "conv-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": [
                {"role": "user", "text_content": [{"type": "message", "content": "hi"}]},
                {
                    "role": "llm",
                    "text_content": [{"type": "message", "content": "hello"}],
                    "text_uid": "m-1",
                    "reward": "good"
                }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let messages = client_for(&server).fetch_history("conv-1").await;

    assert_eq!(messages.len(), 2);
    let assistant = messages[1].as_assistant().expect("llm entry");
    assert_eq!(assistant.uid.as_deref(), Some("m-1"));
    assert_eq!(assistant.reward, Some(Reward::Good));
}

#[tokio::test]
async fn test_fetch_history_degrades_to_empty_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(client_for(&server).fetch_history("conv-1").await.is_empty());
}

#[tokio::test]
async fn test_fetch_history_degrades_to_empty_on_garbage_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json at all"))
        .mount(&server)
        .await;

    assert!(client_for(&server).fetch_history("conv-1").await.is_empty());
}

#[tokio::test]
async fn test_send_reward_succeeds_on_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reward"))
        .and(body_string_contains("conv-1"))
        .and(body_string_contains("m-1"))
        .and(body_string_contains("bad"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let result = client_for(&server)
        .send_reward("conv-1", "m-1", Reward::Bad)
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_send_reward_fails_on_non_200() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reward"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let result = client_for(&server)
        .send_reward("conv-1", "m-1", Reward::Good)
        .await;
    assert!(result.is_err(), "anything but 200 is not an acknowledgement");
}

#[tokio::test]
async fn test_fetch_image_by_uid_is_conversation_scoped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/image/img-42"))
        .and(query_param("conversation", "conv-1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"\x89PNG".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = client_for(&server)
        .fetch_image("conv-1", "img-42")
        .await
        .expect("image bytes");
    assert_eq!(bytes.as_ref(), b"\x89PNG");
}
