use ollama_chat::{
    json, Chat, ChatError, ClientConfig, ModelClientError, Role, ToolRegistry, Transport,
};
use pretty_assertions::assert_eq;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn reply(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3.2",
        "created_at": "2024-06-01T12:00:00Z",
        "message": {"role": "assistant", "content": content},
        "done": true,
        "done_reason": "stop",
        "eval_count": 20,
        "eval_duration": 1_000_000_000u64
    })
}

#[tokio::test]
async fn send_posts_to_api_chat() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama3.2",
            "stream": false,
            "keep_alive": "5m",
            "messages": [
                {"role": "system", "content": "Be brief"},
                {"role": "user", "content": "Hi"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("Hello!")))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = Chat::builder()
        .set_model("llama3.2")
        .set_base_url(server.uri())
        .set_system_prompt("Be brief")
        .build()
        .unwrap();

    let response = chat.send("Hi").await.unwrap();
    assert_eq!(response.content(), "Hello!");
    assert_eq!(response.tokens_per_second(), Some(20.0));
    assert_eq!(chat.messages().len(), 3);
    assert_eq!(chat.messages()[2].role(), Role::Assistant);
}

#[tokio::test]
async fn extra_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("ok")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ClientConfig::default()
        .base_url(format!("{}/", server.uri()))
        .extra_header("x-api-key", "secret")
        .build()
        .unwrap();

    let body = client
        .post("/api/chat", json!({"model": "m", "messages": []}))
        .await
        .unwrap();
    assert_eq!(body["message"]["content"], "ok");
}

#[tokio::test]
async fn error_field_maps_to_api_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "model 'nope' not found"})),
        )
        .mount(&server)
        .await;

    let mut chat = Chat::builder()
        .set_model("nope")
        .set_base_url(server.uri())
        .build()
        .unwrap();

    let err = chat.send("Hi").await.unwrap_err();
    match err {
        ChatError::ModelClient(ModelClientError::Api(message)) => {
            assert!(message.contains("model 'nope' not found"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // The user turn stays; no assistant reply was recorded.
    assert_eq!(chat.messages().len(), 1);
}

#[tokio::test]
async fn garbage_body_maps_to_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let client = ClientConfig::default().base_url(server.uri()).build().unwrap();
    let err = client.post("/api/chat", json!({})).await.unwrap_err();
    assert!(matches!(err, ModelClientError::Serialization(_)), "{err:?}");
}

#[tokio::test]
async fn unreachable_server_maps_to_request_error() {
    let client = ClientConfig::default()
        .base_url("http://127.0.0.1:1")
        .build()
        .unwrap();
    let err = client.post("/api/chat", json!({})).await.unwrap_err();
    assert!(matches!(err, ModelClientError::Request(_)), "{err:?}");
}

#[tokio::test]
async fn tool_loop_round_trips_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama3.2",
            "created_at": "2024-06-01T12:00:00Z",
            "message": {
                "role": "assistant",
                "content": "",
                "tool_calls": [{
                    "id": "call_1",
                    "function": {"name": "string_length", "arguments": {"text": "hello"}}
                }]
            },
            "done": true
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [
                {"role": "user"},
                {"role": "assistant"},
                {"role": "tool", "content": "5", "tool_call_id": "call_1"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply("It has 5 characters.")))
        .expect(1)
        .mount(&server)
        .await;

    let mut chat = Chat::builder()
        .set_model("llama3.2")
        .set_base_url(server.uri())
        .set_tool_registry(ToolRegistry::with_common_tools())
        .build()
        .unwrap();

    let response = chat.send_with_tools("How long is 'hello'?").await.unwrap();
    assert_eq!(response.content(), "It has 5 characters.");

    let roles: Vec<_> = chat.messages().iter().map(|m| m.role()).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
}
