use httpmock::prelude::*;
use serde_json::json;
use novelist_llm::{GenerationBackend, GenerationRequest, NovelistError, OpenAiCompatibleClient};

fn client_for(server: &MockServer) -> OpenAiCompatibleClient {
    OpenAiCompatibleClient::builder()
        .base_url(&server.base_url())
        .expect("url")
        .api_key("sk-test")
        .default_model("deepseek-chat")
        .build()
        .expect("client")
}

#[tokio::test]
async fn chat_completion_returns_first_choice() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer sk-test")
            .json_body(json!({
                "model": "deepseek-chat",
                "messages": [{"role": "user", "content": "续写"}],
                "temperature": 0.7,
                "max_tokens": 4000,
                "stream": false
            }));
        then.status(200).json_body(json!({
            "id": "cmpl-1",
            "object": "chat.completion",
            "created": 1,
            "model": "deepseek-chat",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "夜色渐深。"},
                "finish_reason": "stop"
            }]
        }));
    });

    let text = client_for(&server)
        .generate(GenerationRequest::new("续写"))
        .await
        .expect("generate");
    assert_eq!(text, "夜色渐深。");
    mock.assert();
}

#[tokio::test]
async fn error_body_message_is_surfaced() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(401)
            .json_body(json!({"error": {"message": "invalid api key", "type": "auth"}}));
    });

    let err = client_for(&server)
        .generate(GenerationRequest::new("续写"))
        .await
        .unwrap_err();
    match err {
        NovelistError::LlmProvider(message) => assert!(message.contains("invalid api key")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn builder_requires_base_url_and_model() {
    let missing_url = OpenAiCompatibleClient::builder()
        .default_model("m")
        .build();
    assert!(matches!(missing_url, Err(NovelistError::InvalidConfig(_))));

    let bad_url = OpenAiCompatibleClient::builder().base_url("not a url");
    assert!(matches!(bad_url, Err(NovelistError::InvalidConfig(_))));
}
