use hanron_llm::{ChatClient, ChatOptions, ChatRequest, Message, OpenAIClient};
use mockito::Matcher;
use serde_json::json;

#[tokio::test]
async fn test_chat_parses_first_choice() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(json!({
            "model": "meta-llama/Llama-3.1-8B-Instruct",
            "temperature": 0.7,
            "max_tokens": 200,
            "messages": [
                {"role": "system", "content": "rebut"},
                {"role": "user", "content": "Cats are better than dogs."}
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "id": "chatcmpl-1",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Dogs are more trainable."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 5, "total_tokens": 17}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = OpenAIClient::with_base_url("test-key", server.url()).unwrap();
    let request = ChatRequest::new(
        "meta-llama/Llama-3.1-8B-Instruct",
        vec![Message::system("rebut"), Message::human("Cats are better than dogs.")],
    )
    .with_options(ChatOptions::new().temperature(0.7).max_tokens(200));

    let response = client.chat(request).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.content.as_deref(), Some("Dogs are more trainable."));
    assert_eq!(response.finish_reason.as_deref(), Some("stop"));
    assert_eq!(response.usage.unwrap().total_tokens, 17);
}

#[tokio::test]
async fn test_chat_tolerates_missing_usage() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"ok"}}]}"#)
        .create_async()
        .await;

    let client = OpenAIClient::with_base_url("k", server.url()).unwrap();
    let response = client
        .chat(ChatRequest::new("m", vec![Message::human("hi")]))
        .await
        .unwrap();

    assert_eq!(response.content.as_deref(), Some("ok"));
    assert!(response.usage.is_none());
}

#[tokio::test]
async fn test_chat_surfaces_http_errors() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(503)
        .with_body("model is loading")
        .create_async()
        .await;

    let client = OpenAIClient::with_base_url("k", server.url()).unwrap();
    let err = client
        .chat(ChatRequest::new("m", vec![Message::human("hi")]))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("503"), "unexpected error: {}", text);
    assert!(text.contains("model is loading"));
}
