use std::time::Duration;

use docqa_answer::{GenerationError, GenerationRequest, Generator, OpenAiChatClient};
use mockito::{Matcher, Server};

fn request() -> GenerationRequest {
    GenerationRequest {
        model: "gpt-test".to_string(),
        system: "You are terse.".to_string(),
        user: "Say hello.".to_string(),
        temperature: 0.3,
        max_tokens: 64,
        timeout: Duration::from_secs(5),
    }
}

fn completion(content: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

#[test]
fn returns_first_choice_content() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "gpt-test",
            "max_tokens": 64,
            "messages": [
                { "role": "system", "content": "You are terse." },
                { "role": "user", "content": "Say hello." }
            ]
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion("Hello."))
        .create();

    let client = OpenAiChatClient::new(server.url(), "test-key");
    let text = client.generate(&request()).unwrap();

    assert_eq!(text, "Hello.");
    mock.assert();
}

#[test]
fn trailing_slash_in_base_url_is_ignored() {
    let mut server = Server::new();
    let mock = server.mock("POST", "/chat/completions").with_status(200).with_body(completion("ok")).create();

    let client = OpenAiChatClient::new(format!("{}/", server.url()), "k");
    assert_eq!(client.generate(&request()).unwrap(), "ok");
    mock.assert();
}

#[test]
fn server_error_is_reported_with_status() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/chat/completions")
        .with_status(500)
        .with_body(r#"{"error":{"message":"overloaded"}}"#)
        .create();

    let client = OpenAiChatClient::new(server.url(), "k");
    let err = client.generate(&request()).unwrap_err();

    match err {
        GenerationError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("overloaded"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[test]
fn empty_content_is_an_error() {
    let mut server = Server::new();
    let _mock = server.mock("POST", "/chat/completions").with_status(200).with_body(completion("  ")).create();

    let client = OpenAiChatClient::new(server.url(), "k");
    assert!(matches!(client.generate(&request()), Err(GenerationError::EmptyResponse)));
}

#[test]
fn malformed_body_is_a_decode_error() {
    let mut server = Server::new();
    let _mock = server.mock("POST", "/chat/completions").with_status(200).with_body("not json").create();

    let client = OpenAiChatClient::new(server.url(), "k");
    assert!(matches!(client.generate(&request()), Err(GenerationError::Decode(_))));
}
