//! Integration tests for the outbound Slack client against a mock server.

use haikubot::domain::models::SlackConfig;
use haikubot::infrastructure::slack::{SlackClient, SlackContext};
use serde_json::json;

fn client_for(server: &mockito::Server) -> SlackClient {
    let config = SlackConfig {
        api_base_url: server.url(),
        timeout_secs: 5,
    };
    SlackClient::new(&config).expect("failed to build client")
}

#[tokio::test]
async fn test_post_message_sends_token_and_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat.postMessage")
        .match_header("authorization", "Bearer xoxb-test-a")
        .match_body(mockito::Matcher::PartialJson(json!({
            "channel": "C1",
            "text": "old silent pond",
        })))
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    std::env::set_var("SLACK_API_TOKEN_TPOST", "xoxb-test-a");
    let client = client_for(&server);
    client
        .post_message(
            "old silent pond",
            &SlackContext::new("U1", "C1", "TPOST"),
            None,
        )
        .await;

    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_message_threads_replies() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat.postMessage")
        .match_body(mockito::Matcher::PartialJson(json!({
            "thread_ts": "123.456",
        })))
        .with_body(r#"{"ok": true}"#)
        .create_async()
        .await;

    std::env::set_var("SLACK_API_TOKEN_TTHREAD", "xoxb-test-b");
    let client = client_for(&server);
    client
        .post_message(
            "reply",
            &SlackContext::new("U1", "C1", "TTHREAD"),
            Some("123.456"),
        )
        .await;

    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_message_without_token_sends_nothing() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat.postMessage")
        .expect(0)
        .create_async()
        .await;

    let client = client_for(&server);
    client
        .post_message("dropped", &SlackContext::new("U1", "C1", "TNOTOKEN"), None)
        .await;

    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_message_survives_api_error_response() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat.postMessage")
        .with_body(r#"{"ok": false, "error": "channel_not_found"}"#)
        .create_async()
        .await;

    std::env::set_var("SLACK_API_TOKEN_TERR", "xoxb-test-c");
    let client = client_for(&server);
    // Must not panic or propagate; the error is only logged.
    client
        .post_message("lost", &SlackContext::new("U1", "C_MISSING", "TERR"), None)
        .await;

    mock.assert_async().await;
}
