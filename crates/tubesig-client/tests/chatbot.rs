//! Integration tests for `ChatBotClient` and forwarding using wiremock HTTP mocks.

use tubesig_client::{
    forward_new, ChatBotClient, ClientError, Disclosure, SeenSet, MAX_MESSAGE_CHARS,
};
use tubesig_core::Watchlist;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123456:secret-token";

fn test_client(base_url: &str) -> ChatBotClient {
    ChatBotClient::with_base_url(TOKEN, 30, base_url)
        .expect("client construction should not fail")
        .with_retry(1, 0)
}

fn sent(message_id: i64) -> serde_json::Value {
    serde_json::json!({
        "ok": true,
        "result": { "message_id": message_id, "chat": { "id": -100 }, "date": 0 }
    })
}

#[tokio::test]
async fn send_message_returns_message_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_partial_json(serde_json::json!({
            "chat_id": "-100",
            "text": "hello"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent(42)))
        .expect(1)
        .mount(&server)
        .await;

    let id = test_client(&server.uri())
        .send_message("-100", "hello")
        .await
        .unwrap();
    assert_eq!(id, 42);
}

#[tokio::test]
async fn rejected_request_is_api_error_without_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .send_message("-1", "hello")
        .await
        .unwrap_err();

    match &err {
        ClientError::Api {
            status, message, ..
        } => {
            assert_eq!(*status, Some(400));
            assert_eq!(message, "Bad Request: chat not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    assert!(!err.to_string().contains("secret-token"));
}

#[tokio::test]
async fn long_messages_are_truncated_before_sending() {
    let server = MockServer::start().await;
    let truncated = format!("{}…", "x".repeat(MAX_MESSAGE_CHARS - 1));

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "text": truncated })))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent(1)))
        .expect(1)
        .mount(&server)
        .await;

    let long = "x".repeat(MAX_MESSAGE_CHARS + 500);
    test_client(&server.uri())
        .send_message("-100", &long)
        .await
        .unwrap();
}

#[tokio::test]
async fn connection_error_does_not_leak_token() {
    let err = test_client("http://127.0.0.1:1")
        .send_message("-100", "hello")
        .await
        .unwrap_err();
    assert!(!err.to_string().contains("secret-token"));
}

#[tokio::test]
async fn forward_new_sends_through_chat_sink() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(200).set_body_json(sent(7)))
        .expect(2)
        .mount(&server)
        .await;

    let filings: Vec<Disclosure> = ["r1", "r2", "r1"]
        .iter()
        .map(|r| Disclosure {
            corp_name: "Kakao".to_owned(),
            report_nm: "Quarterly report".to_owned(),
            rcept_no: (*r).to_owned(),
            ..Disclosure::default()
        })
        .collect();

    let client = test_client(&server.uri());
    let sink = client.for_chat("-100");
    let mut seen = SeenSet::default();

    let report = forward_new(&filings, &Watchlist::default(), &mut seen, &sink).await;

    assert_eq!(report.sent, 2);
    assert_eq!(report.skipped_seen, 1);
    assert_eq!(seen.len(), 2);
}
