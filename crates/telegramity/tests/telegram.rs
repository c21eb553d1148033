//! Bot API transport tests against a local mock server.

use std::time::Duration;

use serde_json::json;
use telegramity::{
    CancellationToken, Client, ClientConfig, Error, NoopCapture, ReportOptions, TelegramTransport,
    Transport,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "123456:ABC-DEF";
const CHAT_ID: i64 = -1001234567890;

fn transport(server: &MockServer) -> TelegramTransport {
    TelegramTransport::with_api_base_url(TOKEN, Duration::from_secs(5), server.uri()).unwrap()
}

#[tokio::test]
async fn test_send_message_posts_html_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .and(body_json(json!({
            "chat_id": CHAT_ID,
            "text": "<b>hello</b>",
            "parse_mode": "HTML",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {"message_id": 7, "date": 0, "chat": {"id": CHAT_ID, "type": "group"}},
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    transport(&server)
        .send_message(&cancel, CHAT_ID, "<b>hello</b>")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_api_error_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found",
        })))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = transport(&server)
        .send_message(&cancel, CHAT_ID, "hello")
        .await
        .unwrap_err();
    match err {
        Error::Api { code, description } => {
            assert_eq!(code, Some(400));
            assert_eq!(description, "Bad Request: chat not found");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = transport(&server)
        .send_message(&cancel, CHAT_ID, "hello")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api { code: Some(502), .. }), "{err:?}");
    assert!(!err.to_string().contains("ABC-DEF"));
}

#[tokio::test]
async fn test_missing_result_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let err = transport(&server).get_me(&cancel).await.unwrap_err();
    assert!(matches!(err, Error::Api { code: None, .. }), "{err:?}");
}

#[tokio::test]
async fn test_get_me_parses_bot_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/bot{TOKEN}/getMe")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": {
                "id": 123456,
                "is_bot": true,
                "first_name": "Reporter",
                "username": "reporter_bot",
            },
        })))
        .expect(2)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let transport = transport(&server);
    let me = transport.get_me(&cancel).await.unwrap();
    assert_eq!(me.id, 123456);
    assert!(me.is_bot);
    assert_eq!(me.first_name, "Reporter");
    assert_eq!(me.username.as_deref(), Some("reporter_bot"));

    transport.test_connection(&cancel).await.unwrap();
}

#[tokio::test]
async fn test_cancel_during_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true, "result": {}}))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = transport(&server)
        .send_message(&cancel, CHAT_ID, "hello")
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_client_retries_rejected_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/bot{TOKEN}/sendMessage")))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: can't parse entities",
        })))
        .expect(3)
        .mount(&server)
        .await;

    let config = ClientConfig::builder(TOKEN, CHAT_ID)
        .max_retries(2)
        .retry_delay(Duration::from_millis(10))
        .rate_limit(100)
        .api_base_url(server.uri())
        .build();
    let client = Client::new(config)
        .unwrap()
        .with_stack_capture(std::sync::Arc::new(NoopCapture));

    let cancel = CancellationToken::new();
    let err = client
        .report_error(&cancel, "boom", "network", ReportOptions::new())
        .await
        .unwrap_err();
    match err {
        Error::DeliveryFailed { attempts, source } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*source, Error::Api { code: Some(400), .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
