//! Integration tests for [`dodo_adapter::ApiClient`]: envelope unwrapping and
//! the error taxonomy, against a mocked REST server.

use dodo_adapter::{AdapterError, ApiClient};
use serde_json::json;

fn envelope_body(status: i64, data: serde_json::Value) -> String {
    json!({"status": status, "message": "msg", "data": data}).to_string()
}

#[tokio::test]
async fn test_success_returns_data() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/bot/info")
        .match_header("authorization", "Bot 123.secret")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(envelope_body(0, json!({"x": 1})))
        .create_async()
        .await;

    let api = ApiClient::new(server.url(), "123", "secret");
    let data = api.call("bot/info", &json!({})).await.unwrap();
    assert_eq!(data, json!({"x": 1}));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_status_10005_is_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/bot/info")
        .with_status(200)
        .with_body(envelope_body(10005, json!(null)))
        .create_async()
        .await;

    let api = ApiClient::new(server.url(), "123", "secret");
    let err = api.call("bot/info", &json!({})).await.unwrap_err();
    assert!(matches!(err, AdapterError::Unauthorized { status: 10005, .. }));
}

#[tokio::test]
async fn test_rate_limit_statuses() {
    for status in [10082, 10083] {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/channel/message/send")
            .with_status(200)
            .with_body(envelope_body(status, json!(null)))
            .create_async()
            .await;

        let api = ApiClient::new(server.url(), "123", "secret");
        let err = api
            .call("channel/message/send", &json!({}))
            .await
            .unwrap_err();
        assert!(
            matches!(err, AdapterError::RateLimited { .. }),
            "status {status} should map to RateLimited, got {err:?}"
        );
        assert_eq!(err.status(), Some(status));
    }
}

#[tokio::test]
async fn test_other_nonzero_status_is_action_failed() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/island/list")
        .with_status(200)
        .with_body(envelope_body(7, json!(null)))
        .create_async()
        .await;

    let api = ApiClient::new(server.url(), "123", "secret");
    let err = api.call("island/list", &json!({})).await.unwrap_err();
    match err {
        AdapterError::ActionFailed { status, message } => {
            assert_eq!(status, 7);
            assert_eq!(message, "msg");
        }
        other => panic!("expected ActionFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_envelope_is_network_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/bot/info")
        .with_status(200)
        .with_body("not json at all")
        .create_async()
        .await;

    let api = ApiClient::new(server.url(), "123", "secret");
    let err = api.call("bot/info", &json!({})).await.unwrap_err();
    assert!(matches!(err, AdapterError::Network(_)));
}

#[tokio::test]
async fn test_empty_body_is_network_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/bot/info")
        .with_status(200)
        .with_body("")
        .create_async()
        .await;

    let api = ApiClient::new(server.url(), "123", "secret");
    let err = api.call("bot/info", &json!({})).await.unwrap_err();
    assert!(matches!(err, AdapterError::Network(_)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Port 9 (discard) is not listening locally.
    let api = ApiClient::new("http://127.0.0.1:9", "123", "secret");
    let err = api.call("bot/info", &json!({})).await.unwrap_err();
    assert!(matches!(err, AdapterError::Network(_)));
}
