//! Integration tests for [`dodo_adapter::GatewaySession`]: REST identity and
//! endpoint acquisition are mocked with mockito, the gateway side runs
//! against an in-process websocket listener.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;

use dodo_adapter::{
    AdapterConfig, AdapterRuntime, BotConfig, BotInfo, DodoBot, Event, EventHandler,
    GatewaySession, SessionState,
};

const BOT_SOURCE_ID: &str = "3344";

struct RecordingHandler {
    events: mpsc::UnboundedSender<Event>,
    connects: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
}

impl RecordingHandler {
    fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Arc::new(Self {
                events: tx,
                connects: Arc::new(AtomicUsize::new(0)),
                disconnects: Arc::new(AtomicUsize::new(0)),
            }),
            rx,
        )
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn dispatch(&self, _bot: Arc<DodoBot>, event: Event) {
        let _ = self.events.send(event);
    }

    async fn on_connect(&self, _bot_info: &BotInfo) {
        self.connects.fetch_add(1, Ordering::SeqCst);
    }

    async fn on_disconnect(&self, _bot_info: &BotInfo) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

/// Mounts `bot/info` and `websocket/connection` mocks pointing at `ws_addr`.
async fn mount_rest_mocks(
    server: &mut mockito::ServerGuard,
    ws_addr: &str,
) -> (mockito::Mock, mockito::Mock) {
    let info = server
        .mock("POST", "/bot/info")
        .with_status(200)
        .with_body(
            json!({
                "status": 0,
                "message": "success",
                "data": {
                    "clientId": "123",
                    "dodoSourceId": BOT_SOURCE_ID,
                    "nickName": "testbot",
                    "avatarUrl": "https://img.imdodo.com/avatar.png"
                }
            })
            .to_string(),
        )
        .create_async()
        .await;
    let connection = server
        .mock("POST", "/websocket/connection")
        .with_status(200)
        .with_body(
            json!({
                "status": 0,
                "message": "success",
                "data": {"endpoint": format!("ws://{ws_addr}")}
            })
            .to_string(),
        )
        .create_async()
        .await;
    (info, connection)
}

fn test_bot(server: &mockito::ServerGuard) -> Arc<DodoBot> {
    Arc::new(DodoBot::new(
        BotConfig {
            client_id: "123".to_string(),
            token: "secret".to_string(),
        },
        &server.url(),
    ))
}

fn channel_message_frame(content: &str) -> String {
    json!({
        "type": 0,
        "data": {
            "eventId": "e-1",
            "eventType": "2001",
            "timestamp": 1693300000000i64,
            "eventBody": {
                "dodoSourceId": "1111",
                "islandSourceId": "2222",
                "channelId": "3333",
                "personal": {"nickName": "n", "avatarUrl": "a", "sex": 1},
                "member": {"nickName": "n", "joinTime": "2023-01-01 10:00:00"},
                "messageId": "m-1",
                "messageType": 1,
                "messageBody": {"content": content}
            }
        },
        "version": "0"
    })
    .to_string()
}

#[tokio::test]
async fn test_event_reaches_dispatch_exactly_once_and_heartbeat_never() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(WsMessage::Text(r#"{"type":1}"#.to_string()))
            .await
            .unwrap();
        ws.send(WsMessage::Text(channel_message_frame(
            &format!("<@!{BOT_SOURCE_ID}> hi"),
        )))
        .await
        .unwrap();
        // Hold the connection open, draining client heartbeats.
        while ws.next().await.is_some() {}
    });

    let mut server = mockito::Server::new_async().await;
    let _mocks = mount_rest_mocks(&mut server, &ws_addr).await;

    let (handler, mut events) = RecordingHandler::new();
    let session = GatewaySession::new(test_bot(&server), handler.clone());
    let task = tokio::spawn(session.run());

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event within timeout")
        .expect("event channel closed");
    let Event::ChannelMessage(ev) = &event else {
        panic!("expected channel message, got {event:?}");
    };
    assert!(ev.to_me, "mention of the bot must set to_me");
    assert_eq!(ev.message().to_string(), "hi");

    // The heartbeat ack must never reach dispatch, and the event only once.
    assert!(
        timeout(Duration::from_millis(300), events.recv()).await.is_err(),
        "no further dispatch expected"
    );
    assert_eq!(handler.connects.load(Ordering::SeqCst), 1);

    task.abort();
}

#[tokio::test]
async fn test_client_sends_heartbeat_frames() {
    let (frames_tx, mut frames_rx) = mpsc::unbounded_channel::<String>();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        while let Some(Ok(frame)) = ws.next().await {
            if let WsMessage::Text(text) = frame {
                let _ = frames_tx.send(text);
            }
        }
    });

    let mut server = mockito::Server::new_async().await;
    let _mocks = mount_rest_mocks(&mut server, &ws_addr).await;

    let (handler, _events) = RecordingHandler::new();
    let session = GatewaySession::new(test_bot(&server), handler)
        .with_heartbeat_interval(Duration::from_millis(100));
    let task = tokio::spawn(session.run());

    let frame = timeout(Duration::from_secs(5), frames_rx.recv())
        .await
        .expect("no heartbeat within timeout")
        .expect("frame channel closed");
    assert_eq!(frame, r#"{"type":1}"#);

    task.abort();
}

#[tokio::test]
async fn test_reconnects_without_refetching_identity() {
    let accepts = Arc::new(AtomicUsize::new(0));
    let accepts_counter = accepts.clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            accepts_counter.fetch_add(1, Ordering::SeqCst);
            // Tear the connection down right away to force a reconnect.
            drop(ws);
        }
    });

    let mut server = mockito::Server::new_async().await;
    let (info_mock, connection_mock) = mount_rest_mocks(&mut server, &ws_addr).await;

    let (handler, _events) = RecordingHandler::new();
    let session = GatewaySession::new(test_bot(&server), handler.clone())
        .with_reconnect_interval(Duration::from_millis(50));
    let task = tokio::spawn(session.run());

    // The session must keep retrying: wait for several accepted connections.
    timeout(Duration::from_secs(10), async {
        while accepts.load(Ordering::SeqCst) < 3 {
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("session stopped reconnecting");

    assert!(handler.disconnects.load(Ordering::SeqCst) >= 2);
    // Identity and endpoint were fetched exactly once, before the first
    // connect; retries reuse them.
    info_mock.assert_async().await;
    connection_mock.assert_async().await;

    task.abort();
}

#[tokio::test]
async fn test_malformed_frame_does_not_kill_the_loop() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(WsMessage::Text("not json".to_string())).await.unwrap();
        ws.send(WsMessage::Text(
            json!({"type": 0, "data": {"eventType": "9999", "eventBody": {}}, "version": "0"})
                .to_string(),
        ))
        .await
        .unwrap();
        ws.send(WsMessage::Text(channel_message_frame("still alive")))
            .await
            .unwrap();
        while ws.next().await.is_some() {}
    });

    let mut server = mockito::Server::new_async().await;
    let _mocks = mount_rest_mocks(&mut server, &ws_addr).await;

    let (handler, mut events) = RecordingHandler::new();
    let session = GatewaySession::new(test_bot(&server), handler);
    let task = tokio::spawn(session.run());

    let event = timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("no event within timeout")
        .expect("event channel closed");
    let Event::ChannelMessage(ev) = &event else {
        panic!("expected channel message");
    };
    assert_eq!(ev.message().to_string(), "still alive");
    assert!(!ev.to_me);

    task.abort();
}

#[tokio::test]
async fn test_bad_credential_stops_session() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/bot/info")
        .with_status(200)
        .with_body(json!({"status": 10005, "message": "unauthorized", "data": null}).to_string())
        .create_async()
        .await;
    let connection_mock = server
        .mock("POST", "/websocket/connection")
        .expect(0)
        .create_async()
        .await;

    let (handler, _events) = RecordingHandler::new();
    let session = GatewaySession::new(test_bot(&server), handler);
    let mut state = session.subscribe_state();
    let task = tokio::spawn(session.run());

    timeout(Duration::from_secs(5), async {
        while *state.borrow() != SessionState::Stopped {
            if state.changed().await.is_err() {
                break;
            }
        }
    })
    .await
    .expect("session did not stop");

    // A bad credential is not retried and the endpoint is never requested.
    connection_mock.assert_async().await;
    timeout(Duration::from_secs(1), task)
        .await
        .expect("session task did not finish")
        .unwrap();
}

#[tokio::test]
async fn test_runtime_shutdown_within_bound() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let ws_addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            tokio::spawn(async move { while ws.next().await.is_some() {} });
        }
    });

    let mut server = mockito::Server::new_async().await;
    let _mocks = mount_rest_mocks(&mut server, &ws_addr).await;

    let config = AdapterConfig {
        bots: vec![BotConfig {
            client_id: "123".to_string(),
            token: "secret".to_string(),
        }],
        api_base: server.url(),
        log_file: "logs/test.log".to_string(),
    };
    let (handler, _events) = RecordingHandler::new();
    let mut runtime = AdapterRuntime::new(config, handler);
    runtime.start();
    sleep(Duration::from_millis(200)).await;

    timeout(Duration::from_secs(5), runtime.shutdown())
        .await
        .expect("shutdown exceeded its bound");
}
