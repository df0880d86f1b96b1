//! End-to-end tests using a real server and a real WebSocket client.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use live_relay::adapters::http::app_router;
use live_relay::adapters::{ClientHub, ScriptedOutcome, ScriptedSource, WebSocketState};
use live_relay::application::SessionManager;
use live_relay::domain::live::{ChatEvent, LiveEvent, UpstreamStatus};

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Boot a relay on an ephemeral port and return its address and hub.
async fn boot_relay(source: &ScriptedSource) -> (String, Arc<ClientHub>) {
    let sessions = Arc::new(SessionManager::new(Arc::new(source.clone())));
    let hub = Arc::new(ClientHub::new(sessions));
    let app = app_router(WebSocketState::new(Arc::clone(&hub)), &[]);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr.to_string(), hub)
}

async fn open_client(addr: &str, path: &str) -> WsStream {
    let (ws, _) = connect_async(format!("ws://{addr}{path}")).await.unwrap();
    ws
}

async fn send_json(ws: &mut WsStream, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

/// Read the next text frame as JSON, skipping control frames.
async fn read_json(ws: &mut WsStream) -> Value {
    timeout(TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    })
    .await
    .expect("timed out waiting for message")
}

async fn wait_for_clients(hub: &ClientHub, expected: usize) {
    let reached = timeout(TIMEOUT, async {
        while hub.client_count().await != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "client count never reached {expected}");
}

async fn wait_for_status(hub: &ClientHub, expected: UpstreamStatus) {
    let reached = timeout(TIMEOUT, async {
        while hub.sessions().status().await != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "session never reached {expected}");
}

#[tokio::test]
async fn failed_connect_is_reported_over_the_socket() {
    let source = ScriptedSource::new().with_outcome(ScriptedOutcome::fail("offline"));
    let (addr, _hub) = boot_relay(&source).await;
    let mut ws = open_client(&addr, "/").await;

    send_json(&mut ws, json!({"type": "connect", "username": "alice"})).await;

    let msg = read_json(&mut ws).await;
    assert_eq!(msg["type"], "error");
    assert_eq!(
        msg["data"]["message"],
        "Failed to connect to TikTok user \"alice\". Please check the username."
    );
}

#[tokio::test]
async fn chat_reaches_the_requesting_socket() {
    let source = ScriptedSource::new();
    let (addr, hub) = boot_relay(&source).await;
    let mut ws = open_client(&addr, "/ws").await;

    send_json(&mut ws, json!({"type": "connect", "username": "alice"})).await;
    wait_for_status(&hub, UpstreamStatus::Connected).await;

    source.emit_latest(LiveEvent::Chat(ChatEvent {
        unique_id: "bob".into(),
        comment: "hi".into(),
    }));

    let msg = read_json(&mut ws).await;
    assert_eq!(msg, json!({"type": "chat", "data": {"message": "bob said: hi"}}));
}

#[tokio::test]
async fn malformed_messages_get_no_reply() {
    let source = ScriptedSource::new().with_outcome(ScriptedOutcome::fail("offline"));
    let (addr, _hub) = boot_relay(&source).await;
    let mut ws = open_client(&addr, "/").await;

    ws.send(Message::Text("garbage".into())).await.unwrap();
    send_json(&mut ws, json!({"type": "connect"})).await;
    send_json(&mut ws, json!({"type": "connect", "username": "alice"})).await;

    // The first reply belongs to the only valid request
    let msg = read_json(&mut ws).await;
    assert_eq!(msg["type"], "error");
    assert_eq!(source.stats().open_calls, vec!["alice".to_string()]);
}

#[tokio::test]
async fn closing_last_socket_tears_down_upstream() {
    let source = ScriptedSource::new();
    let (addr, hub) = boot_relay(&source).await;
    let mut a = open_client(&addr, "/").await;
    let mut b = open_client(&addr, "/").await;
    wait_for_clients(&hub, 2).await;

    send_json(&mut a, json!({"type": "connect", "username": "alice"})).await;
    wait_for_status(&hub, UpstreamStatus::Connected).await;

    a.close(None).await.unwrap();
    wait_for_clients(&hub, 1).await;
    assert!(hub.sessions().snapshot().await.is_some());

    b.close(None).await.unwrap();
    wait_for_clients(&hub, 0).await;
    assert!(hub.sessions().snapshot().await.is_none());
    assert!(source.wait_until(TIMEOUT, |s| s.disconnects == 1).await);
}

#[tokio::test]
async fn health_probe_reports_attached_clients() {
    let source = ScriptedSource::new();
    let (addr, hub) = boot_relay(&source).await;
    let _ws = open_client(&addr, "/").await;
    wait_for_clients(&hub, 1).await;

    let mut stream = tokio::net::TcpStream::connect(&addr).await.unwrap();
    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    tokio::io::AsyncWriteExt::write_all(&mut stream, request.as_bytes())
        .await
        .unwrap();
    let mut response = String::new();
    tokio::io::AsyncReadExt::read_to_string(&mut stream, &mut response)
        .await
        .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let health: Value = serde_json::from_str(body).unwrap();
    assert_eq!(health["clients"], 1);
}
