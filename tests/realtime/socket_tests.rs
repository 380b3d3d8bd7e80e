//! End-to-end tests over a real WebSocket.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use crate::common::{spawn_server, test_settings, RECV_TIMEOUT};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: std::net::SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("Failed to connect to WebSocket");
    ws
}

async fn send(ws: &mut Client, frame: Value) {
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

async fn recv_json(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn recv_event(ws: &mut Client, name: &str) -> Value {
    loop {
        let frame = recv_json(ws).await;
        if frame["t"] == name {
            return frame;
        }
    }
}

#[tokio::test]
async fn test_handshake_and_heartbeat_over_socket() {
    let addr = spawn_server(test_settings()).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "t": "handshake", "d": { "_id": "u1", "name": "Ann" } })).await;
    assert_eq!(recv_json(&mut ws).await, json!({ "t": "presence-online", "d": ["u1"] }));
    let ack = recv_json(&mut ws).await;
    assert_eq!(ack["t"], "handshake-ack");
    assert_eq!(ack["d"]["userId"], "u1");

    send(&mut ws, json!({ "t": "heartbeat" })).await;
    assert_eq!(recv_json(&mut ws).await, json!({ "t": "heartbeat-ack" }));
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let addr = spawn_server(test_settings()).await;
    let mut ws = connect(addr).await;

    ws.send(Message::text("{not json")).await.unwrap();
    send(&mut ws, json!({ "t": "unknown-event", "d": 1 })).await;
    send(&mut ws, json!({ "t": "heartbeat" })).await;
    assert_eq!(recv_json(&mut ws).await, json!({ "t": "heartbeat-ack" }));
}

#[tokio::test]
async fn test_signal_relayed_between_sockets() {
    let addr = spawn_server(test_settings()).await;
    let mut caller = connect(addr).await;
    let mut callee = connect(addr).await;

    send(&mut caller, json!({ "t": "handshake", "d": { "_id": "u1" } })).await;
    recv_event(&mut caller, "handshake-ack").await;
    send(&mut callee, json!({ "t": "handshake", "d": { "_id": "u2" } })).await;
    recv_event(&mut callee, "handshake-ack").await;

    send(
        &mut caller,
        json!({
            "t": "call-initiate",
            "d": { "targetUserId": "u2", "signal": { "sdp": "offer" }, "callerId": "u1", "isVideo": false }
        }),
    )
    .await;
    let incoming = recv_event(&mut callee, "call-incoming").await;
    assert_eq!(incoming["d"]["callerId"], "u1");
    assert_eq!(incoming["d"]["signal"], json!({ "sdp": "offer" }));

    caller.close(None).await.unwrap();
    let offline = recv_event(&mut callee, "presence-offline").await;
    assert_eq!(offline["d"], "u1");
}

#[tokio::test]
async fn test_handshake_timeout_closes_socket() {
    let mut settings = test_settings();
    settings.websocket.handshake_timeout_secs = 1;
    let addr = spawn_server(settings).await;
    let mut ws = connect(addr).await;

    let closed = timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "socket should close without a handshake");
}
