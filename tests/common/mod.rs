//! Common Test Utilities
//!
//! Shared helpers, fixtures, and test infrastructure.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum_test::TestServer;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::time::timeout;

use chat_realtime::config::Settings;
use chat_realtime::domain::{ClientEvent, ConnectionId, HandshakePayload, ServerEvent, UserId};
use chat_realtime::presentation::websocket::{EventReceiver, Gateway};
use chat_realtime::startup::{create_app, AppState};

pub const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// Built-in defaults bound to an ephemeral local port.
pub fn test_settings() -> Settings {
    Settings::defaults("test")
        .and_then(|b| b.set_override("server.host", "127.0.0.1"))
        .and_then(|b| b.set_override("server.port", 0))
        .and_then(|b| b.build())
        .and_then(|c| c.try_deserialize())
        .expect("default settings should deserialize")
}

/// HTTP-level test application
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        let state = AppState::new(test_settings());
        let server = TestServer::new(create_app(state.clone())).expect("test server");
        Self { server, state }
    }
}

/// Serve the full application on a real socket.
pub async fn spawn_server(settings: Settings) -> SocketAddr {
    let app = create_app(AppState::new(settings));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// A connection driven directly against the gateway actor.
pub struct Peer {
    pub id: ConnectionId,
    gateway: Gateway,
    rx: EventReceiver,
}

impl Peer {
    pub fn connect(gateway: &Gateway) -> Self {
        let id = ConnectionId::new();
        let rx = gateway.connect(id);
        Self {
            id,
            gateway: gateway.clone(),
            rx,
        }
    }

    pub fn send(&self, event: ClientEvent) {
        self.gateway.dispatch(self.id, event);
    }

    /// Send a raw wire frame as the socket handler would decode it.
    pub fn send_frame(&self, frame: Value) {
        let event: ClientEvent = serde_json::from_value(frame).expect("valid client frame");
        self.send(event);
    }

    pub async fn recv(&mut self) -> ServerEvent {
        timeout(RECV_TIMEOUT, self.rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("outbound stream closed")
    }

    pub fn handshake(&self, user: &str) {
        self.send(ClientEvent::Handshake(HandshakePayload {
            user_id: UserId::new(user),
            name: Some(format!("{} name", user)),
        }));
    }

    /// Discard everything queued so far.
    pub async fn sync(&mut self) {
        self.send(ClientEvent::Heartbeat);
        while self.recv().await != ServerEvent::HeartbeatAck {}
    }

    /// Assert nothing was queued for this connection.
    pub async fn assert_quiet(&mut self) {
        self.send(ClientEvent::Heartbeat);
        assert_eq!(self.recv().await, ServerEvent::HeartbeatAck);
    }

    pub fn disconnect(self) {
        self.gateway.disconnect(self.id);
    }
}

/// Connect and handshake, leaving the queue empty.
pub async fn online(gateway: &Gateway, user: &str) -> Peer {
    let mut peer = Peer::connect(gateway);
    peer.handshake(user);
    peer.sync().await;
    peer
}

pub fn users(ids: &[&str]) -> Vec<UserId> {
    ids.iter().map(|id| UserId::new(*id)).collect()
}

/// A message object in the shape the external API returns.
pub fn chat_message(id: &str, chat: &str, sender: &str, members: &[&str]) -> Value {
    json!({
        "_id": id,
        "content": "hello",
        "sender": { "_id": sender, "name": "Sender" },
        "chat": {
            "_id": chat,
            "users": members.iter().map(|m| json!({ "_id": m })).collect::<Vec<_>>()
        }
    })
}
