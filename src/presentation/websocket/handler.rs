//! WebSocket Connection Handler
//!
//! One task per socket: decodes inbound frames into gateway commands and
//! runs a writer task that drains the connection's outbound queue.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::time::{sleep_until, timeout};

use super::messages;
use super::session::SessionState;
use crate::domain::{ClientEvent, ConnectionId};
use crate::startup::AppState;

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    let limits = &state.settings.websocket;
    ws.max_message_size(limits.max_message_size)
        .max_frame_size(limits.max_frame_size)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();
    let mut session = SessionState::new(connection_id);
    let handshake_timeout = state.settings.websocket.handshake_timeout();
    let heartbeat_timeout = state.settings.websocket.heartbeat_timeout();

    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let mut outbound = state.gateway.connect(connection_id);

    // Forward routed events to the socket
    let sender_task = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let text = match messages::encode(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(connection_id = %connection_id, error = %e, "Failed to serialize event");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        let deadline = session.deadline(handshake_timeout, heartbeat_timeout);
        tokio::select! {
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        session.touch();
                        handle_frame(text.as_str(), &mut session, &state);
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::debug!(connection_id = %connection_id, "Connection closed by peer");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Binary, ping and pong frames only count as liveness
                        session.touch();
                    }
                    Some(Err(e)) => {
                        tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }

            _ = sleep_until(deadline) => {
                if session.is_registered() {
                    tracing::info!(
                        connection_id = %connection_id,
                        user_id = ?session.user_id,
                        "Heartbeat timeout, closing connection"
                    );
                } else {
                    tracing::info!(connection_id = %connection_id, "Handshake timeout, closing connection");
                }
                break;
            }
        }
    }

    // Removing the sender ends the writer task once queued events are flushed
    state.gateway.disconnect(connection_id);
    let mut sender_task = sender_task;
    if timeout(WRITER_DRAIN_TIMEOUT, &mut sender_task).await.is_err() {
        tracing::debug!(connection_id = %connection_id, "Writer did not drain in time");
        sender_task.abort();
    }

    tracing::info!(
        connection_id = %connection_id,
        user_id = ?session.user_id,
        "WebSocket disconnected"
    );
}

fn handle_frame(text: &str, session: &mut SessionState, state: &AppState) {
    let event = match messages::decode(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(connection_id = %session.connection_id, error = %e, "Ignoring malformed frame");
            return;
        }
    };

    if let ClientEvent::Handshake(payload) = &event {
        if !payload.user_id.is_empty() {
            session.handshake(payload.user_id.clone());
        }
    }

    state.gateway.dispatch(session.connection_id, event);
}
