//! WebSocket Session Management

use tokio::time::{Duration, Instant};

use crate::domain::{ConnectionId, UserId};

/// Per-socket liveness and handshake bookkeeping.
#[derive(Debug)]
pub struct SessionState {
    pub connection_id: ConnectionId,
    pub user_id: Option<UserId>,
    pub connected_at: Instant,
    pub last_seen: Instant,
}

impl SessionState {
    pub fn new(connection_id: ConnectionId) -> Self {
        let now = Instant::now();
        Self {
            connection_id,
            user_id: None,
            connected_at: now,
            last_seen: now,
        }
    }

    /// Any inbound frame counts as liveness.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn handshake(&mut self, user_id: UserId) {
        self.user_id = Some(user_id);
    }

    pub fn is_registered(&self) -> bool {
        self.user_id.is_some()
    }

    /// When the socket should be closed if nothing else happens.
    pub fn deadline(&self, handshake_timeout: Duration, heartbeat_timeout: Duration) -> Instant {
        let idle = self.last_seen + heartbeat_timeout;
        if self.is_registered() {
            idle
        } else {
            idle.min(self.connected_at + handshake_timeout)
        }
    }
}
