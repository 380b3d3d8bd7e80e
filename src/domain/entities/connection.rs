//! Connection entity.
//!
//! One live realtime session between a client and the gateway. Created on
//! transport connect, bound to a user by the handshake event, destroyed on
//! transport disconnect.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{ChatId, ConnectionId, UserId};

/// Lifecycle phase of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    /// Connected, no handshake yet.
    Unregistered,
    /// Handshake accepted; the connection speaks for a user.
    Registered,
}

impl ConnectionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unregistered => "unregistered",
            Self::Registered => "registered",
        }
    }
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Connection {
    pub id: ConnectionId,
    pub user_id: Option<UserId>,
    pub rooms: HashSet<ChatId>,
    pub connected_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            user_id: None,
            rooms: HashSet::new(),
            connected_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        if self.user_id.is_some() {
            ConnectionPhase::Registered
        } else {
            ConnectionPhase::Unregistered
        }
    }

    pub fn is_registered(&self) -> bool {
        self.phase() == ConnectionPhase::Registered
    }
}
