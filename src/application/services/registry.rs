//! Connection Registry
//!
//! Presence table mapping each online user to its latest connection.
//! At most one connection per user: a newer handshake silently supersedes
//! the previous one, and a disconnect only evicts the entry when it still
//! points at the disconnecting connection.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{ConnectionId, UserId};

/// Result of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Connection that was displaced by this registration, if any.
    pub superseded: Option<ConnectionId>,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    connection_id: ConnectionId,
    /// Position in `order`.
    seq: u64,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    entries: HashMap<UserId, Entry>,
    owners: HashMap<ConnectionId, UserId>,
    /// First-registration order, for a stable online list.
    order: BTreeMap<u64, UserId>,
    next_seq: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `user_id` on `connection_id`, overwriting any prior entry.
    pub fn register(&mut self, user_id: UserId, connection_id: ConnectionId) -> Registration {
        let superseded = match self.entries.get_mut(&user_id) {
            Some(entry) => {
                let previous = std::mem::replace(&mut entry.connection_id, connection_id);
                self.owners.remove(&previous);
                Some(previous)
            }
            None => {
                let seq = self.next_seq;
                self.next_seq += 1;
                self.order.insert(seq, user_id.clone());
                self.entries.insert(user_id.clone(), Entry { connection_id, seq });
                None
            }
        };
        self.owners.insert(connection_id, user_id.clone());
        let superseded = superseded.filter(|previous| *previous != connection_id);

        tracing::debug!(
            user_id = %user_id,
            connection_id = %connection_id,
            superseded = ?superseded,
            "User registered"
        );

        Registration { superseded }
    }

    /// Remove the entry owned by `connection_id`.
    ///
    /// Returns the user that went offline, or `None` when the connection
    /// holds no entry (never registered, or already superseded).
    pub fn unregister(&mut self, connection_id: ConnectionId) -> Option<UserId> {
        let user_id = self.owners.remove(&connection_id)?;

        if let Some(entry) = self.entries.remove(&user_id) {
            self.order.remove(&entry.seq);
        }

        tracing::debug!(
            user_id = %user_id,
            connection_id = %connection_id,
            "User unregistered"
        );

        Some(user_id)
    }

    /// Drop `user_id` only if it is still owned by `connection_id`.
    pub fn release(&mut self, user_id: &UserId, connection_id: ConnectionId) -> bool {
        match self.entries.get(user_id) {
            Some(entry) if entry.connection_id == connection_id => {
                self.order.remove(&entry.seq);
                self.entries.remove(user_id);
                self.owners.remove(&connection_id);
                true
            }
            _ => false,
        }
    }

    /// Direct addressing: the live connection of `user_id`.
    pub fn lookup(&self, user_id: &UserId) -> Option<ConnectionId> {
        self.entries.get(user_id).map(|entry| entry.connection_id)
    }

    pub fn is_online(&self, user_id: &UserId) -> bool {
        self.entries.contains_key(user_id)
    }

    /// Online user ids in first-registration order.
    pub fn online_users(&self) -> Vec<UserId> {
        self.order.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
