//! Room Membership
//!
//! Chat-scoped broadcast groups. Rooms appear on first join and vanish when
//! their last member leaves. Membership is a set, so repeated joins never
//! duplicate delivery.

use std::collections::{HashMap, HashSet};

use crate::domain::{ChatId, ConnectionId};

#[derive(Debug, Default)]
pub struct RoomRouter {
    rooms: HashMap<ChatId, HashSet<ConnectionId>>,
}

impl RoomRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the connection was not already in the room.
    pub fn join(&mut self, connection_id: ConnectionId, room: ChatId) -> bool {
        self.rooms.entry(room).or_default().insert(connection_id)
    }

    pub fn leave(&mut self, connection_id: ConnectionId, room: &ChatId) {
        if let Some(members) = self.rooms.get_mut(room) {
            members.remove(&connection_id);
            if members.is_empty() {
                self.rooms.remove(room);
            }
        }
    }

    /// Remove the connection from every room in `rooms`.
    pub fn leave_all<'a>(&mut self, connection_id: ConnectionId, rooms: impl IntoIterator<Item = &'a ChatId>) {
        for room in rooms {
            self.leave(connection_id, room);
        }
    }

    /// Room members other than `except`.
    pub fn members_except(&self, room: &ChatId, except: ConnectionId) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().filter(|c| *c != except).collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, room: &ChatId) -> usize {
        self.rooms.get(room).map(HashSet::len).unwrap_or(0)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
