//! Event Router
//!
//! Owns all shared realtime state (connection table, registry, rooms) and
//! turns each inbound event into the list of deliveries it causes. It
//! performs no I/O, so the whole routing table runs without a transport.
//!
//! Per connection: `Unregistered --handshake--> Registered`; any state ends
//! on disconnect. Only `handshake` and `heartbeat` are accepted before the
//! handshake.
//!
//! Delivery is best effort and at most once. A target with no registry
//! entry is dropped silently and only counted.

use std::collections::HashMap;

use serde_json::Value;

use super::registry::ConnectionRegistry;
use super::rooms::RoomRouter;
use super::signaling::{self, RelayedSignal};
use crate::domain::{
    ChatId, ChatMembers, ClientEvent, Connection, ConnectionId, HandshakeAckPayload,
    MessageRouting, ServerEvent, UserId,
};

/// One outbound event for one connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub target: ConnectionId,
    pub event: ServerEvent,
}

/// Everything a single router step produced.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub deliveries: Vec<Delivery>,
    /// Direct deliveries dropped because the target user was offline.
    pub dropped: usize,
}

impl Dispatch {
    fn push(&mut self, target: ConnectionId, event: ServerEvent) {
        self.deliveries.push(Delivery { target, event });
    }

    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct EventRouter {
    connections: HashMap<ConnectionId, Connection>,
    registry: ConnectionRegistry,
    rooms: RoomRouter,
}

impl EventRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly opened transport connection.
    pub fn connect(&mut self, connection_id: ConnectionId) {
        self.connections
            .entry(connection_id)
            .or_insert_with(|| Connection::new(connection_id));
    }

    /// Tear down a connection: leave its rooms and, if it still owns a
    /// registry entry, announce the user offline.
    pub fn disconnect(&mut self, connection_id: ConnectionId) -> Dispatch {
        let mut out = Dispatch::default();
        let Some(connection) = self.connections.remove(&connection_id) else {
            return out;
        };

        self.rooms.leave_all(connection_id, connection.rooms.iter());

        if let Some(user_id) = self.registry.unregister(connection_id) {
            self.broadcast_offline(user_id, &mut out);
        }
        out
    }

    pub fn dispatch(&mut self, from: ConnectionId, event: ClientEvent) -> Dispatch {
        let mut out = Dispatch::default();
        let sender = match self.connections.get(&from) {
            Some(connection) => connection.user_id.clone(),
            None => {
                tracing::debug!(connection_id = %from, event = event.event_name(), "Event from unknown connection");
                return out;
            }
        };

        match event {
            ClientEvent::Heartbeat => out.push(from, ServerEvent::HeartbeatAck),
            ClientEvent::Handshake(payload) => self.handshake(from, payload.user_id, &mut out),
            other if sender.is_none() => {
                tracing::debug!(
                    connection_id = %from,
                    event = other.event_name(),
                    "Ignoring event before handshake"
                );
            }
            ClientEvent::JoinRoom(room) => self.join(from, room),
            ClientEvent::TypingStart(room) => {
                let event = ServerEvent::TypingStart(room.clone());
                self.broadcast_room(from, &room, event, &mut out);
            }
            ClientEvent::TypingStop(room) => {
                let event = ServerEvent::TypingStop(room.clone());
                self.broadcast_room(from, &room, event, &mut out);
            }
            ClientEvent::MessageSent(message) => self.deliver_message(from, message, &mut out),
            ClientEvent::DeliveryAck(receipt) => {
                let members = receipt.chat_members.members();
                let event = ServerEvent::DeliveryUpdate(receipt.message_id);
                self.relay_receipt(sender.as_ref(), &members, event, &mut out);
            }
            ClientEvent::SeenAck(receipt) => {
                let members = receipt.chat_members.members();
                let event = ServerEvent::SeenUpdate(receipt.message_id);
                self.relay_receipt(sender.as_ref(), &members, event, &mut out);
            }
            ClientEvent::CallInitiate(payload) => self.relay_call(from, signaling::initiate(payload), &mut out),
            ClientEvent::CallAnswer(payload) => self.relay_call(from, signaling::answer(payload), &mut out),
            ClientEvent::CallReject(payload) => self.relay_call(from, signaling::reject(payload), &mut out),
            ClientEvent::CallEnd(payload) => self.relay_call(from, signaling::end(payload), &mut out),
        }
        out
    }

    fn handshake(&mut self, from: ConnectionId, user_id: UserId, out: &mut Dispatch) {
        if user_id.is_empty() {
            tracing::debug!(connection_id = %from, "Handshake without user id");
            return;
        }

        let previous = self.connections.get(&from).and_then(|c| c.user_id.clone());
        if let Some(previous) = previous.filter(|p| *p != user_id) {
            if self.registry.release(&previous, from) {
                self.broadcast_offline(previous, out);
            }
        }

        let registration = self.registry.register(user_id.clone(), from);
        if let Some(connection) = self.connections.get_mut(&from) {
            connection.user_id = Some(user_id.clone());
        }
        if let Some(superseded) = registration.superseded {
            tracing::info!(
                user_id = %user_id,
                connection_id = %from,
                superseded = %superseded,
                "Newer connection superseded previous session"
            );
        }

        let online = ServerEvent::PresenceOnline(self.registry.online_users());
        self.broadcast_all(online, out);
        out.push(
            from,
            ServerEvent::HandshakeAck(HandshakeAckPayload {
                connection_id: from,
                user_id,
            }),
        );
    }

    fn join(&mut self, from: ConnectionId, room: ChatId) {
        if self.rooms.join(from, room.clone()) {
            if let Some(connection) = self.connections.get_mut(&from) {
                connection.rooms.insert(room);
            }
        }
    }

    fn deliver_message(&mut self, from: ConnectionId, message: Value, out: &mut Dispatch) {
        let Some(routing) = MessageRouting::from_message(&message) else {
            tracing::debug!(connection_id = %from, "Dropping message without chat members or sender");
            return;
        };
        for recipient in routing.recipients() {
            self.direct(recipient, ServerEvent::MessageReceived(message.clone()), out);
        }
    }

    fn relay_receipt(
        &self,
        acker: Option<&UserId>,
        members: &ChatMembers,
        event: ServerEvent,
        out: &mut Dispatch,
    ) {
        for member in members.excluding(acker) {
            self.direct(member, event.clone(), out);
        }
    }

    fn relay_call(&self, from: ConnectionId, relayed: RelayedSignal, out: &mut Dispatch) {
        match self.registry.lookup(&relayed.target) {
            Some(target) if target == from => {
                tracing::debug!(connection_id = %from, "Ignoring call event addressed to its own connection");
            }
            Some(target) => out.push(target, relayed.event),
            None => {
                tracing::debug!(
                    target_user = %relayed.target,
                    event = relayed.event.event_name(),
                    "Call target offline, dropping"
                );
                out.dropped += 1;
            }
        }
    }

    /// Direct addressing through the registry, bypassing rooms.
    fn direct(&self, user_id: &UserId, event: ServerEvent, out: &mut Dispatch) {
        match self.registry.lookup(user_id) {
            Some(target) => out.push(target, event),
            None => {
                tracing::trace!(target_user = %user_id, event = event.event_name(), "Target offline, dropping");
                out.dropped += 1;
            }
        }
    }

    fn broadcast_room(&self, from: ConnectionId, room: &ChatId, event: ServerEvent, out: &mut Dispatch) {
        for target in self.rooms.members_except(room, from) {
            out.push(target, event.clone());
        }
    }

    fn broadcast_all(&self, event: ServerEvent, out: &mut Dispatch) {
        for target in self.connections.keys() {
            out.push(*target, event.clone());
        }
    }

    fn broadcast_offline(&self, user_id: UserId, out: &mut Dispatch) {
        self.broadcast_all(ServerEvent::PresenceOffline(user_id), out);
        self.broadcast_all(ServerEvent::PresenceOnline(self.registry.online_users()), out);
    }

    pub fn online_users(&self) -> Vec<UserId> {
        self.registry.online_users()
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn rooms(&self) -> &RoomRouter {
        &self.rooms
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn connection(&self, connection_id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&connection_id)
    }
}
