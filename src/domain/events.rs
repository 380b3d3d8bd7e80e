//! Realtime events.
//!
//! Every frame is an adjacently tagged union: `{"t": name, "d": payload}`.
//! Signaling payloads and message objects are opaque `Value`s, forwarded
//! without inspection.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::entities::ChatMembers;
use super::value_objects::{ChatId, ConnectionId, MessageId, UserId};

/// Events a client sends to the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "t", content = "d", rename_all = "kebab-case")]
pub enum ClientEvent {
    Handshake(HandshakePayload),
    JoinRoom(ChatId),
    TypingStart(ChatId),
    TypingStop(ChatId),
    MessageSent(Value),
    DeliveryAck(ReceiptPayload),
    SeenAck(ReceiptPayload),
    CallInitiate(CallInitiatePayload),
    CallAnswer(CallAnswerPayload),
    CallReject(CallTargetPayload),
    CallEnd(CallTargetPayload),
    Heartbeat,
}

impl ClientEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientEvent::Handshake(_) => "handshake",
            ClientEvent::JoinRoom(_) => "join-room",
            ClientEvent::TypingStart(_) => "typing-start",
            ClientEvent::TypingStop(_) => "typing-stop",
            ClientEvent::MessageSent(_) => "message-sent",
            ClientEvent::DeliveryAck(_) => "delivery-ack",
            ClientEvent::SeenAck(_) => "seen-ack",
            ClientEvent::CallInitiate(_) => "call-initiate",
            ClientEvent::CallAnswer(_) => "call-answer",
            ClientEvent::CallReject(_) => "call-reject",
            ClientEvent::CallEnd(_) => "call-end",
            ClientEvent::Heartbeat => "heartbeat",
        }
    }
}

/// Events the gateway delivers to a client.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "t", content = "d", rename_all = "kebab-case")]
pub enum ServerEvent {
    HandshakeAck(HandshakeAckPayload),
    PresenceOnline(Vec<UserId>),
    PresenceOffline(UserId),
    TypingStart(ChatId),
    TypingStop(ChatId),
    MessageReceived(Value),
    DeliveryUpdate(MessageId),
    SeenUpdate(MessageId),
    CallIncoming(CallIncomingPayload),
    CallAccepted(Value),
    CallRejected,
    CallLeave,
    HeartbeatAck,
}

impl ServerEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::HandshakeAck(_) => "handshake-ack",
            ServerEvent::PresenceOnline(_) => "presence-online",
            ServerEvent::PresenceOffline(_) => "presence-offline",
            ServerEvent::TypingStart(_) => "typing-start",
            ServerEvent::TypingStop(_) => "typing-stop",
            ServerEvent::MessageReceived(_) => "message-received",
            ServerEvent::DeliveryUpdate(_) => "delivery-update",
            ServerEvent::SeenUpdate(_) => "seen-update",
            ServerEvent::CallIncoming(_) => "call-incoming",
            ServerEvent::CallAccepted(_) => "call-accepted",
            ServerEvent::CallRejected => "call-rejected",
            ServerEvent::CallLeave => "call-leave",
            ServerEvent::HeartbeatAck => "heartbeat-ack",
        }
    }
}

/// Handshake user payload. Only the id is used; the rest is ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandshakePayload {
    #[serde(rename = "_id", alias = "id", alias = "userId")]
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeAckPayload {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
}

/// Delivery / seen receipt.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    pub message_id: MessageId,
    #[serde(alias = "chat", default)]
    pub chat_members: ChatMembersWire,
}

/// Receipt member list; unparseable shapes degrade to an empty list.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ChatMembersWire(Vec<UserId>);

impl ChatMembersWire {
    pub fn members(&self) -> ChatMembers {
        ChatMembers::from_ids(self.0.iter().cloned())
    }
}

impl From<ChatMembers> for ChatMembersWire {
    fn from(members: ChatMembers) -> Self {
        Self(members.iter().cloned().collect())
    }
}

impl<'de> Deserialize<'de> for ChatMembersWire {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let members: ChatMembers = serde_json::from_value(raw).unwrap_or_default();
        Ok(members.into())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInitiatePayload {
    pub target_user_id: UserId,
    pub signal: Value,
    pub caller_id: UserId,
    #[serde(default)]
    pub caller_name: Option<String>,
    #[serde(default)]
    pub is_video: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallAnswerPayload {
    pub target_user_id: UserId,
    pub signal: Value,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTargetPayload {
    pub target_user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallIncomingPayload {
    pub signal: Value,
    pub caller_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub caller_name: Option<String>,
    pub is_video: bool,
}
