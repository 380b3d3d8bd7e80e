//! Chat membership as seen by the realtime layer.
//!
//! The authoritative member list lives in the external chat store; clients
//! attach it to the events they emit. Several payload shapes are accepted
//! because the HTTP API returns populated user objects while lighter
//! clients send bare ids.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::value_objects::{ChatId, UserId};

/// A chat participant reference: either a bare id or a user object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum MemberRef {
    Id(UserId),
    Object {
        #[serde(rename = "_id", alias = "id")]
        id: UserId,
    },
}

impl MemberRef {
    fn into_user_id(self) -> UserId {
        match self {
            MemberRef::Id(id) | MemberRef::Object { id } => id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MembersRepr {
    List(Vec<MemberRef>),
    Chat { users: Vec<MemberRef> },
}

/// Participant user ids of one chat, in payload order, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "MembersRepr")]
pub struct ChatMembers(Vec<UserId>);

impl From<MembersRepr> for ChatMembers {
    fn from(repr: MembersRepr) -> Self {
        let refs = match repr {
            MembersRepr::List(refs) | MembersRepr::Chat { users: refs } => refs,
        };
        Self::from_ids(refs.into_iter().map(MemberRef::into_user_id))
    }
}

impl ChatMembers {
    pub fn from_ids(ids: impl IntoIterator<Item = UserId>) -> Self {
        let mut members: Vec<UserId> = Vec::new();
        for id in ids {
            if !id.is_empty() && !members.contains(&id) {
                members.push(id);
            }
        }
        Self(members)
    }

    /// Members other than `user`.
    pub fn excluding<'a>(&'a self, user: Option<&'a UserId>) -> impl Iterator<Item = &'a UserId> {
        self.0.iter().filter(move |m| Some(*m) != user)
    }

    pub fn contains(&self, user: &UserId) -> bool {
        self.0.contains(user)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct ChatRef {
    #[serde(rename = "_id", alias = "id", default)]
    id: Option<ChatId>,
    users: Vec<MemberRef>,
}

#[derive(Debug, Deserialize)]
struct MessageShape {
    chat: ChatRef,
    sender: MemberRef,
    #[serde(rename = "_id", alias = "id", default)]
    id: Option<Value>,
}

/// Routing facts extracted from an opaque `message-sent` object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRouting {
    pub chat_id: Option<ChatId>,
    pub sender: UserId,
    pub members: ChatMembers,
}

impl MessageRouting {
    /// Returns `None` when the chat, its users or the sender are missing.
    pub fn from_message(message: &Value) -> Option<Self> {
        let shape: MessageShape = serde_json::from_value(message.clone()).ok()?;
        let sender = shape.sender.into_user_id();
        if sender.is_empty() {
            return None;
        }
        Some(Self {
            chat_id: shape.chat.id,
            sender,
            members: ChatMembers::from_ids(shape.chat.users.into_iter().map(MemberRef::into_user_id)),
        })
    }

    /// Recipients of the message: every member except the sender.
    pub fn recipients(&self) -> impl Iterator<Item = &UserId> {
        self.members.excluding(Some(&self.sender))
    }
}

/// The `_id` of a message object, rendered as a string.
pub fn message_key(message: &Value) -> Option<String> {
    let shape: MessageShape = serde_json::from_value(message.clone()).ok()?;
    match shape.id? {
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// The chat id of a message object, if present.
pub fn message_chat_id(message: &Value) -> Option<ChatId> {
    let chat = message.get("chat")?;
    let id = chat.get("_id").or_else(|| chat.get("id"))?;
    id.as_str().map(ChatId::new)
}
