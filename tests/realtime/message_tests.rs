//! Message delivery, receipts and typing through the gateway actor.

use pretty_assertions::assert_eq;
use serde_json::json;

use chat_realtime::domain::{ChatId, ClientEvent, MessageId, ServerEvent};
use chat_realtime::presentation::websocket::Gateway;

use crate::common::{chat_message, online};

#[tokio::test]
async fn test_message_reaches_online_members_except_sender() {
    let gateway = Gateway::spawn();
    let mut u1 = online(&gateway, "u1").await;
    let mut u2 = online(&gateway, "u2").await;
    let mut u3 = online(&gateway, "u3").await;
    u1.sync().await;
    u2.sync().await;

    let message = chat_message("m1", "c1", "u1", &["u1", "u2", "u4"]);
    u1.send(ClientEvent::MessageSent(message.clone()));

    assert_eq!(u2.recv().await, ServerEvent::MessageReceived(message));
    u1.assert_quiet().await;
    u3.assert_quiet().await;
}

#[tokio::test]
async fn test_message_without_members_is_dropped() {
    let gateway = Gateway::spawn();
    let u1 = online(&gateway, "u1").await;
    let mut u2 = online(&gateway, "u2").await;

    u1.send(ClientEvent::MessageSent(json!({ "_id": "m1", "sender": { "_id": "u1" } })));
    u2.assert_quiet().await;
}

#[tokio::test]
async fn test_duplicate_member_gets_one_copy() {
    let gateway = Gateway::spawn();
    let u1 = online(&gateway, "u1").await;
    let mut u2 = online(&gateway, "u2").await;

    let message = chat_message("m1", "c1", "u1", &["u1", "u2", "u2"]);
    u1.send(ClientEvent::MessageSent(message.clone()));
    assert_eq!(u2.recv().await, ServerEvent::MessageReceived(message));
    u2.assert_quiet().await;
}

#[tokio::test]
async fn test_seen_receipt_goes_to_other_members() {
    let gateway = Gateway::spawn();
    let mut u1 = online(&gateway, "u1").await;
    let mut u2 = online(&gateway, "u2").await;
    u1.sync().await;

    u2.send_frame(json!({
        "t": "seen-ack",
        "d": { "messageId": "m1", "chat": { "_id": "c1", "users": ["u1", "u2"] } }
    }));
    assert_eq!(u1.recv().await, ServerEvent::SeenUpdate(MessageId::new("m1")));
    u2.assert_quiet().await;
}

#[tokio::test]
async fn test_typing_is_scoped_to_room() {
    let gateway = Gateway::spawn();
    let mut u1 = online(&gateway, "u1").await;
    let mut u2 = online(&gateway, "u2").await;
    let mut u3 = online(&gateway, "u3").await;
    u1.sync().await;
    u2.sync().await;

    let room = ChatId::new("room-1");
    u1.send(ClientEvent::JoinRoom(room.clone()));
    u2.send(ClientEvent::JoinRoom(room.clone()));
    u2.send(ClientEvent::JoinRoom(room.clone()));
    u3.send(ClientEvent::JoinRoom(ChatId::new("room-2")));

    u1.send(ClientEvent::TypingStart(room.clone()));
    assert_eq!(u2.recv().await, ServerEvent::TypingStart(room.clone()));
    u2.assert_quiet().await;
    u1.assert_quiet().await;
    u3.assert_quiet().await;

    u1.send(ClientEvent::TypingStop(room.clone()));
    assert_eq!(u2.recv().await, ServerEvent::TypingStop(room));
}

#[tokio::test]
async fn test_disconnect_leaves_rooms() {
    let gateway = Gateway::spawn();
    let u1 = online(&gateway, "u1").await;
    let mut u2 = online(&gateway, "u2").await;

    let room = ChatId::new("room-1");
    u1.send(ClientEvent::JoinRoom(room.clone()));
    u2.send(ClientEvent::JoinRoom(room.clone()));
    u1.disconnect();
    u2.sync().await;

    u2.send(ClientEvent::TypingStart(room));
    u2.assert_quiet().await;
}
