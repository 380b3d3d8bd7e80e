//! Presence and registry behaviour through the gateway actor.

use pretty_assertions::assert_eq;

use chat_realtime::domain::{ServerEvent, UserId};
use chat_realtime::presentation::websocket::Gateway;

use crate::common::{online, users, Peer};

#[tokio::test]
async fn test_presence_sequence_for_two_users() {
    let gateway = Gateway::spawn();

    let mut a = Peer::connect(&gateway);
    a.handshake("u1");
    assert_eq!(a.recv().await, ServerEvent::PresenceOnline(users(&["u1"])));
    assert!(matches!(a.recv().await, ServerEvent::HandshakeAck(ack) if ack.user_id == UserId::new("u1")));

    let mut b = Peer::connect(&gateway);
    b.handshake("u2");
    assert_eq!(a.recv().await, ServerEvent::PresenceOnline(users(&["u1", "u2"])));
    assert_eq!(b.recv().await, ServerEvent::PresenceOnline(users(&["u1", "u2"])));
    assert!(matches!(b.recv().await, ServerEvent::HandshakeAck(_)));

    b.disconnect();
    assert_eq!(a.recv().await, ServerEvent::PresenceOffline(UserId::new("u2")));
    assert_eq!(a.recv().await, ServerEvent::PresenceOnline(users(&["u1"])));
}

#[tokio::test]
async fn test_unregistered_connection_sees_presence_broadcasts() {
    let gateway = Gateway::spawn();
    let mut watcher = Peer::connect(&gateway);
    watcher.sync().await;

    let _u1 = online(&gateway, "u1").await;
    assert_eq!(watcher.recv().await, ServerEvent::PresenceOnline(users(&["u1"])));
}

#[tokio::test]
async fn test_stale_disconnect_keeps_newer_connection() {
    let gateway = Gateway::spawn();
    let mut observer = online(&gateway, "u2").await;

    let old = online(&gateway, "u1").await;
    let mut new = online(&gateway, "u1").await;
    observer.sync().await;

    old.disconnect();
    observer.assert_quiet().await;

    // Direct addressing still reaches the newer connection
    observer.send_frame(serde_json::json!({
        "t": "call-end",
        "d": { "targetUserId": "u1" }
    }));
    assert_eq!(new.recv().await, ServerEvent::CallLeave);
    assert_eq!(gateway.online_user_count(), 2);
}

#[tokio::test]
async fn test_rehandshake_as_other_user_releases_old_identity() {
    let gateway = Gateway::spawn();
    let mut observer = online(&gateway, "u9").await;
    let switching = online(&gateway, "u1").await;
    observer.sync().await;

    switching.handshake("u2");
    assert_eq!(observer.recv().await, ServerEvent::PresenceOffline(UserId::new("u1")));
    assert_eq!(observer.recv().await, ServerEvent::PresenceOnline(users(&["u9"])));
    assert_eq!(observer.recv().await, ServerEvent::PresenceOnline(users(&["u9", "u2"])));
}

#[tokio::test]
async fn test_events_before_handshake_are_ignored() {
    let gateway = Gateway::spawn();
    let mut u2 = online(&gateway, "u2").await;
    let mut anonymous = Peer::connect(&gateway);

    anonymous.send_frame(serde_json::json!({
        "t": "call-initiate",
        "d": { "targetUserId": "u2", "signal": {}, "callerId": "u1" }
    }));
    anonymous.assert_quiet().await;
    u2.assert_quiet().await;
}
