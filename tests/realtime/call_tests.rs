//! Call signaling relay scenarios.

use pretty_assertions::assert_eq;
use serde_json::json;

use chat_realtime::domain::{CallIncomingPayload, ServerEvent, UserId};
use chat_realtime::presentation::websocket::Gateway;

use crate::common::online;

#[tokio::test]
async fn test_call_round_trip() {
    let gateway = Gateway::spawn();
    let mut u1 = online(&gateway, "u1").await;
    let mut u2 = online(&gateway, "u2").await;
    u1.sync().await;

    let offer = json!({ "type": "offer", "sdp": "v=0\r\no=- 1 2 IN IP4 127.0.0.1" });
    u1.send_frame(json!({
        "t": "call-initiate",
        "d": {
            "targetUserId": "u2",
            "signal": offer,
            "callerId": "u1",
            "callerName": "Ann",
            "isVideo": true
        }
    }));
    assert_eq!(
        u2.recv().await,
        ServerEvent::CallIncoming(CallIncomingPayload {
            signal: offer,
            caller_id: UserId::new("u1"),
            caller_name: Some("Ann".into()),
            is_video: true,
        })
    );

    let answer = json!({ "type": "answer", "sdp": "v=0" });
    u2.send_frame(json!({ "t": "call-answer", "d": { "targetUserId": "u1", "signal": answer } }));
    assert_eq!(u1.recv().await, ServerEvent::CallAccepted(answer));

    u1.send_frame(json!({ "t": "call-end", "d": { "targetUserId": "u2" } }));
    assert_eq!(u2.recv().await, ServerEvent::CallLeave);
    u1.assert_quiet().await;
}

#[tokio::test]
async fn test_reject_reaches_caller() {
    let gateway = Gateway::spawn();
    let mut u1 = online(&gateway, "u1").await;
    let u2 = online(&gateway, "u2").await;
    u1.sync().await;

    u2.send_frame(json!({ "t": "call-reject", "d": { "targetUserId": "u1" } }));
    assert_eq!(u1.recv().await, ServerEvent::CallRejected);
}

#[tokio::test]
async fn test_call_to_offline_user_is_dropped() {
    let gateway = Gateway::spawn();
    let mut u1 = online(&gateway, "u1").await;

    u1.send_frame(json!({
        "t": "call-initiate",
        "d": { "targetUserId": "nobody", "signal": {}, "callerId": "u1" }
    }));
    u1.assert_quiet().await;
}

#[tokio::test]
async fn test_call_to_self_is_not_echoed() {
    let gateway = Gateway::spawn();
    let mut u1 = online(&gateway, "u1").await;

    u1.send_frame(json!({ "t": "call-end", "d": { "targetUserId": "u1" } }));
    u1.assert_quiet().await;
}

#[tokio::test]
async fn test_disconnect_mid_call_sends_no_call_leave() {
    let gateway = Gateway::spawn();
    let u1 = online(&gateway, "u1").await;
    let mut u2 = online(&gateway, "u2").await;

    u1.send_frame(json!({
        "t": "call-initiate",
        "d": { "targetUserId": "u2", "signal": {}, "callerId": "u1" }
    }));
    assert!(matches!(u2.recv().await, ServerEvent::CallIncoming(_)));

    u1.disconnect();
    assert_eq!(u2.recv().await, ServerEvent::PresenceOffline(UserId::new("u1")));
    assert_eq!(u2.recv().await, ServerEvent::PresenceOnline(vec![UserId::new("u2")]));
    u2.assert_quiet().await;
}
