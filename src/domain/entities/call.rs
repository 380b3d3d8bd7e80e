//! Call session and call-log entities.
//!
//! The gateway holds no call state; a `CallSession` exists only inside a
//! client's session controller. It carries the remote party's id for the
//! whole lifecycle so that ending a call never depends on which chat happens
//! to be open.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{ChatId, UserId};
use crate::shared::error::AppError;

/// Which side placed the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallDirection {
    Outgoing,
    Incoming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPhase {
    /// Offer sent or received, waiting for the callee.
    Ringing,
    /// Answer in flight, peer endpoint negotiating.
    Connecting,
    Active,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSession {
    pub local_user_id: UserId,
    pub remote_user_id: UserId,
    pub remote_name: Option<String>,
    pub direction: CallDirection,
    pub phase: CallPhase,
    pub is_video: bool,
    pub started_at: Option<DateTime<Utc>>,
}

impl CallSession {
    pub fn outgoing(local: UserId, remote: UserId, remote_name: Option<String>, is_video: bool) -> Self {
        Self {
            local_user_id: local,
            remote_user_id: remote,
            remote_name,
            direction: CallDirection::Outgoing,
            phase: CallPhase::Ringing,
            is_video,
            started_at: None,
        }
    }

    pub fn incoming(local: UserId, remote: UserId, remote_name: Option<String>, is_video: bool) -> Self {
        Self {
            direction: CallDirection::Incoming,
            ..Self::outgoing(local, remote, remote_name, is_video)
        }
    }

    pub fn mark_active(&mut self, now: DateTime<Utc>) {
        self.phase = CallPhase::Active;
        self.started_at.get_or_insert(now);
    }

    /// Time since the call connected, `None` if it never did.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.started_at.map(|started| now - started)
    }

    pub fn call_type(&self) -> CallType {
        if self.is_video {
            CallType::Video
        } else {
            CallType::Audio
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallType {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallStatus {
    Ended,
}

/// Call-log record persisted through the external message API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    pub chat_id: ChatId,
    pub call_duration: String,
    pub call_status: CallStatus,
    pub call_type: CallType,
}

impl CallLog {
    pub fn ended(chat_id: ChatId, session: &CallSession, now: DateTime<Utc>) -> Self {
        Self {
            chat_id,
            call_duration: session
                .elapsed(now)
                .map(format_call_duration)
                .unwrap_or_else(|| "0:00".to_string()),
            call_status: CallStatus::Ended,
            call_type: session.call_type(),
        }
    }
}

/// Renders a duration as `m:ss`, never shorter than one second.
pub fn format_call_duration(elapsed: Duration) -> String {
    let total_seconds = elapsed.num_seconds().max(1);
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

/// Persistence endpoint for call logs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallLogRepository: Send + Sync {
    /// Store a call log. Returns the persisted log message when the API
    /// echoes one back, so it can be relayed to the chat's members.
    async fn log_call(&self, log: &CallLog) -> Result<Option<Value>, AppError>;
}
