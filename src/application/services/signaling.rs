//! Call Signaling Relay
//!
//! Stateless 1:1 forwarding of call lifecycle events. Each inbound call
//! event maps to exactly one outbound event addressed to a user id; the
//! signal blob is passed through untouched.

use crate::domain::{
    CallAnswerPayload, CallIncomingPayload, CallInitiatePayload, CallTargetPayload, ServerEvent,
    UserId,
};

/// A call event ready for direct delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedSignal {
    pub target: UserId,
    pub event: ServerEvent,
}

/// `call-initiate` → `call-incoming`
pub fn initiate(payload: CallInitiatePayload) -> RelayedSignal {
    RelayedSignal {
        target: payload.target_user_id,
        event: ServerEvent::CallIncoming(CallIncomingPayload {
            signal: payload.signal,
            caller_id: payload.caller_id,
            caller_name: payload.caller_name,
            is_video: payload.is_video,
        }),
    }
}

/// `call-answer` → `call-accepted`
pub fn answer(payload: CallAnswerPayload) -> RelayedSignal {
    RelayedSignal {
        target: payload.target_user_id,
        event: ServerEvent::CallAccepted(payload.signal),
    }
}

/// `call-reject` → `call-rejected`
pub fn reject(payload: CallTargetPayload) -> RelayedSignal {
    RelayedSignal {
        target: payload.target_user_id,
        event: ServerEvent::CallRejected,
    }
}

/// `call-end` → `call-leave`
pub fn end(payload: CallTargetPayload) -> RelayedSignal {
    RelayedSignal {
        target: payload.target_user_id,
        event: ServerEvent::CallLeave,
    }
}
