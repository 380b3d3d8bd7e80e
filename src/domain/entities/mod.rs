//! # Domain Entities
//!
//! - **Connection**: one live realtime session and the rooms it joined
//! - **Chat membership**: participant lists attached to chat events
//! - **Call session / call log**: client-side call lifecycle and its record
//!
//! ## Repository Traits
//!
//! `CallLogRepository` defines the one persistence contract this layer
//! consumes. It is implemented in the infrastructure layer.

mod call;
mod chat;
mod connection;

pub use call::{
    format_call_duration, CallDirection, CallLog, CallLogRepository, CallPhase, CallSession,
    CallStatus, CallType,
};
#[cfg(test)]
pub use call::MockCallLogRepository;
pub use chat::{message_chat_id, message_key, ChatMembers, MessageRouting};
pub use connection::{Connection, ConnectionPhase};
