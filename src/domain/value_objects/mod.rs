//! # Value Objects
//!
//! Immutable identifier types shared by every layer.

mod ids;

pub use ids::{ChatId, ConnectionId, MessageId, UserId};
