//! Application Services
//!
//! ## Available Services
//!
//! - **ConnectionRegistry**: user id to live connection, last write wins
//! - **RoomRouter**: chat-scoped broadcast groups
//! - **signaling**: stateless call event relay
//! - **EventRouter**: inbound event dispatch for the gateway
//! - **ClientSession**: peer-side session and call controller

pub mod client_session;
pub mod registry;
pub mod rooms;
pub mod router;
pub mod signaling;

pub use client_session::{
    ChatContext, ClientSession, LocalUser, MediaDevices, MediaError, MediaStream, Notification,
    PeerEndpoint, PeerError, PeerFactory, PeerRole, ReceiptState, Ringer, SessionDeps, SessionError,
};
pub use registry::{ConnectionRegistry, Registration};
pub use rooms::RoomRouter;
pub use router::{Delivery, Dispatch, EventRouter};
pub use signaling::RelayedSignal;
