//! WebSocket Gateway
//!
//! Real-time communication via WebSocket connections.

pub mod gateway;
pub mod handler;
pub mod messages;
pub mod session;

pub use gateway::{EventReceiver, EventSender, Gateway, GatewayCommand};
pub use handler::ws_handler;
pub use session::SessionState;
