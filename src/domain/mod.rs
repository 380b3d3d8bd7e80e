//! # Domain Layer
//!
//! Core types of the realtime layer, independent of the transport.
//!
//! ## Structure
//!
//! - **entities**: connections, chat membership, call sessions and logs
//! - **value_objects**: identifier types
//! - **events**: the inbound and outbound realtime event unions
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository traits define data access contracts
//! - Opaque payloads (signals, message objects) stay `serde_json::Value`

pub mod entities;
pub mod events;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use events::*;
pub use value_objects::*;
