//! Application Layer
//!
//! Realtime routing logic. The gateway side (registry, rooms, signaling
//! relay and the router that composes them) is synchronous and owned by a
//! single task; the client side is the per-user session controller.

pub mod services;
