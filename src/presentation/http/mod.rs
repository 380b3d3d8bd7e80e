//! HTTP surface: banner, health probes, metrics and the WebSocket upgrade.

pub mod handlers;
pub mod routes;
