//! WebSocket Message Codec
//!
//! Text frames carry one JSON event each: `{"t": name, "d": payload}`.

use crate::domain::{ClientEvent, ServerEvent};

pub fn decode(text: &str) -> Result<ClientEvent, serde_json::Error> {
    serde_json::from_str(text)
}

pub fn encode(event: &ServerEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(event)
}
