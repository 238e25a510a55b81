//! Change Notification Message Protocol
//!
//! Frames pushed by the dev server, one JSON object per WebSocket text frame:
//!
//! - `change`: a file changed; `value` is its path relative to the server root
//! - `stdin`: a line the server read from its stdin
//! - `broadcast`: a payload another client sent
//!
//! ```json
//! { "name": "change", "value": "styles/site.css" }
//! ```
//!
//! Outbound frames carry no envelope: a broadcast is sent as its raw JSON
//! payload and the server wraps it for the other clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inbound frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "value", rename_all = "lowercase")]
pub enum InboundMessage {
    /// File changed (server-relative path)
    Change(String),
    /// Server stdin line
    Stdin(String),
    /// Payload broadcast by another client
    Broadcast(Value),
}

impl InboundMessage {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Serialize an outbound broadcast payload.
pub fn encode_broadcast(payload: &Value) -> String {
    payload.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frames() {
        assert_eq!(
            InboundMessage::parse(r#"{"name":"change","value":"styles/site.css"}"#).unwrap(),
            InboundMessage::Change("styles/site.css".into())
        );
        assert_eq!(
            InboundMessage::parse(r#"{"name":"stdin","value":"hello"}"#).unwrap(),
            InboundMessage::Stdin("hello".into())
        );
        assert_eq!(
            InboundMessage::parse(r#"{"value":{"x":[1,2]},"name":"broadcast"}"#).unwrap(),
            InboundMessage::Broadcast(serde_json::json!({"x": [1, 2]}))
        );
    }

    #[test]
    fn test_reject_malformed() {
        assert!(InboundMessage::parse("not json").is_err());
        assert!(InboundMessage::parse(r#"{"name":"explode","value":1}"#).is_err());
        assert!(InboundMessage::parse(r#"{"name":"change","value":42}"#).is_err());
    }

    #[test]
    fn test_encode_broadcast_is_raw_payload() {
        let payload = serde_json::json!({"cursor": 3});
        assert_eq!(encode_broadcast(&payload), r#"{"cursor":3}"#);
    }
}
