//! Realtime frames.
//!
//! Every frame is a single JSON object with a `type` discriminator. `change`
//! frames are serialized straight from `domain::ChangeEvent`.

use serde::{Deserialize, Serialize};

/// Frames a client may send.
///
/// Unknown types fail to parse and are dropped by the handler.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe {
        #[serde(default)]
        session_id: String,
        #[serde(default)]
        token: String,
    },
}

/// Frames the server sends outside of change events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Welcome,
    Subscribed { session_id: String },
    Error { message: String },
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // enum of plain strings; serialization cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{\"type\":\"error\"}"))
    }
}
