//! WebSocket protocol message definitions
//! These are the wire types for client-server communication.
//!
//! Every frame is a JSON envelope `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::game::{Player, PlayerId};

/// Greeting sent once per connection
pub const GREETING: &str = "Hello welcome";

/// Directional input as last reported by a client.
/// Missing flags read as "not pressed".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

/// Messages sent from client to server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientMsg {
    /// Latest held directions, replaces the previous set wholesale
    ClientUpdate(Controls),

    /// Rotate state backwards (Paper -> Rock)
    PreviousState,

    /// Rotate state forwards (Rock -> Paper)
    NextState,
}

/// Messages sent from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerMsg {
    /// Welcome message after connection
    Message { message: String },

    /// Full world snapshot, sent every tick.
    /// Two parallel arrays instead of a map so clients without generic
    /// dictionary support can decode it.
    #[serde(rename_all = "camelCase")]
    State {
        player_ids: Vec<PlayerId>,
        players: Vec<Player>,
    },
}

impl ServerMsg {
    pub fn greeting() -> Self {
        ServerMsg::Message {
            message: GREETING.to_string(),
        }
    }
}

/// Parse a client text frame
pub fn parse_client_msg(text: &str) -> Result<ClientMsg, serde_json::Error> {
    // Bare rotation events may arrive with a payload the client attached out of habit
    let mut value: serde_json::Value = serde_json::from_str(text)?;
    if let Some(obj) = value.as_object_mut() {
        let is_rotation = matches!(
            obj.get("event").and_then(|e| e.as_str()),
            Some("previousState" | "nextState")
        );
        if is_rotation {
            obj.remove("data");
        }
    }
    serde_json::from_value(value)
}
