use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::snapshot::EntityRecord;

pub const DEFAULT_PORT: u16 = 4242;
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Transport-liveness tokens exchanged outside the JSON framing.
pub const PING: &str = "PING";
pub const PONG: &str = "PONG";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("message has no 'type' field")]
    MissingType,
    #[error("unknown type '{0}'")]
    UnknownType(String),
    #[error("invalid '{kind}' message: {source}")]
    InvalidFields {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ProtocolError {
    /// Compact reason string suitable for an `error` reply.
    pub fn reply_reason(&self) -> &'static str {
        match self {
            ProtocolError::Malformed(_) => "malformed message",
            ProtocolError::MissingType => "missing type",
            ProtocolError::UnknownType(_) => "unknown type",
            ProtocolError::InvalidFields { .. } => "invalid message",
        }
    }
}

/// Wire shape of the `input` object inside `player_input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputState {
    #[serde(default)]
    pub up: bool,
    #[serde(default)]
    pub down: bool,
    #[serde(default)]
    pub left: bool,
    #[serde(default)]
    pub right: bool,
    #[serde(default)]
    pub shoot: bool,
    #[serde(default, rename = "chargedShoot")]
    pub charged_shoot: bool,
    #[serde(default)]
    pub detach: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Expert,
}

impl Difficulty {
    /// Enemy hit-point multiplier applied at spawn time.
    pub fn hp_multiplier(self) -> f32 {
        match self {
            Difficulty::Easy => 0.75,
            Difficulty::Medium => 1.0,
            Difficulty::Expert => 1.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LobbyAction {
    #[default]
    Create,
    Join,
}

/// Game-level messages a client sends to the server. All carry a `type`
/// discriminator on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Connect,
    Disconnect,
    RequestLobby {
        #[serde(default)]
        action: LobbyAction,
        #[serde(default)]
        lobby_code: Option<String>,
    },
    LeaveLobby,
    StartGame,
    Viewport {
        width: u32,
        height: u32,
    },
    PlayerInput {
        #[serde(default)]
        entity_id: u32,
        input: InputState,
    },
    SetDifficulty {
        difficulty: Difficulty,
    },
    Chat {
        content: String,
    },
}

/// Game-level messages the server sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        client_id: u32,
        message: String,
    },
    LobbyJoined {
        code: String,
    },
    LobbyState {
        code: String,
        player_count: u32,
    },
    LobbyLeft,
    LobbyMessage {
        message: String,
        duration: u32,
    },
    LobbyEnd {
        scores: serde_json::Value,
    },
    GameStarted,
    EntityCreated {
        entity_id: u32,
        position: Position,
    },
    EntityUpdate {
        entity_id: u32,
        position: Position,
        rotation: f32,
        last_processed_input: u32,
    },
    Snapshot {
        entities: Vec<EntityRecord>,
        #[serde(default)]
        part: u32,
        #[serde(default = "one")]
        parts: u32,
    },
    LevelComplete {
        #[serde(rename = "currentLevel")]
        current_level: String,
        #[serde(rename = "nextLevel")]
        next_level: String,
    },
    PlayerDead {
        payload: serde_json::Value,
    },
    Chat {
        sender_id: u32,
        content: String,
    },
    Error {
        message: String,
    },
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

const CLIENT_TYPES: &[&str] = &[
    "connect",
    "disconnect",
    "request_lobby",
    "leave_lobby",
    "start_game",
    "viewport",
    "player_input",
    "set_difficulty",
    "chat",
];

const SERVER_TYPES: &[&str] = &[
    "welcome",
    "lobby_joined",
    "lobby_state",
    "lobby_left",
    "lobby_message",
    "lobby_end",
    "game_started",
    "entity_created",
    "entity_update",
    "snapshot",
    "level_complete",
    "player_dead",
    "chat",
    "error",
];

fn parse<T: serde::de::DeserializeOwned>(
    text: &str,
    known_types: &[&str],
) -> Result<T, ProtocolError> {
    let value: serde_json::Value = serde_json::from_str(text).map_err(ProtocolError::Malformed)?;
    let Some(kind) = value.get("type").and_then(|t| t.as_str()) else {
        return Err(ProtocolError::MissingType);
    };
    if !known_types.contains(&kind) {
        return Err(ProtocolError::UnknownType(kind.to_owned()));
    }
    let kind = kind.to_owned();
    serde_json::from_value(value).map_err(|source| ProtocolError::InvalidFields { kind, source })
}

pub fn parse_client_message(text: &str) -> Result<ClientMessage, ProtocolError> {
    parse(text, CLIENT_TYPES)
}

pub fn parse_server_message(text: &str) -> Result<ServerMessage, ProtocolError> {
    parse(text, SERVER_TYPES)
}

pub fn encode_client_message(message: &ClientMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Malformed)
}

pub fn encode_server_message(message: &ServerMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Malformed)
}
