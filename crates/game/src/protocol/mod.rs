mod message;
mod snapshot;

pub use message::{
    encode_client_message, encode_server_message, parse_client_message, parse_server_message,
    ClientMessage, Difficulty, InputState, LobbyAction, Position, ProtocolError, ServerMessage,
    DEFAULT_PORT, DEFAULT_TICK_RATE, PING, PONG,
};
pub use snapshot::{
    snapshot_parts, EntityRecord, HealthState, TransformState, VelocityState, MAX_SNAPSHOT_BYTES,
};
