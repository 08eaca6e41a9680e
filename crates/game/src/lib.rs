pub mod config;
pub mod ecs;
pub mod net;
pub mod protocol;

pub use config::{
    ColliderConfig, ConfigError, EnemyConfig, EnemyConfigManager, EnemySpawn, LevelConfig,
    LevelConfigManager, WaveConfig,
};
pub use ecs::{
    Attraction, Collider, Component, ComponentPool, Enemy, Entity, EventBus, GameEvent, Health,
    Immortal, Input, Invulnerable, Networked, Pattern, PatternKind, PlayerId, Projectile, Score,
    ShootEvent, Signature, SpawnEntityEvent, SpawnKind, Sprite, System, Transform, Velocity,
    Viewport, World,
};
pub use net::{InboundPacket, PacketCodec, SafeQueue, UdpTransport, RECV_BUFFER_SIZE, SERVER_ENDPOINT_ID};
pub use protocol::{
    encode_client_message, encode_server_message, parse_client_message, parse_server_message,
    snapshot_parts, ClientMessage, Difficulty, EntityRecord, HealthState, InputState, LobbyAction,
    Position, ProtocolError, ServerMessage, TransformState, VelocityState, DEFAULT_PORT,
    DEFAULT_TICK_RATE, MAX_SNAPSHOT_BYTES, PING, PONG,
};
