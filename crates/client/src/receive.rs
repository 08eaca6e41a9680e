use voidrun::{
    parse_server_message, Entity, Health, Position, ServerMessage, Transform, UdpTransport,
    Velocity, World, PONG,
};

type Callback0 = Box<dyn FnMut()>;
type CallbackStr = Box<dyn FnMut(&str)>;

#[derive(Default)]
struct Callbacks {
    game_started: Option<Callback0>,
    lobby_joined: Option<CallbackStr>,
    lobby_state: Option<Box<dyn FnMut(&str, u32)>>,
    lobby_left: Option<Callback0>,
    lobby_message: Option<Box<dyn FnMut(&str, u32)>>,
    lobby_end: Option<Box<dyn FnMut(&serde_json::Value)>>,
    level_complete: Option<Box<dyn FnMut(&str, &str)>>,
    player_dead: Option<Box<dyn FnMut(&serde_json::Value)>>,
    chat: Option<Box<dyn FnMut(u32, &str)>>,
    error: Option<CallbackStr>,
}

/// Applies server messages to the local world: snapshots (including
/// multi-part ones, merged by entity id) and entity updates reconcile
/// replicated state; lifecycle messages are forwarded to typed callbacks
/// registered by the UI layer. This system holds no UI state of its own.
#[derive(Default)]
pub struct ClientNetworkReceiveSystem {
    client_id: Option<u32>,
    accept_snapshots: bool,
    last_processed_input: u32,
    callbacks: Callbacks,
}

impl ClientNetworkReceiveSystem {
    pub fn new() -> Self {
        Self {
            accept_snapshots: true,
            ..Self::default()
        }
    }

    pub fn client_id(&self) -> Option<u32> {
        self.client_id
    }

    /// The most recent input acknowledgement reported by the server.
    /// Recorded for future reconciliation; not used to rewind yet.
    pub fn last_processed_input(&self) -> u32 {
        self.last_processed_input
    }

    pub fn set_accept_snapshots(&mut self, accept: bool) {
        self.accept_snapshots = accept;
    }

    pub fn set_game_started_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.game_started = Some(Box::new(callback));
    }

    pub fn set_lobby_joined_callback(&mut self, callback: impl FnMut(&str) + 'static) {
        self.callbacks.lobby_joined = Some(Box::new(callback));
    }

    pub fn set_lobby_state_callback(&mut self, callback: impl FnMut(&str, u32) + 'static) {
        self.callbacks.lobby_state = Some(Box::new(callback));
    }

    pub fn set_lobby_left_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callbacks.lobby_left = Some(Box::new(callback));
    }

    pub fn set_lobby_message_callback(&mut self, callback: impl FnMut(&str, u32) + 'static) {
        self.callbacks.lobby_message = Some(Box::new(callback));
    }

    pub fn set_lobby_end_callback(
        &mut self,
        callback: impl FnMut(&serde_json::Value) + 'static,
    ) {
        self.callbacks.lobby_end = Some(Box::new(callback));
    }

    pub fn set_level_complete_callback(&mut self, callback: impl FnMut(&str, &str) + 'static) {
        self.callbacks.level_complete = Some(Box::new(callback));
    }

    pub fn set_player_dead_callback(
        &mut self,
        callback: impl FnMut(&serde_json::Value) + 'static,
    ) {
        self.callbacks.player_dead = Some(Box::new(callback));
    }

    pub fn set_chat_callback(&mut self, callback: impl FnMut(u32, &str) + 'static) {
        self.callbacks.chat = Some(Box::new(callback));
    }

    pub fn set_error_callback(&mut self, callback: impl FnMut(&str) + 'static) {
        self.callbacks.error = Some(Box::new(callback));
    }

    /// Drain the transport and apply everything that arrived.
    pub fn update(&mut self, world: &mut World, transport: &UdpTransport) {
        while let Some(packet) = transport.poll() {
            let Some(text) = transport.codec().deserialize(&packet.payload) else {
                log::warn!("malformed bytes from server");
                continue;
            };
            if text.is_empty() {
                continue;
            }
            if text == PONG {
                log::trace!("pong");
                continue;
            }
            match parse_server_message(&text) {
                Ok(message) => self.apply(message, world),
                Err(e) => log::warn!("bad server message: {}", e),
            }
        }
    }

    pub fn apply(&mut self, message: ServerMessage, world: &mut World) {
        match message {
            ServerMessage::Welcome { client_id, message } => {
                self.client_id = Some(client_id);
                log::info!("connected as client {}: {}", client_id, message);
            }
            ServerMessage::Snapshot { entities, .. } => {
                if self.accept_snapshots {
                    self.apply_snapshot(&entities, world);
                }
            }
            ServerMessage::EntityCreated {
                entity_id,
                position,
            } => {
                let entity = world.spawn_with_id(entity_id);
                world.add(entity, Transform::at(position.x, position.y));
            }
            ServerMessage::EntityUpdate {
                entity_id,
                position,
                rotation,
                last_processed_input,
            } => {
                self.apply_entity_update(entity_id, position, rotation, world);
                self.last_processed_input = last_processed_input;
            }
            ServerMessage::GameStarted => {
                if let Some(callback) = &mut self.callbacks.game_started {
                    callback();
                }
            }
            ServerMessage::LobbyJoined { code } => {
                if let Some(callback) = &mut self.callbacks.lobby_joined {
                    callback(&code);
                }
            }
            ServerMessage::LobbyState { code, player_count } => {
                if let Some(callback) = &mut self.callbacks.lobby_state {
                    callback(&code, player_count);
                }
            }
            ServerMessage::LobbyLeft => {
                if let Some(callback) = &mut self.callbacks.lobby_left {
                    callback();
                }
            }
            ServerMessage::LobbyMessage { message, duration } => {
                if let Some(callback) = &mut self.callbacks.lobby_message {
                    callback(&message, duration);
                }
            }
            ServerMessage::LobbyEnd { scores } => {
                if let Some(callback) = &mut self.callbacks.lobby_end {
                    callback(&scores);
                }
            }
            ServerMessage::LevelComplete {
                current_level,
                next_level,
            } => {
                if let Some(callback) = &mut self.callbacks.level_complete {
                    callback(&current_level, &next_level);
                }
            }
            ServerMessage::PlayerDead { payload } => {
                if let Some(callback) = &mut self.callbacks.player_dead {
                    callback(&payload);
                }
            }
            ServerMessage::Chat { sender_id, content } => {
                if let Some(callback) = &mut self.callbacks.chat {
                    callback(sender_id, &content);
                }
            }
            ServerMessage::Error { message } => {
                log::warn!("server error: {}", message);
                if let Some(callback) = &mut self.callbacks.error {
                    callback(&message);
                }
            }
        }
    }

    fn apply_snapshot(&mut self, records: &[voidrun::EntityRecord], world: &mut World) {
        for record in records {
            let entity = Entity(record.id);
            if !world.is_alive(entity) {
                world.spawn_with_id(record.id);
            }

            if let Some(transform) = world.transforms.get_mut(entity) {
                transform.position.x = record.transform.x;
                transform.position.y = record.transform.y;
                transform.rotation = record.transform.rotation;
                transform.scale = record.transform.scale;
            } else {
                world.add(
                    entity,
                    Transform {
                        position: glam::Vec2::new(record.transform.x, record.transform.y),
                        rotation: record.transform.rotation,
                        scale: record.transform.scale,
                    },
                );
            }

            if let Some(velocity) = record.velocity {
                let value = Velocity(glam::Vec2::new(velocity.dx, velocity.dy));
                match world.velocities.get_mut(entity) {
                    Some(current) => *current = value,
                    None => world.add(entity, value),
                }
            }
            if let Some(health) = record.health {
                let value = Health {
                    hp: health.hp,
                    max_hp: health.max_hp,
                };
                match world.healths.get_mut(entity) {
                    Some(current) => *current = value,
                    None => world.add(entity, value),
                }
            }
        }
    }

    fn apply_entity_update(
        &mut self,
        entity_id: u32,
        position: Position,
        rotation: f32,
        world: &mut World,
    ) {
        let entity = Entity(entity_id);
        let Some(transform) = world.transforms.get_mut(entity) else {
            return;
        };
        transform.position.x = position.x;
        transform.position.y = position.y;
        transform.rotation = rotation;
    }
}
