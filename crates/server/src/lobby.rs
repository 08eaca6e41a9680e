use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;
use thiserror::Error;

use voidrun::{
    encode_server_message, Collider, Difficulty, Enemy, EnemyConfigManager, GameEvent, Health,
    Immortal, Input, LevelConfigManager, Networked, Pattern, PlayerId, Projectile, Score,
    ServerMessage, ShootEvent, Signature, SpawnEntityEvent, SpawnKind, Sprite, System, Transform,
    UdpTransport, Velocity, World,
};

use crate::systems::{
    AttractionSystem, CollisionSystem, InputMovementSystem, LifecycleSystem, MovementSystem,
    PatternSystem, ShootingSystem, SnapshotSystem, WaveSpawnSystem,
};
use crate::tunables::{
    ENABLE_IMMORTAL_MODE, MUZZLE_OFFSET_X, MUZZLE_OFFSET_Y, PLAYER_COLLIDER_HEIGHT,
    PLAYER_COLLIDER_WIDTH, PLAYER_MAX_HP, PLAYER_SPAWN_X, PLAYER_SPAWN_Y, PLAYER_SPAWN_Y_OFFSET,
    PLAYER_SPRITE_HEIGHT, PLAYER_SPRITE_ID, PLAYER_SPRITE_WIDTH, PROJECTILE_CHARGED_DAMAGE,
    PROJECTILE_COLLIDER_HEIGHT, PROJECTILE_COLLIDER_WIDTH, PROJECTILE_DAMAGE, PROJECTILE_SPEED,
    PROJECTILE_SPRITE_ID,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyState {
    Waiting,
    Running,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    LevelComplete,
    AllPlayersDead,
    Empty,
}

impl EndReason {
    fn as_str(self) -> &'static str {
        match self {
            EndReason::LevelComplete => "level complete",
            EndReason::AllPlayersDead => "all players dead",
            EndReason::Empty => "last player left",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LobbyError {
    #[error("Lobby not found: {0}")]
    NotFound(String),
    #[error("Lobby game already in progress")]
    InProgress,
    #[error("Already in a lobby")]
    AlreadyInLobby,
}

/// A game room: a bounded set of clients and their own simulation world.
/// `Waiting` lobbies are joinable and idle; `Running` lobbies tick their
/// system set at the server rate; `Ended` lobbies await the manager sweep.
pub struct Lobby {
    code: String,
    state: LobbyState,
    clients: Vec<u32>,
    difficulty: Difficulty,
    world: World,
    systems: Vec<Box<dyn System>>,
    snapshot: SnapshotSystem,
    level_id: Option<String>,
    scores: HashMap<u32, u32>,
    enemies: Arc<EnemyConfigManager>,
    levels: Arc<LevelConfigManager>,
}

impl Lobby {
    pub fn new(
        code: String,
        enemies: Arc<EnemyConfigManager>,
        levels: Arc<LevelConfigManager>,
        snapshot_rate: u32,
    ) -> Self {
        Self {
            code,
            state: LobbyState::Waiting,
            clients: Vec::new(),
            difficulty: Difficulty::default(),
            world: World::new(),
            systems: Vec::new(),
            snapshot: SnapshotSystem::new(snapshot_rate),
            level_id: None,
            scores: HashMap::new(),
            enemies,
            levels,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn state(&self) -> LobbyState {
        self.state
    }

    pub fn is_game_started(&self) -> bool {
        self.state != LobbyState::Waiting
    }

    pub fn clients(&self) -> &[u32] {
        &self.clients
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn contains(&self, client_id: u32) -> bool {
        self.clients.contains(&client_id)
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        log::info!("lobby {}: difficulty set to {:?}", self.code, difficulty);
    }

    pub fn add_client(&mut self, client_id: u32) -> bool {
        if self.clients.contains(&client_id) {
            return false;
        }
        self.clients.push(client_id);
        true
    }

    /// Remove a member, despawning their player entity if the game is
    /// running. Does not end the lobby; the manager owns that transition.
    pub fn remove_client(&mut self, client_id: u32) -> bool {
        let Some(index) = self.clients.iter().position(|&c| c == client_id) else {
            return false;
        };
        self.clients.remove(index);

        let players = self
            .world
            .entities_with_signature(Signature::PLAYER_ID);
        for entity in players {
            if self.world.player_ids.get(entity).map(|p| p.client_id) == Some(client_id) {
                if let Some(score) = self.world.scores.get(entity) {
                    self.scores.insert(client_id, score.kills);
                }
                self.world.despawn(entity);
            }
        }
        true
    }

    /// Instantiate the simulation system set and spawn one player entity
    /// per member, then begin ticking.
    pub fn start_game(&mut self) {
        if self.state != LobbyState::Waiting {
            return;
        }

        let mut systems: Vec<Box<dyn System>> = vec![
            Box::new(InputMovementSystem),
            Box::new(PatternSystem::new()),
            Box::new(AttractionSystem),
            Box::new(MovementSystem),
            Box::new(ShootingSystem::new()),
        ];
        match self.levels.first() {
            Some(level) => {
                self.level_id = Some(level.id.clone());
                systems.push(Box::new(WaveSpawnSystem::new(level)));
            }
            None => log::warn!("lobby {}: no levels configured, skipping waves", self.code),
        }
        systems.push(Box::new(CollisionSystem));
        systems.push(Box::new(LifecycleSystem));
        self.systems = systems;

        for (index, &client_id) in self.clients.iter().enumerate() {
            let entity = self.world.spawn();
            self.world.add(
                entity,
                Transform::at(
                    PLAYER_SPAWN_X,
                    PLAYER_SPAWN_Y + index as f32 * PLAYER_SPAWN_Y_OFFSET,
                ),
            );
            self.world.add(entity, Velocity::default());
            self.world.add(entity, Input::default());
            self.world.add(entity, PlayerId { client_id });
            self.world.add(entity, Health::full(PLAYER_MAX_HP));
            self.world.add(
                entity,
                Collider {
                    width: PLAYER_COLLIDER_WIDTH,
                    height: PLAYER_COLLIDER_HEIGHT,
                },
            );
            self.world.add(entity, Score::default());
            self.world.add(
                entity,
                Sprite {
                    sprite_id: PLAYER_SPRITE_ID,
                    width: PLAYER_SPRITE_WIDTH,
                    height: PLAYER_SPRITE_HEIGHT,
                    ..Sprite::default()
                },
            );
            self.world.add(entity, Networked);
            if ENABLE_IMMORTAL_MODE {
                self.world.add(entity, Immortal);
            }
        }

        self.state = LobbyState::Running;
        log::info!(
            "lobby {}: game started with {} players",
            self.code,
            self.clients.len()
        );
    }

    /// One simulation step: run the system set, drain the event bus, then
    /// hand the snapshot to the transport. Idle unless running.
    pub fn tick(&mut self, dt: f32, transport: &UdpTransport) {
        if self.state != LobbyState::Running {
            return;
        }
        for system in &mut self.systems {
            system.update(&mut self.world, dt);
        }
        self.dispatch_events(transport);
        if self.state == LobbyState::Running {
            self.snapshot.run(&self.world, &self.clients, transport);
        }
    }

    /// Serialize once, send to every member.
    pub fn broadcast(&self, transport: &UdpTransport, message: &ServerMessage) {
        match encode_server_message(message) {
            Ok(text) => {
                let bytes = transport.codec().serialize(&text);
                for &client_id in &self.clients {
                    transport.send(&bytes, client_id);
                }
            }
            Err(e) => log::error!("lobby {}: failed to encode broadcast: {}", self.code, e),
        }
    }

    /// Terminal transition: capture scores, notify members, stop ticking.
    pub fn end(&mut self, transport: &UdpTransport, reason: EndReason) {
        if self.state == LobbyState::Ended {
            return;
        }
        for entity in self.world.entities_with_signature(Signature::PLAYER_ID) {
            let Some(player) = self.world.player_ids.get(entity) else {
                continue;
            };
            let kills = self.world.scores.get(entity).map_or(0, |s| s.kills);
            self.scores.insert(player.client_id, kills);
        }
        self.state = LobbyState::Ended;
        self.broadcast(
            transport,
            &ServerMessage::LobbyEnd {
                scores: self.score_table(),
            },
        );
        log::info!("lobby {}: ended ({})", self.code, reason.as_str());
    }

    fn score_table(&self) -> serde_json::Value {
        let mut scores = serde_json::Map::new();
        for (&client_id, &kills) in &self.scores {
            scores.insert(client_id.to_string(), serde_json::Value::from(kills));
        }
        serde_json::Value::Object(scores)
    }

    fn dispatch_events(&mut self, transport: &UdpTransport) {
        while let Some(event) = self.world.next_event() {
            match event {
                GameEvent::Shoot(shot) => self.handle_shoot(shot),
                GameEvent::Spawn(spawn) => self.handle_spawn(spawn),
                GameEvent::PlayerDead { client_id, kills } => {
                    self.scores.insert(client_id, kills);
                    self.broadcast(
                        transport,
                        &ServerMessage::PlayerDead {
                            payload: serde_json::json!({ "client_id": client_id, "kills": kills }),
                        },
                    );
                    if self
                        .world
                        .entities_with_signature(Signature::PLAYER_ID)
                        .is_empty()
                    {
                        self.end(transport, EndReason::AllPlayersDead);
                    }
                }
                GameEvent::LevelComplete => {
                    let current = self.level_id.clone().unwrap_or_default();
                    let next = self
                        .levels
                        .next_after(&current)
                        .map(|level| level.id.clone())
                        .unwrap_or_default();
                    self.broadcast(
                        transport,
                        &ServerMessage::LevelComplete {
                            current_level: current,
                            next_level: next,
                        },
                    );
                    self.end(transport, EndReason::LevelComplete);
                }
            }
        }
    }

    fn handle_shoot(&mut self, shot: ShootEvent) {
        if !self.world.is_alive(shot.shooter) {
            return;
        }
        let Some(origin) = self.world.transforms.get(shot.shooter).map(|t| t.position) else {
            return;
        };
        self.world.emit(GameEvent::Spawn(SpawnEntityEvent {
            kind: SpawnKind::Projectile {
                charged: shot.charged,
                dx: shot.dx,
                dy: shot.dy,
            },
            x: origin.x + MUZZLE_OFFSET_X,
            y: origin.y + MUZZLE_OFFSET_Y,
            owner: Some(shot.shooter),
        }));
    }

    fn handle_spawn(&mut self, spawn: SpawnEntityEvent) {
        match spawn.kind {
            SpawnKind::Projectile { charged, dx, dy } => {
                let entity = self.world.spawn();
                self.world.add(entity, Transform::at(spawn.x, spawn.y));
                self.world
                    .add(entity, Velocity(Vec2::new(dx, dy) * PROJECTILE_SPEED));
                self.world.add(
                    entity,
                    Collider {
                        width: PROJECTILE_COLLIDER_WIDTH,
                        height: PROJECTILE_COLLIDER_HEIGHT,
                    },
                );
                self.world.add(
                    entity,
                    Projectile {
                        owner: spawn.owner,
                        damage: if charged {
                            PROJECTILE_CHARGED_DAMAGE
                        } else {
                            PROJECTILE_DAMAGE
                        },
                    },
                );
                self.world.add(
                    entity,
                    Sprite {
                        sprite_id: PROJECTILE_SPRITE_ID,
                        width: PROJECTILE_COLLIDER_WIDTH as u32,
                        height: PROJECTILE_COLLIDER_HEIGHT as u32,
                        ..Sprite::default()
                    },
                );
                self.world.add(entity, Networked);
            }
            SpawnKind::Enemy { archetype } => {
                let Some(config) = self.enemies.get(&archetype) else {
                    log::warn!(
                        "lobby {}: unknown enemy archetype '{}'",
                        self.code,
                        archetype
                    );
                    return;
                };
                let multiplier = self.difficulty.hp_multiplier();
                let hp = (config.health.hp as f32 * multiplier).round().max(1.0) as i32;
                let max_hp = (config.health.max_hp as f32 * multiplier).round().max(1.0) as i32;
                let collider = config.collider();

                let entity = self.world.spawn();
                self.world.add(
                    entity,
                    Transform {
                        position: Vec2::new(spawn.x, spawn.y),
                        rotation: 0.0,
                        scale: config.transform.scale,
                    },
                );
                self.world.add(
                    entity,
                    Velocity(Vec2::new(config.velocity.dx, config.velocity.dy)),
                );
                self.world.add(entity, Health { hp, max_hp });
                self.world.add(
                    entity,
                    Collider {
                        width: collider.width,
                        height: collider.height,
                    },
                );
                self.world.add(
                    entity,
                    Sprite {
                        sprite_id: config.sprite.sprite_id,
                        width: config.sprite.width,
                        height: config.sprite.height,
                        animated: config.sprite.animated,
                        frame_count: config.sprite.frame_count,
                        frame_time: config.sprite.frame_time,
                    },
                );
                self.world.add(
                    entity,
                    Pattern {
                        kind: config.pattern.kind(),
                        amplitude: config.pattern.amplitude,
                        frequency: config.pattern.frequency,
                        phase: 0.0,
                    },
                );
                self.world.add(entity, Enemy { archetype });
                self.world.add(entity, Networked);
            }
        }
    }
}

/// Owns every lobby and the client-to-lobby mapping. Codes are short
/// monotonic strings; a client belongs to at most one lobby at a time.
pub struct LobbyManager {
    lobbies: HashMap<String, Lobby>,
    client_lobbies: HashMap<u32, String>,
    next_code: u32,
    snapshot_rate: u32,
    enemies: Arc<EnemyConfigManager>,
    levels: Arc<LevelConfigManager>,
}

impl LobbyManager {
    pub fn new(enemies: Arc<EnemyConfigManager>, levels: Arc<LevelConfigManager>) -> Self {
        Self::with_snapshot_rate(enemies, levels, 1)
    }

    pub fn with_snapshot_rate(
        enemies: Arc<EnemyConfigManager>,
        levels: Arc<LevelConfigManager>,
        snapshot_rate: u32,
    ) -> Self {
        Self {
            lobbies: HashMap::new(),
            client_lobbies: HashMap::new(),
            next_code: 1,
            snapshot_rate,
            enemies,
            levels,
        }
    }

    pub fn create_lobby(&mut self) -> String {
        let code = self.next_code.to_string();
        self.next_code += 1;
        let lobby = Lobby::new(
            code.clone(),
            Arc::clone(&self.enemies),
            Arc::clone(&self.levels),
            self.snapshot_rate,
        );
        self.lobbies.insert(code.clone(), lobby);
        log::info!("created lobby {}", code);
        code
    }

    pub fn join_lobby(&mut self, code: &str, client_id: u32) -> Result<(), LobbyError> {
        if self.client_lobbies.contains_key(&client_id) {
            return Err(LobbyError::AlreadyInLobby);
        }
        let lobby = self
            .lobbies
            .get_mut(code)
            .ok_or_else(|| LobbyError::NotFound(code.to_owned()))?;
        if lobby.is_game_started() {
            return Err(LobbyError::InProgress);
        }
        lobby.add_client(client_id);
        self.client_lobbies.insert(client_id, code.to_owned());
        log::info!("client {} joined lobby {}", client_id, code);
        Ok(())
    }

    /// Remove the client from their lobby, ending the lobby when it
    /// empties. Returns the code of the lobby left, if any.
    pub fn leave_lobby(&mut self, client_id: u32, transport: &UdpTransport) -> Option<String> {
        let code = self.client_lobbies.remove(&client_id)?;
        if let Some(lobby) = self.lobbies.get_mut(&code) {
            lobby.remove_client(client_id);
            log::info!("client {} left lobby {}", client_id, code);
            if lobby.client_count() == 0 {
                lobby.end(transport, EndReason::Empty);
            }
        }
        Some(code)
    }

    pub fn get_lobby(&self, code: &str) -> Option<&Lobby> {
        self.lobbies.get(code)
    }

    pub fn get_lobby_mut(&mut self, code: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(code)
    }

    pub fn client_lobby(&mut self, client_id: u32) -> Option<&mut Lobby> {
        let code = self.client_lobbies.get(&client_id)?.clone();
        self.lobbies.get_mut(&code)
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    pub fn tick_all(&mut self, dt: f32, transport: &UdpTransport) {
        for lobby in self.lobbies.values_mut() {
            lobby.tick(dt, transport);
        }
    }

    /// Destroy lobbies that reached `Ended` and clear their member
    /// mappings, so stale messages for them are ignored.
    pub fn reap_ended(&mut self) {
        let ended: Vec<String> = self
            .lobbies
            .iter()
            .filter(|(_, lobby)| lobby.state() == LobbyState::Ended)
            .map(|(code, _)| code.clone())
            .collect();
        for code in ended {
            self.lobbies.remove(&code);
            self.client_lobbies.retain(|_, c| *c != code);
            log::info!("destroyed lobby {}", code);
        }
    }
}
