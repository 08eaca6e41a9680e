use bitflags::bitflags;
use glam::Vec2;

bitflags! {
    /// Bitset over component kinds. An entity's signature records which
    /// components it carries; a system's signature records which components
    /// it requires. Membership test: `(entity & required) == required`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Signature: u32 {
        const TRANSFORM    = 1 << 0;
        const VELOCITY     = 1 << 1;
        const INPUT        = 1 << 2;
        const PLAYER_ID    = 1 << 3;
        const VIEWPORT     = 1 << 4;
        const HEALTH       = 1 << 5;
        const INVULNERABLE = 1 << 6;
        const IMMORTAL     = 1 << 7;
        const ATTRACTION   = 1 << 8;
        const NETWORKED    = 1 << 9;
        const COLLIDER     = 1 << 10;
        const SPRITE       = 1 << 11;
        const PATTERN      = 1 << 12;
        const PROJECTILE   = 1 << 13;
        const ENEMY        = 1 << 14;
        const SCORE        = 1 << 15;
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature::empty()
    }
}

/// World pose. Required on every replicated entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: f32,
}

impl Transform {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

/// Per-tick displacement, integrated by the movement system.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity(pub Vec2);

/// Latest client-reported input state. Overwritten wholesale on every
/// `player_input` message; later arrivals win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Input {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub shoot: bool,
    pub charged_shoot: bool,
    pub detach: bool,
}

/// Binds an entity to the transport endpoint that controls it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerId {
    pub client_id: u32,
}

/// Client-reported screen dimensions, attached lazily on the first
/// `viewport` message. Absence means no movement clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    pub hp: i32,
    pub max_hp: i32,
}

impl Health {
    pub fn full(max_hp: i32) -> Self {
        Self { hp: max_hp, max_hp }
    }
}

/// Post-hit damage immunity window, decayed each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Invulnerable {
    pub remaining: f32,
}

/// Test-mode marker: the entity never takes damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Immortal;

/// Pulls input-bearing entities toward this entity's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attraction {
    pub force: f32,
    pub radius: f32,
}

/// Marker: the entity is replicated in snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Networked;

/// Axis-aligned collision box, centered on the entity's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub width: f32,
    pub height: f32,
}

/// Sprite metadata carried for the client's benefit; the server never
/// renders it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sprite {
    pub sprite_id: u32,
    pub width: u32,
    pub height: u32,
    pub animated: bool,
    pub frame_count: u32,
    pub frame_time: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternKind {
    #[default]
    None,
    Linear,
    Sinusoidal,
}

/// Movement pattern descriptor driving enemy motion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pattern {
    pub kind: PatternKind,
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projectile {
    pub owner: Option<super::Entity>,
    pub damage: i32,
}

/// Marker for config-spawned enemies, keyed by archetype id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enemy {
    pub archetype: String,
}

/// Per-player kill bookkeeping, reported in `lobby_end` scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Score {
    pub kills: u32,
}
