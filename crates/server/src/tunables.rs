//! Gameplay constants shared by the server systems.

/// Simulation playfield. Clients report their own viewport for clamping;
/// these bounds drive spawn randomization and out-of-bounds culling.
pub const WORLD_WIDTH: f32 = 1920.0;
pub const WORLD_HEIGHT: f32 = 1080.0;

pub const PLAYER_SPEED: f32 = 200.0;
pub const PLAYER_SPAWN_X: f32 = 100.0;
pub const PLAYER_SPAWN_Y: f32 = 300.0;
pub const PLAYER_SPAWN_Y_OFFSET: f32 = 50.0;
pub const PLAYER_MAX_HP: i32 = 100;
pub const PLAYER_COLLIDER_WIDTH: f32 = 33.0;
pub const PLAYER_COLLIDER_HEIGHT: f32 = 17.0;
pub const PLAYER_SPRITE_ID: u32 = 1;
pub const PLAYER_SPRITE_WIDTH: u32 = 140;
pub const PLAYER_SPRITE_HEIGHT: u32 = 60;

/// 20 shots per second while the trigger is held.
pub const SHOOT_COOLDOWN: f32 = 0.05;
pub const MUZZLE_OFFSET_X: f32 = 110.0;
pub const MUZZLE_OFFSET_Y: f32 = 25.0;

pub const PROJECTILE_SPEED: f32 = 500.0;
pub const PROJECTILE_DAMAGE: i32 = 10;
pub const PROJECTILE_CHARGED_DAMAGE: i32 = 25;
pub const PROJECTILE_COLLIDER_WIDTH: f32 = 16.0;
pub const PROJECTILE_COLLIDER_HEIGHT: f32 = 8.0;
pub const PROJECTILE_SPRITE_ID: u32 = 2;

pub const ENEMY_CONTACT_DAMAGE: i32 = 25;
pub const HIT_INVULNERABILITY_SECS: f32 = 1.0;

/// Entities farther than this outside the playfield are culled.
pub const CULL_MARGIN: f32 = 200.0;

/// Test mode: spawned players never take damage.
pub const ENABLE_IMMORTAL_MODE: bool = false;
