mod component;
mod entity;
mod event;
mod storage;
mod system;
mod world;

pub use component::{
    Attraction, Collider, Enemy, Health, Immortal, Input, Invulnerable, Networked, Pattern,
    PatternKind, PlayerId, Projectile, Score, Signature, Sprite, Transform, Velocity, Viewport,
};
pub use entity::Entity;
pub use event::{EventBus, GameEvent, ShootEvent, SpawnEntityEvent, SpawnKind};
pub use storage::ComponentPool;
pub use system::System;
pub use world::{Component, World};
