use std::collections::VecDeque;

use super::Entity;

/// A shot was triggered by an input-bearing entity. `dx`/`dy` give the
/// normalized fire direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShootEvent {
    pub shooter: Entity,
    pub dx: f32,
    pub dy: f32,
    pub charged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnKind {
    Projectile { charged: bool, dx: f32, dy: f32 },
    Enemy { archetype: String },
}

/// Request to materialize an entity at a world position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnEntityEvent {
    pub kind: SpawnKind,
    pub x: f32,
    pub y: f32,
    pub owner: Option<Entity>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Shoot(ShootEvent),
    Spawn(SpawnEntityEvent),
    PlayerDead { client_id: u32, kills: u32 },
    LevelComplete,
}

/// Synchronous per-tick event queue. Systems emit during their update;
/// the owner drains the queue after the whole system batch ran, and
/// handlers may emit further events, which are drained in the same pass.
/// Entities spawned by handlers are therefore visible to the tick's
/// snapshot.
#[derive(Debug, Default)]
pub struct EventBus {
    queue: VecDeque<GameEvent>,
}

impl EventBus {
    pub fn emit(&mut self, event: GameEvent) {
        self.queue.push_back(event);
    }

    pub fn pop(&mut self) -> Option<GameEvent> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
