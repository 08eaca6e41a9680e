use std::collections::HashMap;

use voidrun::{Entity, GameEvent, ShootEvent, Signature, System, World};

use crate::tunables::SHOOT_COOLDOWN;

/// Emits a [`ShootEvent`] for every input-bearing entity whose trigger is
/// held and whose cooldown has elapsed. The first shot of a press is
/// immediate; a held trigger then fires every [`SHOOT_COOLDOWN`] seconds.
pub struct ShootingSystem {
    time: f32,
    last_shot: HashMap<Entity, f32>,
}

impl ShootingSystem {
    pub fn new() -> Self {
        Self {
            time: 0.0,
            last_shot: HashMap::new(),
        }
    }

    fn can_shoot(&self, entity: Entity) -> bool {
        self.last_shot
            .get(&entity)
            .is_none_or(|&last| self.time - last >= SHOOT_COOLDOWN)
    }
}

impl System for ShootingSystem {
    fn update(&mut self, world: &mut World, dt: f32) {
        self.time += dt;

        for entity in world.entities_with_signature(self.signature()) {
            let Some(input) = world.inputs.get(entity).copied() else {
                continue;
            };
            if !(input.shoot || input.charged_shoot) {
                continue;
            }
            if !self.can_shoot(entity) {
                continue;
            }

            world.emit(GameEvent::Shoot(ShootEvent {
                shooter: entity,
                dx: 1.0,
                dy: 0.0,
                charged: input.charged_shoot,
            }));
            self.last_shot.insert(entity, self.time);
        }

        self.last_shot.retain(|&entity, _| world.is_alive(entity));
    }

    fn signature(&self) -> Signature {
        Signature::TRANSFORM | Signature::INPUT
    }
}
