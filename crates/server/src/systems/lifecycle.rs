use voidrun::{GameEvent, Invulnerable, Signature, System, World};

use crate::tunables::{CULL_MARGIN, WORLD_HEIGHT, WORLD_WIDTH};

/// End-of-tick bookkeeping: decays invulnerability windows, culls entities
/// that left the playfield, and despawns anything whose health ran out.
/// Player deaths are reported through the event bus so the lobby can notify
/// clients.
pub struct LifecycleSystem;

impl System for LifecycleSystem {
    fn update(&mut self, world: &mut World, dt: f32) {
        // Invulnerability decay.
        let mut expired = Vec::new();
        for entity in world.entities_with_signature(Signature::INVULNERABLE) {
            if let Some(window) = world.invulnerables.get_mut(entity) {
                window.remaining -= dt;
                if window.remaining <= 0.0 {
                    expired.push(entity);
                }
            }
        }
        for entity in expired {
            world.remove::<Invulnerable>(entity);
        }

        // Out-of-bounds culling. Projectiles fly off the right edge,
        // enemies march off the left.
        let mut culled = Vec::new();
        for entity in world.entities_with_signature(Signature::PROJECTILE | Signature::TRANSFORM) {
            let Some(position) = world.transforms.get(entity).map(|t| t.position) else {
                continue;
            };
            if position.x > WORLD_WIDTH + CULL_MARGIN
                || position.x < -CULL_MARGIN
                || position.y > WORLD_HEIGHT + CULL_MARGIN
                || position.y < -CULL_MARGIN
            {
                culled.push(entity);
            }
        }
        for entity in world.entities_with_signature(Signature::ENEMY | Signature::TRANSFORM) {
            let Some(position) = world.transforms.get(entity).map(|t| t.position) else {
                continue;
            };
            if position.x < -CULL_MARGIN {
                culled.push(entity);
            }
        }
        for entity in culled {
            world.despawn(entity);
        }

        // Deaths.
        let mut dead = Vec::new();
        for entity in world.entities_with_signature(Signature::HEALTH) {
            let Some(health) = world.healths.get(entity) else {
                continue;
            };
            if health.hp <= 0 {
                dead.push(entity);
            }
        }
        for entity in dead {
            if let Some(player) = world.player_ids.get(entity).copied() {
                let kills = world.scores.get(entity).map_or(0, |s| s.kills);
                world.emit(GameEvent::PlayerDead {
                    client_id: player.client_id,
                    kills,
                });
            }
            world.despawn(entity);
        }
    }

    fn signature(&self) -> Signature {
        Signature::HEALTH
    }
}
