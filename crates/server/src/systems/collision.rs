use glam::Vec2;

use voidrun::{Collider, Entity, Invulnerable, Signature, System, World};

use crate::tunables::{ENEMY_CONTACT_DAMAGE, HIT_INVULNERABILITY_SECS};

fn overlaps(a_pos: Vec2, a: Collider, b_pos: Vec2, b: Collider) -> bool {
    // Boxes are centered on the entity position.
    (a_pos.x - b_pos.x).abs() * 2.0 <= a.width + b.width
        && (a_pos.y - b_pos.y).abs() * 2.0 <= a.height + b.height
}

/// AABB collision resolution: projectiles damage enemies (crediting the
/// owner's score on a lethal hit), and enemy contact damages players that
/// are neither invulnerable nor immortal.
pub struct CollisionSystem;

impl CollisionSystem {
    fn boxes(world: &World, required: Signature) -> Vec<(Entity, Vec2, Collider)> {
        world
            .entities_with_signature(required | Signature::TRANSFORM | Signature::COLLIDER)
            .into_iter()
            .filter_map(|entity| {
                let position = world.transforms.get(entity)?.position;
                let collider = *world.colliders.get(entity)?;
                Some((entity, position, collider))
            })
            .collect()
    }
}

impl System for CollisionSystem {
    fn update(&mut self, world: &mut World, _dt: f32) {
        let projectiles = Self::boxes(world, Signature::PROJECTILE);
        let enemies = Self::boxes(world, Signature::ENEMY | Signature::HEALTH);

        for (projectile, p_pos, p_col) in &projectiles {
            let Some(shot) = world.projectiles.get(*projectile).copied() else {
                continue;
            };
            for (enemy, e_pos, e_col) in &enemies {
                if !world.is_alive(*enemy) || !overlaps(*p_pos, *p_col, *e_pos, *e_col) {
                    continue;
                }

                let lethal = {
                    let Some(health) = world.healths.get_mut(*enemy) else {
                        continue;
                    };
                    if health.hp <= 0 {
                        // Already dead, awaiting lifecycle cleanup.
                        continue;
                    }
                    health.hp -= shot.damage;
                    health.hp <= 0
                };
                if lethal {
                    if let Some(owner) = shot.owner {
                        if let Some(score) = world.scores.get_mut(owner) {
                            score.kills += 1;
                        }
                    }
                }

                world.despawn(*projectile);
                break;
            }
        }

        let players = Self::boxes(world, Signature::PLAYER_ID | Signature::HEALTH);
        for (player, pl_pos, pl_col) in &players {
            if world.invulnerables.contains(*player) || world.immortals.contains(*player) {
                continue;
            }
            for (enemy, e_pos, e_col) in &enemies {
                if !world.is_alive(*enemy) || !overlaps(*pl_pos, *pl_col, *e_pos, *e_col) {
                    continue;
                }
                if let Some(health) = world.healths.get_mut(*player) {
                    health.hp -= ENEMY_CONTACT_DAMAGE;
                }
                world.add(
                    *player,
                    Invulnerable {
                        remaining: HIT_INVULNERABILITY_SECS,
                    },
                );
                break;
            }
        }
    }

    fn signature(&self) -> Signature {
        Signature::TRANSFORM | Signature::COLLIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidrun::{Enemy, Health, Immortal, PlayerId, Projectile, Score, Transform};

    fn enemy_at(world: &mut World, x: f32, y: f32, hp: i32) -> Entity {
        let entity = world.spawn();
        world.add(entity, Transform::at(x, y));
        world.add(
            entity,
            Enemy {
                archetype: "enemy_red".to_owned(),
            },
        );
        world.add(entity, Health::full(hp));
        world.add(
            entity,
            Collider {
                width: 32.0,
                height: 32.0,
            },
        );
        entity
    }

    fn projectile_at(world: &mut World, x: f32, y: f32, owner: Option<Entity>) -> Entity {
        let entity = world.spawn();
        world.add(entity, Transform::at(x, y));
        world.add(entity, Projectile { owner, damage: 10 });
        world.add(
            entity,
            Collider {
                width: 16.0,
                height: 8.0,
            },
        );
        entity
    }

    fn player_at(world: &mut World, x: f32, y: f32) -> Entity {
        let entity = world.spawn();
        world.add(entity, Transform::at(x, y));
        world.add(entity, PlayerId { client_id: 1 });
        world.add(entity, Health::full(100));
        world.add(entity, Score::default());
        world.add(
            entity,
            Collider {
                width: 33.0,
                height: 17.0,
            },
        );
        entity
    }

    #[test]
    fn projectile_damages_enemy_and_despawns() {
        let mut world = World::new();
        let enemy = enemy_at(&mut world, 100.0, 100.0, 30);
        let projectile = projectile_at(&mut world, 105.0, 100.0, None);

        CollisionSystem.update(&mut world, 1.0 / 60.0);

        assert_eq!(world.healths.get(enemy).unwrap().hp, 20);
        assert!(!world.is_alive(projectile));
    }

    #[test]
    fn lethal_hit_credits_owner_score() {
        let mut world = World::new();
        let player = player_at(&mut world, 0.0, 0.0);
        let enemy = enemy_at(&mut world, 500.0, 100.0, 10);
        projectile_at(&mut world, 505.0, 100.0, Some(player));

        CollisionSystem.update(&mut world, 1.0 / 60.0);

        assert!(world.healths.get(enemy).unwrap().hp <= 0);
        assert_eq!(world.scores.get(player).unwrap().kills, 1);
    }

    #[test]
    fn missed_projectile_survives() {
        let mut world = World::new();
        enemy_at(&mut world, 100.0, 100.0, 30);
        let projectile = projectile_at(&mut world, 400.0, 400.0, None);

        CollisionSystem.update(&mut world, 1.0 / 60.0);

        assert!(world.is_alive(projectile));
    }

    #[test]
    fn enemy_contact_damages_player_once_then_invulnerable() {
        let mut world = World::new();
        let player = player_at(&mut world, 100.0, 100.0);
        enemy_at(&mut world, 105.0, 100.0, 30);

        CollisionSystem.update(&mut world, 1.0 / 60.0);
        assert_eq!(world.healths.get(player).unwrap().hp, 100 - ENEMY_CONTACT_DAMAGE);
        assert!(world.invulnerables.contains(player));

        // Still overlapping next tick, but the window protects the player.
        CollisionSystem.update(&mut world, 1.0 / 60.0);
        assert_eq!(world.healths.get(player).unwrap().hp, 100 - ENEMY_CONTACT_DAMAGE);
    }

    #[test]
    fn immortal_player_takes_no_damage() {
        let mut world = World::new();
        let player = player_at(&mut world, 100.0, 100.0);
        world.add(player, Immortal);
        enemy_at(&mut world, 105.0, 100.0, 30);

        CollisionSystem.update(&mut world, 1.0 / 60.0);

        assert_eq!(world.healths.get(player).unwrap().hp, 100);
    }
}
