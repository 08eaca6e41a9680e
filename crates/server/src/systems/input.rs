use glam::Vec2;

use voidrun::{Signature, System, Velocity, World};

use crate::tunables::PLAYER_SPEED;

/// Turns the latest client-reported input into a velocity. The velocity is
/// rewritten every tick, so a stale reordered input only holds for one tick
/// before the next poll re-establishes the current state.
pub struct InputMovementSystem;

impl System for InputMovementSystem {
    fn update(&mut self, world: &mut World, _dt: f32) {
        for entity in world.entities_with_signature(self.signature()) {
            let Some(input) = world.inputs.get(entity).copied() else {
                continue;
            };

            let mut direction = Vec2::ZERO;
            // Screen convention: up decreases y.
            if input.up {
                direction.y -= 1.0;
            }
            if input.down {
                direction.y += 1.0;
            }
            if input.left {
                direction.x -= 1.0;
            }
            if input.right {
                direction.x += 1.0;
            }

            let velocity = if direction.length_squared() > 0.0 {
                direction.normalize() * PLAYER_SPEED
            } else {
                Vec2::ZERO
            };

            if let Some(vel) = world.velocities.get_mut(entity) {
                *vel = Velocity(velocity);
            }
        }
    }

    fn signature(&self) -> Signature {
        Signature::TRANSFORM | Signature::VELOCITY | Signature::INPUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidrun::{Input, Transform};

    fn player(world: &mut World) -> voidrun::Entity {
        let entity = world.spawn();
        world.add(entity, Transform::at(100.0, 300.0));
        world.add(entity, Velocity::default());
        world.add(entity, Input::default());
        entity
    }

    #[test]
    fn up_input_moves_toward_smaller_y() {
        let mut world = World::new();
        let entity = player(&mut world);
        world.inputs.get_mut(entity).unwrap().up = true;

        InputMovementSystem.update(&mut world, 1.0 / 60.0);

        let velocity = world.velocities.get(entity).unwrap();
        assert_eq!(velocity.0.x, 0.0);
        assert_eq!(velocity.0.y, -PLAYER_SPEED);
    }

    #[test]
    fn released_input_zeroes_velocity() {
        let mut world = World::new();
        let entity = player(&mut world);
        world.inputs.get_mut(entity).unwrap().right = true;
        InputMovementSystem.update(&mut world, 1.0 / 60.0);
        assert!(world.velocities.get(entity).unwrap().0.x > 0.0);

        *world.inputs.get_mut(entity).unwrap() = Input::default();
        InputMovementSystem.update(&mut world, 1.0 / 60.0);
        assert_eq!(world.velocities.get(entity).unwrap().0, Vec2::ZERO);
    }

    #[test]
    fn diagonal_speed_is_not_faster() {
        let mut world = World::new();
        let entity = player(&mut world);
        let input = world.inputs.get_mut(entity).unwrap();
        input.up = true;
        input.right = true;

        InputMovementSystem.update(&mut world, 1.0 / 60.0);

        let speed = world.velocities.get(entity).unwrap().0.length();
        assert!((speed - PLAYER_SPEED).abs() < 0.01);
    }
}
