use voidrun::{Signature, System, World};

/// Integrates velocities into transforms, then clamps entities that have
/// reported a viewport to their own screen bounds.
pub struct MovementSystem;

impl System for MovementSystem {
    fn update(&mut self, world: &mut World, dt: f32) {
        for entity in world.entities_with_signature(self.signature()) {
            let Some(velocity) = world.velocities.get(entity).copied() else {
                continue;
            };
            let viewport = world.viewports.get(entity).copied();

            if let Some(transform) = world.transforms.get_mut(entity) {
                transform.position += velocity.0 * dt;
                if let Some(viewport) = viewport {
                    transform.position.x = transform.position.x.clamp(0.0, viewport.width as f32);
                    transform.position.y = transform.position.y.clamp(0.0, viewport.height as f32);
                }
            }
        }
    }

    fn signature(&self) -> Signature {
        Signature::TRANSFORM | Signature::VELOCITY
    }
}
