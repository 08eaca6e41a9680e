use voidrun::{Signature, System, World};

/// Pulls input-bearing entities toward attraction emitters (boss tractor
/// projectiles). The displacement is applied directly to the transform:
/// the input system rewrites velocities every tick, so routing the pull
/// through `Velocity` would be erased before integration.
pub struct AttractionSystem;

impl System for AttractionSystem {
    fn update(&mut self, world: &mut World, dt: f32) {
        let emitters = world.entities_with_signature(self.signature());
        let targets =
            world.entities_with_signature(Signature::INPUT | Signature::TRANSFORM);

        for emitter in emitters {
            let Some(attraction) = world.attractions.get(emitter).copied() else {
                continue;
            };
            if attraction.force <= 0.0 || attraction.radius <= 0.0 {
                continue;
            }
            let Some(center) = world.transforms.get(emitter).map(|t| t.position) else {
                continue;
            };

            for &target in &targets {
                if target == emitter {
                    continue;
                }
                let Some(transform) = world.transforms.get_mut(target) else {
                    continue;
                };
                let offset = center - transform.position;
                let distance = offset.length();
                if distance > 0.0 && distance <= attraction.radius {
                    transform.position += (offset / distance) * attraction.force * dt;
                }
            }
        }
    }

    fn signature(&self) -> Signature {
        Signature::ATTRACTION | Signature::TRANSFORM
    }
}
