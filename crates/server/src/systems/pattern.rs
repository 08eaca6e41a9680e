use std::f32::consts::TAU;

use voidrun::{PatternKind, Signature, System, World};

/// Drives configured enemy movement patterns. Sinusoidal patterns modulate
/// the vertical velocity around the archetype's base course; linear and
/// pattern-less enemies keep their config velocity untouched.
pub struct PatternSystem {
    time: f32,
}

impl PatternSystem {
    pub fn new() -> Self {
        Self { time: 0.0 }
    }
}

impl System for PatternSystem {
    fn update(&mut self, world: &mut World, dt: f32) {
        self.time += dt;

        for entity in world.entities_with_signature(self.signature()) {
            let Some(pattern) = world.patterns.get(entity).copied() else {
                continue;
            };
            if pattern.kind != PatternKind::Sinusoidal {
                continue;
            }
            if let Some(velocity) = world.velocities.get_mut(entity) {
                velocity.0.y =
                    pattern.amplitude * (TAU * pattern.frequency * self.time + pattern.phase).sin();
            }
        }
    }

    fn signature(&self) -> Signature {
        Signature::PATTERN | Signature::VELOCITY
    }
}
