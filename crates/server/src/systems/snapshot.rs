use voidrun::{
    encode_server_message, snapshot_parts, EntityRecord, HealthState, Signature, TransformState,
    UdpTransport, VelocityState, World, MAX_SNAPSHOT_BYTES,
};

/// Assembles the authoritative view of all replicated entities and hands
/// the serialized bytes to the transport, once every `send_rate` ticks.
/// Runs after event dispatch so same-tick spawns are included.
pub struct SnapshotSystem {
    tick: u64,
    send_rate: u32,
}

impl SnapshotSystem {
    pub fn new(send_rate: u32) -> Self {
        Self {
            tick: 0,
            send_rate: send_rate.max(1),
        }
    }

    /// Every `Networked` entity's replicated state, in id order.
    pub fn assemble(world: &World) -> Vec<EntityRecord> {
        world
            .entities_with_signature(Signature::NETWORKED | Signature::TRANSFORM)
            .into_iter()
            .filter_map(|entity| {
                let transform = world.transforms.get(entity)?;
                Some(EntityRecord {
                    id: entity.id(),
                    transform: TransformState {
                        x: transform.position.x,
                        y: transform.position.y,
                        rotation: transform.rotation,
                        scale: transform.scale,
                    },
                    velocity: world.velocities.get(entity).map(|v| VelocityState {
                        dx: v.0.x,
                        dy: v.0.y,
                    }),
                    health: world.healths.get(entity).map(|h| HealthState {
                        hp: h.hp,
                        max_hp: h.max_hp,
                    }),
                })
            })
            .collect()
    }

    pub fn run(&mut self, world: &World, members: &[u32], transport: &UdpTransport) {
        self.tick += 1;
        if self.tick % self.send_rate as u64 != 0 {
            return;
        }

        let records = Self::assemble(world);
        for message in snapshot_parts(records, MAX_SNAPSHOT_BYTES) {
            match encode_server_message(&message) {
                Ok(text) => {
                    // Serialized once, sent to every member.
                    let bytes = transport.codec().serialize(&text);
                    for &member in members {
                        transport.send(&bytes, member);
                    }
                }
                Err(e) => log::error!("failed to encode snapshot: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidrun::{Health, Networked, Transform, Velocity};

    #[test]
    fn assemble_includes_only_networked_entities() {
        let mut world = World::new();

        let replicated = world.spawn();
        world.add(replicated, Transform::at(10.0, 20.0));
        world.add(replicated, Networked);

        let local_only = world.spawn();
        world.add(local_only, Transform::at(1.0, 2.0));

        let records = SnapshotSystem::assemble(&world);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, replicated.id());
        assert_eq!(records[0].transform.x, 10.0);
    }

    #[test]
    fn assemble_reflects_despawn() {
        let mut world = World::new();
        let entity = world.spawn();
        world.add(entity, Transform::at(10.0, 20.0));
        world.add(entity, Networked);

        assert_eq!(SnapshotSystem::assemble(&world).len(), 1);
        world.despawn(entity);
        assert!(SnapshotSystem::assemble(&world).is_empty());
    }

    #[test]
    fn optional_state_rides_along_when_present() {
        let mut world = World::new();
        let entity = world.spawn();
        world.add(entity, Transform::at(0.0, 0.0));
        world.add(entity, Velocity(glam::Vec2::new(3.0, 4.0)));
        world.add(entity, Health::full(100));
        world.add(entity, Networked);

        let records = SnapshotSystem::assemble(&world);
        assert_eq!(records[0].velocity.unwrap().dx, 3.0);
        assert_eq!(records[0].health.unwrap().max_hp, 100);
    }

    #[test]
    fn records_are_in_id_order() {
        let mut world = World::new();
        for _ in 0..5 {
            let entity = world.spawn();
            world.add(entity, Transform::default());
            world.add(entity, Networked);
        }

        let ids: Vec<u32> = SnapshotSystem::assemble(&world)
            .iter()
            .map(|r| r.id)
            .collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
