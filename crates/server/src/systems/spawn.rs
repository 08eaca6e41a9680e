use rand::Rng;

use voidrun::{
    EnemySpawn, GameEvent, LevelConfig, Signature, SpawnEntityEvent, SpawnKind, System, World,
};

use crate::tunables::{WORLD_HEIGHT, WORLD_WIDTH};

const SPAWN_EDGE_MARGIN: f32 = 64.0;

#[derive(Debug, Clone)]
struct ScheduledSpawn {
    at: f32,
    spawn: EnemySpawn,
}

/// Drives a level's wave plan against a monotonic level clock. Spawn
/// entries are scheduled at `wave.start_time + spawn.delay`; entries with
/// identical times fire in config order. Once every entry has fired and
/// the last enemy is gone, the level is complete.
pub struct WaveSpawnSystem {
    level_time: f32,
    schedule: Vec<ScheduledSpawn>,
    cursor: usize,
    completed: bool,
}

impl WaveSpawnSystem {
    pub fn new(level: &LevelConfig) -> Self {
        let mut schedule = Vec::new();
        for wave in &level.waves {
            for spawn in &wave.spawns {
                schedule.push(ScheduledSpawn {
                    at: wave.start_time + spawn.delay,
                    spawn: spawn.clone(),
                });
            }
        }
        // Stable sort keeps config order for equal times.
        schedule.sort_by(|a, b| a.at.total_cmp(&b.at));

        Self {
            level_time: 0.0,
            schedule,
            cursor: 0,
            completed: false,
        }
    }

    pub fn finished_spawning(&self) -> bool {
        self.cursor >= self.schedule.len()
    }

    fn emit_group(spawn: &EnemySpawn, world: &mut World) {
        let mut rng = rand::thread_rng();
        let base_x = if spawn.x < 0.0 {
            rng.gen_range(WORLD_WIDTH * 0.5..WORLD_WIDTH - SPAWN_EDGE_MARGIN)
        } else {
            spawn.x
        };
        let base_y = if spawn.y < 0.0 {
            rng.gen_range(SPAWN_EDGE_MARGIN..WORLD_HEIGHT - SPAWN_EDGE_MARGIN)
        } else {
            spawn.y
        };

        for index in 0..spawn.count {
            world.emit(GameEvent::Spawn(SpawnEntityEvent {
                kind: SpawnKind::Enemy {
                    archetype: spawn.enemy_type.clone(),
                },
                x: base_x,
                y: base_y + index as f32 * spawn.spacing,
                owner: None,
            }));
        }
    }
}

impl System for WaveSpawnSystem {
    fn update(&mut self, world: &mut World, dt: f32) {
        self.level_time += dt;

        let mut emitted = false;
        while self.cursor < self.schedule.len() && self.schedule[self.cursor].at <= self.level_time
        {
            Self::emit_group(&self.schedule[self.cursor].spawn, world);
            self.cursor += 1;
            emitted = true;
        }

        // Completion is only checked on ticks without fresh emissions, so
        // enemies spawned this tick get materialized first.
        if !self.completed
            && !emitted
            && self.finished_spawning()
            && world.entities_with_signature(Signature::ENEMY).is_empty()
        {
            self.completed = true;
            world.emit(GameEvent::LevelComplete);
        }
    }

    fn signature(&self) -> Signature {
        Signature::ENEMY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidrun::{Enemy, LevelConfigManager, Networked};

    const DT: f32 = 1.0 / 60.0;

    fn level(json: &str) -> LevelConfig {
        LevelConfigManager::load_from_str(json)
            .unwrap()
            .first()
            .unwrap()
            .clone()
    }

    fn drain_spawns(world: &mut World) -> Vec<SpawnEntityEvent> {
        let mut spawns = Vec::new();
        while let Some(event) = world.next_event() {
            if let GameEvent::Spawn(spawn) = event {
                spawns.push(spawn);
            }
        }
        spawns
    }

    #[test]
    fn waits_for_start_time_plus_delay() {
        let level = level(
            r#"{"levels":[{"id":"l","waves":[
                {"startTime":0.5,"spawns":[{"enemyType":"a","x":100.0,"y":100.0,"delay":0.5}]}
            ]}]}"#,
        );
        let mut world = World::new();
        let mut system = WaveSpawnSystem::new(&level);

        system.update(&mut world, 0.9);
        assert!(drain_spawns(&mut world).is_empty());

        system.update(&mut world, 0.2);
        assert_eq!(drain_spawns(&mut world).len(), 1);
    }

    #[test]
    fn equal_times_fire_in_config_order() {
        let level = level(
            r#"{"levels":[{"id":"l","waves":[
                {"startTime":1.0,"spawns":[
                    {"enemyType":"first","x":10.0,"y":10.0},
                    {"enemyType":"second","x":20.0,"y":20.0}
                ]},
                {"startTime":0.0,"spawns":[{"enemyType":"earliest","x":5.0,"y":5.0,"delay":1.0}]}
            ]}]}"#,
        );
        let mut world = World::new();
        let mut system = WaveSpawnSystem::new(&level);

        system.update(&mut world, 1.5);
        let spawns = drain_spawns(&mut world);
        let order: Vec<&str> = spawns
            .iter()
            .map(|s| match &s.kind {
                SpawnKind::Enemy { archetype } => archetype.as_str(),
                _ => "?",
            })
            .collect();
        assert_eq!(order, vec!["first", "second", "earliest"]);
    }

    #[test]
    fn group_is_spaced_along_y() {
        let level = level(
            r#"{"levels":[{"id":"l","waves":[
                {"startTime":0.0,"spawns":[{"enemyType":"a","x":500.0,"y":100.0,"count":3,"spacing":60.0}]}
            ]}]}"#,
        );
        let mut world = World::new();
        let mut system = WaveSpawnSystem::new(&level);

        system.update(&mut world, DT);
        let spawns = drain_spawns(&mut world);
        assert_eq!(spawns.len(), 3);
        assert_eq!(spawns[0].y, 100.0);
        assert_eq!(spawns[1].y, 160.0);
        assert_eq!(spawns[2].y, 220.0);
        assert!(spawns.iter().all(|s| s.x == 500.0));
    }

    #[test]
    fn negative_coordinates_are_randomized_in_bounds() {
        let level = level(
            r#"{"levels":[{"id":"l","waves":[
                {"startTime":0.0,"spawns":[{"enemyType":"a"}]}
            ]}]}"#,
        );
        let mut world = World::new();
        let mut system = WaveSpawnSystem::new(&level);

        system.update(&mut world, DT);
        let spawns = drain_spawns(&mut world);
        assert_eq!(spawns.len(), 1);
        assert!(spawns[0].x >= 0.0 && spawns[0].x <= WORLD_WIDTH);
        assert!(spawns[0].y >= 0.0 && spawns[0].y <= WORLD_HEIGHT);
    }

    #[test]
    fn level_completes_after_last_enemy_dies() {
        let level = level(
            r#"{"levels":[{"id":"l","waves":[
                {"startTime":0.0,"spawns":[{"enemyType":"a","x":100.0,"y":100.0}]}
            ]}]}"#,
        );
        let mut world = World::new();
        let mut system = WaveSpawnSystem::new(&level);

        system.update(&mut world, DT);
        drain_spawns(&mut world);

        // Materialize the enemy the way the lobby's event handler would.
        let enemy = world.spawn();
        world.add(
            enemy,
            Enemy {
                archetype: "a".to_owned(),
            },
        );
        world.add(enemy, Networked);

        system.update(&mut world, DT);
        assert_eq!(world.pending_events(), 0);

        world.despawn(enemy);
        system.update(&mut world, DT);
        assert!(matches!(world.next_event(), Some(GameEvent::LevelComplete)));

        // Completion fires once.
        system.update(&mut world, DT);
        assert!(world.next_event().is_none());
    }
}
