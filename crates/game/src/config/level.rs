use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// One enemy spawn inside a wave. Negative coordinates mean "randomize".
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnemySpawn {
    #[serde(rename = "enemyType")]
    pub enemy_type: String,
    pub x: f32,
    pub y: f32,
    /// Seconds after the wave's start time.
    pub delay: f32,
    pub count: u32,
    /// Vertical spacing between enemies of the same group.
    pub spacing: f32,
}

impl Default for EnemySpawn {
    fn default() -> Self {
        Self {
            enemy_type: "enemy_red".to_owned(),
            x: -1.0,
            y: -1.0,
            delay: 0.0,
            count: 1,
            spacing: 50.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub id: String,
    pub name: String,
    /// Seconds after the level began.
    #[serde(rename = "startTime")]
    pub start_time: f32,
    pub spawns: Vec<EnemySpawn>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub id: String,
    pub name: String,
    pub description: String,
    pub waves: Vec<WaveConfig>,
}

#[derive(Debug, Deserialize)]
struct LevelFile {
    levels: Vec<LevelConfig>,
}

/// Immutable registry of level wave plans, in config-file order so the
/// campaign progression is the array order.
#[derive(Debug, Default)]
pub struct LevelConfigManager {
    levels: Vec<LevelConfig>,
}

impl LevelConfigManager {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let manager = Self::load_from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("loaded {} levels from {}", manager.len(), path.display());
        Ok(manager)
    }

    pub fn load_from_str(text: &str) -> Result<Self, serde_json::Error> {
        let file: LevelFile = serde_json::from_str(text)?;
        let mut levels = Vec::new();
        for level in file.levels {
            if level.id.is_empty() {
                log::warn!("skipping level with empty id");
                continue;
            }
            levels.push(level);
        }
        Ok(Self { levels })
    }

    pub fn get(&self, id: &str) -> Option<&LevelConfig> {
        self.levels.iter().find(|l| l.id == id)
    }

    pub fn first(&self) -> Option<&LevelConfig> {
        self.levels.first()
    }

    /// The level that follows `id` in config order, if any.
    pub fn next_after(&self, id: &str) -> Option<&LevelConfig> {
        let index = self.levels.iter().position(|l| l.id == id)?;
        self.levels.get(index + 1)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "levels": [
            {
                "id": "level_1",
                "name": "First Contact",
                "waves": [
                    {"id": "w1", "startTime": 0.0, "spawns": [
                        {"enemyType": "enemy_red", "x": 1800.0, "y": 200.0, "delay": 0.5, "count": 3, "spacing": 60.0}
                    ]},
                    {"id": "w2", "startTime": 10.0, "spawns": [
                        {"enemyType": "enemy_blue", "delay": 1.0}
                    ]}
                ]
            },
            {"id": "level_2", "name": "Deep Void", "waves": []}
        ]
    }"#;

    #[test]
    fn parses_waves_and_spawns() {
        let manager = LevelConfigManager::load_from_str(SAMPLE).unwrap();
        let level = manager.get("level_1").unwrap();
        assert_eq!(level.waves.len(), 2);

        let spawn = &level.waves[0].spawns[0];
        assert_eq!(spawn.enemy_type, "enemy_red");
        assert_eq!(spawn.count, 3);
        assert_eq!(spawn.spacing, 60.0);
    }

    #[test]
    fn spawn_defaults_randomize_position() {
        let manager = LevelConfigManager::load_from_str(SAMPLE).unwrap();
        let spawn = &manager.get("level_1").unwrap().waves[1].spawns[0];
        assert!(spawn.x < 0.0);
        assert!(spawn.y < 0.0);
        assert_eq!(spawn.count, 1);
        assert_eq!(spawn.spacing, 50.0);
    }

    #[test]
    fn campaign_order_is_config_order() {
        let manager = LevelConfigManager::load_from_str(SAMPLE).unwrap();
        assert_eq!(manager.first().unwrap().id, "level_1");
        assert_eq!(manager.next_after("level_1").unwrap().id, "level_2");
        assert!(manager.next_after("level_2").is_none());
    }

    #[test]
    fn missing_levels_array_is_an_error() {
        assert!(LevelConfigManager::load_from_str(r#"{"stages":[]}"#).is_err());
    }
}
