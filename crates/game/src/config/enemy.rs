use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;
use crate::ecs::PatternKind;

/// Sprite metadata forwarded to clients so they can draw the archetype.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SpriteConfig {
    #[serde(rename = "spriteId")]
    pub sprite_id: u32,
    pub width: u32,
    pub height: u32,
    pub animated: bool,
    #[serde(rename = "frameCount")]
    pub frame_count: u32,
    #[serde(rename = "startFrame")]
    pub start_frame: u32,
    #[serde(rename = "endFrame")]
    pub end_frame: u32,
    #[serde(rename = "frameTime")]
    pub frame_time: f32,
    #[serde(rename = "reverseAnimation")]
    pub reverse_animation: bool,
}

impl Default for SpriteConfig {
    fn default() -> Self {
        Self {
            sprite_id: 0,
            width: 32,
            height: 32,
            animated: false,
            frame_count: 1,
            start_frame: 0,
            end_frame: 0,
            frame_time: 0.1,
            reverse_animation: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    pub scale: f32,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub hp: i32,
    #[serde(rename = "maxHp")]
    pub max_hp: i32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { hp: 10, max_hp: 10 }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ColliderConfig {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    #[serde(rename = "type")]
    pub pattern_type: String,
    pub amplitude: f32,
    pub frequency: f32,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            pattern_type: "none".to_owned(),
            amplitude: 0.0,
            frequency: 0.0,
        }
    }
}

impl PatternConfig {
    pub fn kind(&self) -> PatternKind {
        match self.pattern_type.as_str() {
            "linear" => PatternKind::Linear,
            "sinusoidal" => PatternKind::Sinusoidal,
            _ => PatternKind::None,
        }
    }
}

/// One enemy archetype. Every field is defaulted so sparse config entries
/// stay valid; unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnemyConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sprite: SpriteConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    collider: Option<ColliderConfig>,
    #[serde(default)]
    pub velocity: VelocityConfig,
    #[serde(default)]
    pub pattern: PatternConfig,
}

impl EnemyConfig {
    /// Collision box, defaulting to the scaled sprite dimensions when the
    /// config does not name one explicitly.
    pub fn collider(&self) -> ColliderConfig {
        self.collider.unwrap_or(ColliderConfig {
            width: self.sprite.width as f32 * self.transform.scale,
            height: self.sprite.height as f32 * self.transform.scale,
        })
    }
}

#[derive(Debug, Deserialize)]
struct EnemyFile {
    enemies: Vec<EnemyConfig>,
}

/// Immutable registry of enemy archetypes, loaded once at startup and
/// shared across lobbies.
#[derive(Debug, Default)]
pub struct EnemyConfigManager {
    configs: HashMap<String, EnemyConfig>,
}

impl EnemyConfigManager {
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
        log::info!(
            "loaded {} enemy archetypes from {}",
            manager.len(),
            path.display()
        );
        Ok(manager)
    }

    pub fn load_from_str(text: &str) -> Result<Self, serde_json::Error> {
        let file: EnemyFile = serde_json::from_str(text)?;
        let mut configs = HashMap::new();
        for config in file.enemies {
            if config.id.is_empty() {
                log::warn!("skipping enemy archetype with empty id");
                continue;
            }
            configs.insert(config.id.clone(), config);
        }
        Ok(Self { configs })
    }

    pub fn get(&self, id: &str) -> Option<&EnemyConfig> {
        self.configs.get(id)
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.configs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
