mod enemy;
mod level;

use thiserror::Error;

pub use enemy::{
    ColliderConfig, EnemyConfig, EnemyConfigManager, HealthConfig, PatternConfig, SpriteConfig,
    TransformConfig, VelocityConfig,
};
pub use level::{EnemySpawn, LevelConfig, LevelConfigManager, WaveConfig};

/// Failure to load a startup config registry. Fatal: the server refuses to
/// start without its enemy and level tables.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
