mod attraction;
mod collision;
mod input;
mod lifecycle;
mod movement;
mod pattern;
mod shooting;
mod snapshot;
mod spawn;

pub use attraction::AttractionSystem;
pub use collision::CollisionSystem;
pub use input::InputMovementSystem;
pub use lifecycle::LifecycleSystem;
pub use movement::MovementSystem;
pub use pattern::PatternSystem;
pub use shooting::ShootingSystem;
pub use snapshot::SnapshotSystem;
pub use spawn::WaveSpawnSystem;
