use super::component::Signature;
use super::world::World;

/// A simulation system. The server registers a closed set of these per
/// lobby and runs them in order every tick; `signature` names the
/// components an entity must carry for the system to act on it.
pub trait System {
    fn update(&mut self, world: &mut World, dt: f32);
    fn signature(&self) -> Signature;
}
