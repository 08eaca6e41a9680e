use std::collections::HashMap;

use super::component::{
    Attraction, Collider, Enemy, Health, Immortal, Input, Invulnerable, Networked, Pattern,
    PlayerId, Projectile, Score, Signature, Sprite, Transform, Velocity, Viewport,
};
use super::event::{EventBus, GameEvent};
use super::storage::ComponentPool;
use super::Entity;

/// A component type with a compile-time-assigned signature bit and a
/// dedicated pool inside the world.
pub trait Component: Sized + 'static {
    const KIND: Signature;

    fn pool(world: &World) -> &ComponentPool<Self>;
    fn pool_mut(world: &mut World) -> &mut ComponentPool<Self>;
}

macro_rules! impl_component {
    ($ty:ty, $kind:ident, $field:ident) => {
        impl Component for $ty {
            const KIND: Signature = Signature::$kind;

            fn pool(world: &World) -> &ComponentPool<Self> {
                &world.$field
            }

            fn pool_mut(world: &mut World) -> &mut ComponentPool<Self> {
                &mut world.$field
            }
        }
    };
}

impl_component!(Transform, TRANSFORM, transforms);
impl_component!(Velocity, VELOCITY, velocities);
impl_component!(Input, INPUT, inputs);
impl_component!(PlayerId, PLAYER_ID, player_ids);
impl_component!(Viewport, VIEWPORT, viewports);
impl_component!(Health, HEALTH, healths);
impl_component!(Invulnerable, INVULNERABLE, invulnerables);
impl_component!(Immortal, IMMORTAL, immortals);
impl_component!(Attraction, ATTRACTION, attractions);
impl_component!(Networked, NETWORKED, networked);
impl_component!(Collider, COLLIDER, colliders);
impl_component!(Sprite, SPRITE, sprites);
impl_component!(Pattern, PATTERN, patterns);
impl_component!(Projectile, PROJECTILE, projectiles);
impl_component!(Enemy, ENEMY, enemies);
impl_component!(Score, SCORE, scores);

/// A lobby-local ECS container: entity allocator, component pools, per-entity
/// signatures and the tick event bus. The unit of simulation isolation; one
/// world never references entities of another.
#[derive(Debug, Default)]
pub struct World {
    next_entity_id: u32,
    signatures: HashMap<Entity, Signature>,
    events: EventBus,

    pub transforms: ComponentPool<Transform>,
    pub velocities: ComponentPool<Velocity>,
    pub inputs: ComponentPool<Input>,
    pub player_ids: ComponentPool<PlayerId>,
    pub viewports: ComponentPool<Viewport>,
    pub healths: ComponentPool<Health>,
    pub invulnerables: ComponentPool<Invulnerable>,
    pub immortals: ComponentPool<Immortal>,
    pub attractions: ComponentPool<Attraction>,
    pub networked: ComponentPool<Networked>,
    pub colliders: ComponentPool<Collider>,
    pub sprites: ComponentPool<Sprite>,
    pub patterns: ComponentPool<Pattern>,
    pub projectiles: ComponentPool<Projectile>,
    pub enemies: ComponentPool<Enemy>,
    pub scores: ComponentPool<Score>,
}

impl World {
    pub fn new() -> Self {
        Self {
            next_entity_id: 1,
            ..Self::default()
        }
    }

    pub fn spawn(&mut self) -> Entity {
        let entity = Entity(self.next_entity_id);
        self.next_entity_id += 1;
        self.signatures.insert(entity, Signature::empty());
        entity
    }

    /// Create an entity with a caller-chosen id. Used by the client to
    /// mirror server-assigned ids into its local world.
    pub fn spawn_with_id(&mut self, id: u32) -> Entity {
        let entity = Entity(id);
        if id >= self.next_entity_id {
            self.next_entity_id = id + 1;
        }
        self.signatures.entry(entity).or_insert(Signature::empty());
        entity
    }

    pub fn despawn(&mut self, entity: Entity) {
        if self.signatures.remove(&entity).is_none() {
            return;
        }
        self.transforms.remove(entity);
        self.velocities.remove(entity);
        self.inputs.remove(entity);
        self.player_ids.remove(entity);
        self.viewports.remove(entity);
        self.healths.remove(entity);
        self.invulnerables.remove(entity);
        self.immortals.remove(entity);
        self.attractions.remove(entity);
        self.networked.remove(entity);
        self.colliders.remove(entity);
        self.sprites.remove(entity);
        self.patterns.remove(entity);
        self.projectiles.remove(entity);
        self.enemies.remove(entity);
        self.scores.remove(entity);
    }

    pub fn is_alive(&self, entity: Entity) -> bool {
        self.signatures.contains_key(&entity)
    }

    pub fn entity_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn add<C: Component>(&mut self, entity: Entity, component: C) {
        let Some(signature) = self.signatures.get_mut(&entity) else {
            return;
        };
        signature.insert(C::KIND);
        C::pool_mut(self).insert(entity, component);
    }

    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        C::pool(self).get(entity)
    }

    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        C::pool_mut(self).get_mut(entity)
    }

    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        C::pool(self).contains(entity)
    }

    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        if let Some(signature) = self.signatures.get_mut(&entity) {
            signature.remove(C::KIND);
        }
        C::pool_mut(self).remove(entity)
    }

    pub fn signature(&self, entity: Entity) -> Option<Signature> {
        self.signatures.get(&entity).copied()
    }

    /// All live entities carrying every component in `required`, in id
    /// order so iteration is deterministic across ticks.
    pub fn entities_with_signature(&self, required: Signature) -> Vec<Entity> {
        let mut out: Vec<Entity> = self
            .signatures
            .iter()
            .filter(|(_, sig)| sig.contains(required))
            .map(|(&entity, _)| entity)
            .collect();
        out.sort_unstable();
        out
    }

    pub fn entities(&self) -> Vec<Entity> {
        self.entities_with_signature(Signature::empty())
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.emit(event);
    }

    pub fn next_event(&mut self) -> Option<GameEvent> {
        self.events.pop()
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}
