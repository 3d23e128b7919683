//! Enemy pools, one per archetype.

use std::collections::BTreeMap;

use glam::Vec2;

use crate::config::{EnemyConfig, GameConfig, PoolConfig, DEFAULT_ENEMY};
use crate::entity::components::{
    Ai, Collider, CollisionLayers, Enemy, Health, RenderShape, Renderer, Rigidbody, Transform,
};
use crate::entity::{EntityId, EntityTag};
use crate::pool::Recycle;
use crate::world::World;

use super::EntityPool;

const ENEMY_LAYER: i32 = 1;

/// Live parameters of an enemy spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemySpawn {
    /// Spawn position.
    pub position: Vec2,
    /// Health after wave scaling.
    pub health: f32,
}

/// Builds and resets enemies of one archetype.
#[derive(Debug, Clone)]
pub struct EnemyRecycler {
    archetype: String,
    config: EnemyConfig,
}

impl EnemyRecycler {
    /// Recycler for archetype `archetype`.
    #[must_use]
    pub fn new(archetype: &str, config: &EnemyConfig) -> Self {
        Self {
            archetype: archetype.to_string(),
            config: config.clone(),
        }
    }

    /// Archetype id.
    #[must_use]
    pub fn archetype(&self) -> &str {
        &self.archetype
    }
}

impl Recycle for EnemyRecycler {
    type Item = EntityId;
    type Env = World;
    type Args = EnemySpawn;

    fn create(&mut self, world: &mut World) -> EntityId {
        let config = &self.config;
        world
            .spawn(EntityTag::Enemy, format!("Enemy_{}", self.archetype))
            .inactive()
            .with(Transform::default())
            .with(Rigidbody::default())
            .with(Health::new(config.health))
            .with(Renderer::new(
                RenderShape::Circle,
                config.color,
                config.radius * 2.0,
                ENEMY_LAYER,
            ))
            .with(Collider::circle(
                config.radius,
                CollisionLayers::ENEMY,
                CollisionLayers::PLAYER | CollisionLayers::PROJECTILE,
            ))
            .with(Ai::from_config(config))
            .with(Enemy::from_config(&self.archetype, config))
            .id()
    }

    fn reset(&mut self, id: &mut EntityId, world: &mut World, args: EnemySpawn) {
        let Some(entity) = world.get_mut(*id) else {
            return;
        };
        entity.set_active(true);
        if let Some(transform) = entity.get_mut::<Transform>() {
            *transform = Transform::at(args.position);
        }
        if let Some(body) = entity.get_mut::<Rigidbody>() {
            body.stop();
        }
        if let Some(health) = entity.get_mut::<Health>() {
            health.reset(args.health);
        }
        if let Some(ai) = entity.get_mut::<Ai>() {
            ai.reset();
        }
        if let Some(collider) = entity.get_mut::<Collider>() {
            collider.enabled = true;
        }
    }

    fn retire(&mut self, id: &mut EntityId, world: &mut World) {
        let Some(entity) = world.get_mut(*id) else {
            return;
        };
        entity.set_active(false);
        if let Some(body) = entity.get_mut::<Rigidbody>() {
            body.stop();
        }
        if let Some(collider) = entity.get_mut::<Collider>() {
            collider.enabled = false;
        }
    }

    fn destroy(&mut self, id: EntityId, world: &mut World) {
        world.destroy(id);
    }
}

/// Enemy pools keyed by archetype id.
#[derive(Debug)]
pub struct EnemyPool {
    pools: BTreeMap<String, EntityPool<EnemyRecycler>>,
}

impl EnemyPool {
    /// Builds and pre-warms one pool per archetype in `config.enemies`.
    pub fn new(config: &GameConfig, world: &mut World) -> Self {
        Self::with_bounds(config, config.pools.enemy, world)
    }

    /// Like [`EnemyPool::new`] with explicit pool bounds.
    pub fn with_bounds(config: &GameConfig, bounds: PoolConfig, world: &mut World) -> Self {
        let pools = config
            .enemies
            .iter()
            .map(|(id, enemy)| {
                (
                    id.clone(),
                    EntityPool::new(EnemyRecycler::new(id, enemy), bounds, world),
                )
            })
            .collect();
        Self { pools }
    }

    /// Spawns an enemy of `archetype`, falling back to the default archetype
    /// for unknown ids. `None` when that pool is exhausted.
    pub fn spawn(&mut self, world: &mut World, archetype: &str, args: EnemySpawn) -> Option<EntityId> {
        if !self.pools.contains_key(archetype) {
            tracing::warn!(enemy = archetype, "no pool for enemy archetype, using `{DEFAULT_ENEMY}`");
        }
        let pool = match self.pools.get_mut(archetype) {
            Some(pool) => pool,
            None => self.pools.get_mut(DEFAULT_ENEMY)?,
        };
        pool.spawn(world, args)
    }

    /// Returns enemy `id` to its pool.
    pub fn despawn(&mut self, world: &mut World, id: EntityId) -> bool {
        self.pools.values_mut().any(|pool| pool.despawn(world, id))
    }

    /// Returns every enemy to its pool.
    pub fn despawn_all(&mut self, world: &mut World) -> usize {
        self.pools
            .values_mut()
            .map(|pool| pool.despawn_all(world))
            .sum()
    }

    /// Destroys every pooled enemy.
    pub fn teardown(&mut self, world: &mut World) {
        for pool in self.pools.values_mut() {
            pool.teardown(world);
        }
    }

    /// Returns `true` if enemy `id` is currently spawned.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.pools.values().any(|pool| pool.is_active(id))
    }

    /// Spawned enemies across every archetype.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.pools.values().map(EntityPool::active_count).sum()
    }

    /// Entities built across every archetype.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.pools.values().map(EntityPool::total_count).sum()
    }

    /// The pool of `archetype`, if one exists.
    #[must_use]
    pub fn archetype(&self, archetype: &str) -> Option<&EntityPool<EnemyRecycler>> {
        self.pools.get(archetype)
    }
}
