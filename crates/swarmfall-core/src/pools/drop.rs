//! Pickup pools, one per [`DropKind`].

use std::collections::BTreeMap;

use glam::Vec2;

use crate::config::{DropConfig, DropKind, PoolConfig};
use crate::entity::components::{Collider, CollisionLayers, Pickup, RenderShape, Renderer, Transform};
use crate::entity::{EntityId, EntityTag};
use crate::pool::Recycle;
use crate::world::World;

use super::EntityPool;

const PICKUP_LAYER: i32 = 0;

const fn drop_color(kind: DropKind) -> [u8; 4] {
    match kind {
        DropKind::Experience => [80, 160, 255, 255],
        DropKind::Gold => [255, 210, 60, 255],
        DropKind::Health => [90, 220, 110, 255],
    }
}

/// Live parameters of a pickup spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropSpawn {
    /// Spawn position.
    pub position: Vec2,
    /// Experience, gold or health granted.
    pub value: f32,
}

/// Builds and resets pickups of one kind.
#[derive(Debug, Clone, Copy)]
pub struct DropRecycler {
    kind: DropKind,
    radius: f32,
}

impl DropRecycler {
    /// Recycler for `kind` pickups.
    #[must_use]
    pub const fn new(kind: DropKind, config: &DropConfig) -> Self {
        Self {
            kind,
            radius: config.radius,
        }
    }

    /// Kind of pickup this recycler builds.
    #[must_use]
    pub const fn kind(&self) -> DropKind {
        self.kind
    }
}

impl Recycle for DropRecycler {
    type Item = EntityId;
    type Env = World;
    type Args = DropSpawn;

    fn create(&mut self, world: &mut World) -> EntityId {
        world
            .spawn(EntityTag::Pickup, format!("Pickup_{}", self.kind.name()))
            .inactive()
            .with(Transform::default())
            .with(Renderer::new(
                RenderShape::Diamond,
                drop_color(self.kind),
                self.radius * 2.0,
                PICKUP_LAYER,
            ))
            .with(Collider::circle(
                self.radius,
                CollisionLayers::PICKUP,
                CollisionLayers::PLAYER,
            ))
            .with(Pickup::new(self.kind, 0.0))
            .id()
    }

    fn reset(&mut self, id: &mut EntityId, world: &mut World, args: DropSpawn) {
        let Some(entity) = world.get_mut(*id) else {
            return;
        };
        entity.set_active(true);
        if let Some(transform) = entity.get_mut::<Transform>() {
            *transform = Transform::at(args.position);
        }
        if let Some(collider) = entity.get_mut::<Collider>() {
            collider.enabled = true;
        }
        if let Some(pickup) = entity.get_mut::<Pickup>() {
            *pickup = Pickup::new(self.kind, args.value);
        }
    }

    fn retire(&mut self, id: &mut EntityId, world: &mut World) {
        let Some(entity) = world.get_mut(*id) else {
            return;
        };
        entity.set_active(false);
        if let Some(collider) = entity.get_mut::<Collider>() {
            collider.enabled = false;
        }
    }

    fn destroy(&mut self, id: EntityId, world: &mut World) {
        world.destroy(id);
    }
}

/// Pickup pools keyed by kind.
#[derive(Debug)]
pub struct DropPool {
    pools: BTreeMap<DropKind, EntityPool<DropRecycler>>,
}

impl DropPool {
    /// Builds and pre-warms one pool per [`DropKind`].
    pub fn new(config: &DropConfig, bounds: PoolConfig, world: &mut World) -> Self {
        let pools = DropKind::ALL
            .into_iter()
            .map(|kind| (kind, EntityPool::new(DropRecycler::new(kind, config), bounds, world)))
            .collect();
        Self { pools }
    }

    /// Spawns a `kind` pickup. `None` when that pool is exhausted.
    pub fn spawn(&mut self, world: &mut World, kind: DropKind, args: DropSpawn) -> Option<EntityId> {
        self.pools.get_mut(&kind)?.spawn(world, args)
    }

    /// Returns pickup `id` to its pool.
    pub fn despawn(&mut self, world: &mut World, id: EntityId) -> bool {
        self.pools.values_mut().any(|pool| pool.despawn(world, id))
    }

    /// Returns every pickup to its pool.
    pub fn despawn_all(&mut self, world: &mut World) -> usize {
        self.pools
            .values_mut()
            .map(|pool| pool.despawn_all(world))
            .sum()
    }

    /// Destroys every pooled pickup.
    pub fn teardown(&mut self, world: &mut World) {
        for pool in self.pools.values_mut() {
            pool.teardown(world);
        }
    }

    /// Returns `true` if pickup `id` is on the field.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.pools.values().any(|pool| pool.is_active(id))
    }

    /// Pickups on the field.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.pools.values().map(EntityPool::active_count).sum()
    }

    /// Pickups of `kind` on the field.
    #[must_use]
    pub fn active_count_of(&self, kind: DropKind) -> usize {
        self.pools.get(&kind).map_or(0, EntityPool::active_count)
    }
}
