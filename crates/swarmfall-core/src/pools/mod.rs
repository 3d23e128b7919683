//! Pools of reusable entities.
//!
//! [`EntityPool`] adapts the generic [`ObjectPool`] to items that are entity
//! ids living in the [`World`]: the recycler builds each entity once with all
//! of its components, and spawning or despawning only flips it active or
//! inactive and rewrites its live parameters.
//!
//! - [`EnemyPool`]: one pool per enemy archetype
//! - [`ProjectilePool`]: one pool for every projectile, orbiter and zone
//! - [`DropPool`]: one pool per pickup kind

pub mod drop;
pub mod enemy;
pub mod projectile;

use std::collections::BTreeMap;

use crate::config::PoolConfig;
use crate::entity::EntityId;
use crate::pool::{ObjectPool, PoolHandle, Recycle};
use crate::world::World;

pub use drop::{DropPool, DropRecycler, DropSpawn};
pub use enemy::{EnemyPool, EnemyRecycler, EnemySpawn};
pub use projectile::{ProjectilePool, ProjectileRecycler, ProjectileSpawn};

/// An [`ObjectPool`] whose items are entities in a [`World`].
pub struct EntityPool<R>
where
    R: Recycle<Item = EntityId, Env = World>,
{
    pool: ObjectPool<R>,
    handles: BTreeMap<EntityId, PoolHandle>,
}

impl<R> EntityPool<R>
where
    R: Recycle<Item = EntityId, Env = World>,
{
    /// Builds the pool and pre-warms its entities into `world`.
    pub fn new(recycler: R, config: PoolConfig, world: &mut World) -> Self {
        let pool = ObjectPool::new(recycler, config, world);
        let handles = pool.items().map(|(handle, id)| (*id, handle)).collect();
        Self { pool, handles }
    }

    /// Activates a pooled entity with `args`. `None` when the pool is
    /// exhausted.
    pub fn spawn(&mut self, world: &mut World, args: R::Args) -> Option<EntityId> {
        let handle = self.pool.acquire(world, args)?;
        if self.handles.len() != self.pool.total_count() {
            for (grown, id) in self.pool.items() {
                self.handles.entry(*id).or_insert(grown);
            }
        }
        self.pool.get(handle).copied()
    }

    /// Returns entity `id` to the pool. `false` if it is not an active
    /// member of this pool.
    pub fn despawn(&mut self, world: &mut World, id: EntityId) -> bool {
        match self.handles.get(&id) {
            Some(&handle) => self.pool.release(handle, world),
            None => false,
        }
    }

    /// Returns every active entity to the pool.
    pub fn despawn_all(&mut self, world: &mut World) -> usize {
        self.pool.release_all(world)
    }

    /// Destroys every pooled entity.
    pub fn teardown(&mut self, world: &mut World) {
        self.pool.teardown(world);
        self.handles.clear();
    }

    /// Returns `true` if this pool built entity `id`.
    #[must_use]
    pub fn owns(&self, id: EntityId) -> bool {
        self.handles.contains_key(&id)
    }

    /// Returns `true` if entity `id` is currently spawned from this pool.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.handles
            .get(&id)
            .is_some_and(|handle| self.pool.is_active(*handle))
    }

    /// Active entities, in slot order.
    pub fn active_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.pool
            .active_handles()
            .filter_map(|handle| self.pool.get(handle).copied())
    }

    /// Spawned entities.
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.pool.active_count()
    }

    /// Entities ready to spawn without growing.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.pool.available_count()
    }

    /// Entities built so far.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.pool.total_count()
    }

    /// The recycler.
    #[must_use]
    pub const fn recycler(&self) -> &R {
        self.pool.recycler()
    }
}

impl<R> std::fmt::Debug for EntityPool<R>
where
    R: Recycle<Item = EntityId, Env = World>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityPool")
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
