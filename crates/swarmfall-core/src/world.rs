//! Entity container.
//!
//! The world owns every entity, live or pooled. It provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Monotonically increasing id allocation
//! - Lifecycle management (spawn, destroy, maintain)
//!
//! # Architecture
//!
//! Ids are never reused and the `BTreeMap` iterates in id order, so every
//! system sees entities in the same order on every run. Pooled entities stay
//! in the map while inactive; only [`World::maintain`] removes entries, and
//! only those that were destroyed.
//!
//! # Example
//!
//! ```
//! use swarmfall_core::world::World;
//! use swarmfall_core::entity::EntityTag;
//! use swarmfall_core::entity::components::Transform;
//! use glam::Vec2;
//!
//! let mut world = World::new();
//! let id = world.spawn(EntityTag::Enemy, "Enemy_normal")
//!     .with(Transform::at(Vec2::new(100.0, 200.0)))
//!     .id();
//!
//! assert_eq!(world.position(id), Some(Vec2::new(100.0, 200.0)));
//! world.destroy(id);
//! assert!(!world.is_live(id));
//! world.maintain();
//! assert!(world.get(id).is_none());
//! ```

use std::collections::BTreeMap;

use glam::Vec2;

use crate::entity::components::Transform;
use crate::entity::{Component, Entity, EntityId, EntityTag};

/// Builder returned by [`World::spawn`].
pub struct EntityBuilder<'w> {
    entity: &'w mut Entity,
}

impl EntityBuilder<'_> {
    /// Attaches `component`; duplicates are rejected as in
    /// [`Entity::add_component`].
    #[must_use]
    pub fn with<C: Component>(self, component: C) -> Self {
        self.entity.add_component(component);
        self
    }

    /// Marks the entity inactive, as pooled instances start out.
    #[must_use]
    pub fn inactive(self) -> Self {
        self.entity.set_active(false);
        self
    }

    /// The new entity's id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.entity.id()
    }
}

/// Container of every entity in a run.
#[derive(Debug, Clone)]
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
}

impl World {
    /// An empty world. The first id handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Creates an active entity with no components.
    ///
    /// # Arguments
    ///
    /// * `tag` - Coarse type of the entity
    /// * `label` - Human-readable name
    pub fn spawn(&mut self, tag: EntityTag, label: impl Into<String>) -> EntityBuilder<'_> {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        let entity = self
            .entities
            .entry(id)
            .or_insert_with(|| Entity::new(id, tag, label));
        EntityBuilder { entity }
    }

    /// Destroys entity `id`: its components are released and it stops
    /// participating. Returns `false` if no such entity exists.
    pub fn destroy(&mut self, id: EntityId) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.destroy();
                true
            }
            None => false,
        }
    }

    /// Drops destroyed entities. Returns how many were removed.
    pub fn maintain(&mut self) -> usize {
        let before = self.entities.len();
        self.entities.retain(|_, entity| !entity.is_destroyed());
        before - self.entities.len()
    }

    /// Removes every entity. Ids keep counting up.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Entity `id`, live or not.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Entity `id` mutably, live or not.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Component `C` of entity `id`.
    #[must_use]
    pub fn component<C: Component>(&self, id: EntityId) -> Option<&C> {
        self.get(id).and_then(Entity::get::<C>)
    }

    /// Component `C` of entity `id`, mutably.
    #[must_use]
    pub fn component_mut<C: Component>(&mut self, id: EntityId) -> Option<&mut C> {
        self.get_mut(id).and_then(Entity::get_mut::<C>)
    }

    /// Returns `true` if entity `id` exists, is active and is not destroyed.
    #[must_use]
    pub fn is_live(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(Entity::is_live)
    }

    /// Position of entity `id`, if it has a transform.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.component::<Transform>(id).map(|t| t.position)
    }

    /// Every entity in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Every entity in id order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> + '_ {
        self.entities.values_mut()
    }

    /// Live entities in id order.
    pub fn live(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values().filter(|entity| entity.is_live())
    }

    /// Live entities with tag `tag`, in id order.
    pub fn live_tagged(&self, tag: EntityTag) -> impl Iterator<Item = &Entity> + '_ {
        self.live().filter(move |entity| entity.tag() == tag)
    }

    /// Number of stored entities, pooled ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if the world holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
