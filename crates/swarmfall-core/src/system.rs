//! Systems and their shared frame context.
//!
//! A [`System`] owns a [`Membership`]: the set of entities that carry every
//! component it requires (and, optionally, a tag or one of several
//! alternative components). Each frame [`run_system`] re-validates the set
//! against the [`World`] and then calls [`System::update`], which by default
//! walks the members in id order and calls [`System::process`] for each.
//!
//! # Architecture
//!
//! Systems never hold references to each other or to the world. Everything a
//! system may touch during a frame is lent to it through [`SimContext`]:
//!
//! - the [`World`] for component reads and writes
//! - the [`EventBus`] for publishing what happened
//! - the [`ProjectilePool`] for firing and releasing projectiles
//! - the seeded rng, the read-only input, and the config
//!
//! # Invariants
//!
//! - Membership only ever contains live entities that carry every required
//!   component; stale members are pruned before processing
//! - A system whose required list is empty enrolls nothing and must override
//!   [`System::update`] to do its work
//! - Members are visited in ascending [`EntityId`] order
//!
//! # Example
//!
//! ```
//! use swarmfall_core::entity::{ComponentKind, EntityId};
//! use swarmfall_core::system::{Membership, SimContext, System};
//!
//! struct Spin {
//!     membership: Membership,
//! }
//!
//! impl System for Spin {
//!     fn name(&self) -> &'static str {
//!         "spin"
//!     }
//!
//!     fn membership(&self) -> &Membership {
//!         &self.membership
//!     }
//!
//!     fn membership_mut(&mut self) -> &mut Membership {
//!         &mut self.membership
//!     }
//!
//!     fn process(&mut self, id: EntityId, dt: f32, ctx: &mut SimContext<'_>) {
//!         use swarmfall_core::entity::Transform;
//!         if let Some(transform) = ctx.world.component_mut::<Transform>(id) {
//!             transform.rotation += dt;
//!         }
//!     }
//! }
//!
//! let spin = Spin {
//!     membership: Membership::new(&[ComponentKind::Transform]),
//! };
//! assert_eq!(spin.name(), "spin");
//! ```

use std::collections::BTreeSet;

use rand_chacha::ChaCha8Rng;

use crate::config::GameConfig;
use crate::entity::{ComponentKind, Entity, EntityId, EntityTag};
use crate::event::EventBus;
use crate::input::InputState;
use crate::pools::ProjectilePool;
use crate::world::World;

/// Everything a system may touch during one frame.
pub struct SimContext<'a> {
    /// Entity storage.
    pub world: &'a mut World,
    /// Event bus.
    pub events: &'a mut EventBus,
    /// Projectile pool.
    pub projectiles: &'a mut ProjectilePool,
    /// Seeded simulation rng.
    pub rng: &'a mut ChaCha8Rng,
    /// Read-only input for this frame.
    pub input: &'a dyn InputState,
    /// Game configuration.
    pub config: &'a GameConfig,
    /// Current wave number.
    pub wave: u32,
    /// The player entity, if spawned.
    pub player: Option<EntityId>,
}

impl std::fmt::Debug for SimContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimContext")
            .field("wave", &self.wave)
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Membership
// =============================================================================

/// The entities a system operates on.
#[derive(Debug, Clone, Default)]
pub struct Membership {
    required: Vec<ComponentKind>,
    any_of: Vec<ComponentKind>,
    tag: Option<EntityTag>,
    members: BTreeSet<EntityId>,
    snapshot: Vec<EntityId>,
}

fn qualifies(
    required: &[ComponentKind],
    any_of: &[ComponentKind],
    tag: Option<EntityTag>,
    entity: &Entity,
) -> bool {
    !required.is_empty()
        && entity.is_live()
        && tag.map_or(true, |tag| entity.tag() == tag)
        && entity.has_components(required)
        && (any_of.is_empty() || any_of.iter().any(|kind| entity.has_component(*kind)))
}

impl Membership {
    /// Membership of entities carrying every component in `required`.
    ///
    /// An empty list matches nothing.
    #[must_use]
    pub fn new(required: &[ComponentKind]) -> Self {
        Self {
            required: required.to_vec(),
            ..Self::default()
        }
    }

    /// Restricts membership to entities tagged `tag`.
    #[must_use]
    pub fn with_tag(mut self, tag: EntityTag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Additionally requires at least one component in `kinds`.
    #[must_use]
    pub fn with_any(mut self, kinds: &[ComponentKind]) -> Self {
        self.any_of = kinds.to_vec();
        self
    }

    /// Required components.
    #[must_use]
    pub fn required(&self) -> &[ComponentKind] {
        &self.required
    }

    /// Returns `true` if `entity` qualifies for membership.
    #[must_use]
    pub fn matches(&self, entity: &Entity) -> bool {
        qualifies(&self.required, &self.any_of, self.tag, entity)
    }

    /// Enrolls `entity` if it qualifies. Returns `true` if it was added.
    pub fn add_entity(&mut self, entity: &Entity) -> bool {
        self.matches(entity) && self.members.insert(entity.id())
    }

    /// Drops `id` from the set. Returns `true` if it was a member.
    pub fn remove_entity(&mut self, id: EntityId) -> bool {
        self.members.remove(&id)
    }

    /// Returns `true` if `id` is a member.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.members.contains(&id)
    }

    /// Members in ascending id order.
    pub fn members(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.members.iter().copied()
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if there are no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Prunes members that no longer qualify and enrolls every live entity
    /// that does.
    pub fn sync(&mut self, world: &World) {
        let (required, any_of, tag) = (&self.required, &self.any_of, self.tag);
        if required.is_empty() {
            self.members.clear();
            return;
        }
        self.members.retain(|id| {
            world
                .get(*id)
                .is_some_and(|entity| qualifies(required, any_of, tag, entity))
        });
        for entity in world.live() {
            if qualifies(required, any_of, tag, entity) {
                self.members.insert(entity.id());
            }
        }
    }

    /// Copies the members into a reusable buffer so the set can change while
    /// they are processed. Hand it back with [`Membership::restore_snapshot`].
    pub fn take_snapshot(&mut self) -> Vec<EntityId> {
        let mut snapshot = std::mem::take(&mut self.snapshot);
        snapshot.clear();
        snapshot.extend(self.members.iter().copied());
        snapshot
    }

    /// Returns a buffer from [`Membership::take_snapshot`] for reuse.
    pub fn restore_snapshot(&mut self, snapshot: Vec<EntityId>) {
        self.snapshot = snapshot;
    }
}

// =============================================================================
// System trait
// =============================================================================

/// Per-frame logic over a set of entities.
pub trait System {
    /// Name used in traces.
    fn name(&self) -> &'static str;

    /// The system's membership.
    fn membership(&self) -> &Membership;

    /// The system's membership, mutably.
    fn membership_mut(&mut self) -> &mut Membership;

    /// Processes one member.
    fn process(&mut self, _id: EntityId, _dt: f32, _ctx: &mut SimContext<'_>) {}

    /// Runs the system for one frame.
    ///
    /// The default visits every member still live in id order.
    fn update(&mut self, dt: f32, ctx: &mut SimContext<'_>) {
        let members = self.membership_mut().take_snapshot();
        for &id in &members {
            if ctx.world.is_live(id) {
                self.process(id, dt, ctx);
            }
        }
        self.membership_mut().restore_snapshot(members);
    }
}

/// Re-validates `system`'s membership and runs it for one frame.
pub fn run_system(system: &mut dyn System, dt: f32, ctx: &mut SimContext<'_>) {
    let _span = tracing::trace_span!("system", name = system.name()).entered();
    system.membership_mut().sync(ctx.world);
    system.update(dt, ctx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::{Health, Transform};

    fn world() -> (World, EntityId, EntityId, EntityId) {
        let mut world = World::new();
        let both = world
            .spawn(EntityTag::Enemy, "Enemy_normal")
            .with(Transform::default())
            .with(Health::new(10.0))
            .id();
        let transform_only = world
            .spawn(EntityTag::Enemy, "Enemy_normal")
            .with(Transform::default())
            .id();
        let player = world
            .spawn(EntityTag::Player, "Player")
            .with(Transform::default())
            .with(Health::new(100.0))
            .id();
        (world, both, transform_only, player)
    }

    #[test]
    fn sync_enrolls_only_qualifying_entities() {
        let (world, both, transform_only, player) = world();
        let mut membership = Membership::new(&[ComponentKind::Transform, ComponentKind::Health]);
        membership.sync(&world);
        let members: Vec<EntityId> = membership.members().collect();
        assert_eq!(members, vec![both, player]);
        assert!(!membership.contains(transform_only));
    }

    #[test]
    fn tag_filter_restricts_members() {
        let (world, _, _, player) = world();
        let mut membership = Membership::new(&[ComponentKind::Health]).with_tag(EntityTag::Player);
        membership.sync(&world);
        assert_eq!(membership.members().collect::<Vec<_>>(), vec![player]);
    }

    #[test]
    fn any_of_requires_one_alternative() {
        let (world, both, _, player) = world();
        let mut membership = Membership::new(&[ComponentKind::Transform])
            .with_any(&[ComponentKind::Health, ComponentKind::Weapon]);
        membership.sync(&world);
        assert_eq!(membership.members().collect::<Vec<_>>(), vec![both, player]);
    }

    #[test]
    fn sync_prunes_destroyed_and_inactive_members() {
        let (mut world, both, _, player) = world();
        let mut membership = Membership::new(&[ComponentKind::Health]);
        membership.sync(&world);
        assert_eq!(membership.len(), 2);

        world.destroy(both);
        world.get_mut(player).unwrap().set_active(false);
        membership.sync(&world);
        assert!(membership.is_empty());
    }

    #[test]
    fn empty_requirement_enrolls_nothing() {
        let (world, both, _, _) = world();
        let mut membership = Membership::new(&[]);
        membership.sync(&world);
        assert!(membership.is_empty());
        assert!(!membership.add_entity(world.get(both).unwrap()));
    }

    #[test]
    fn manual_add_and_remove() {
        let (world, both, transform_only, _) = world();
        let mut membership = Membership::new(&[ComponentKind::Health]);
        assert!(membership.add_entity(world.get(both).unwrap()));
        assert!(!membership.add_entity(world.get(both).unwrap()));
        assert!(!membership.add_entity(world.get(transform_only).unwrap()));
        assert!(membership.remove_entity(both));
        assert!(!membership.remove_entity(both));
    }
}
