//! Entity module: identifiers, coarse type tags and typed component storage.
//!
//! - [`EntityId`]: unique, monotonically assigned identifier
//! - [`EntityTag`]: coarse type classification used by system filters
//! - [`ComponentKind`] / [`Component`]: compile-time component keys
//! - [`Entity`]: id, tag, label, lifecycle flags and at most one component
//!   instance per kind
//!
//! # Architecture
//!
//! Components are plain data. They never point at each other; a system that
//! needs two components of the same entity looks both up through the owning
//! [`Entity`] within one call and does not cache the borrow across frames.
//!
//! The component registry is a struct of `Option` slots indexed by
//! [`ComponentKind`], so a lookup is a field access rather than a map probe.
//!
//! # Example
//!
//! ```
//! use swarmfall_core::entity::{ComponentKind, Entity, EntityId, EntityTag};
//! use swarmfall_core::entity::components::{Health, Transform};
//!
//! let mut enemy = Entity::new(EntityId::new(7), EntityTag::Enemy, "Enemy_normal");
//! assert!(enemy.add_component(Transform::default()));
//! assert!(enemy.add_component(Health::new(50.0)));
//!
//! // A duplicate key is rejected and leaves the original in place.
//! assert!(!enemy.add_component(Health::new(999.0)));
//! assert_eq!(enemy.get::<Health>().unwrap().max(), 50.0);
//!
//! assert!(enemy.has_components(&[ComponentKind::Transform, ComponentKind::Health]));
//! ```

pub mod components;
pub mod weapon;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use components::{
    Ai, Collider, CollisionLayers, DamageOutcome, Enemy, Health, Pickup, Projectile, Renderer,
    Rigidbody, Stats, Transform,
};
pub use weapon::{SlotError, Weapon, WeaponKey, WeaponSlot};

/// Unique identifier for an entity.
///
/// Ids are handed out by the [`World`](crate::world::World) in increasing
/// order and never reused. Pooled entities keep their id across every
/// spawn/despawn cycle.
///
/// # Example
///
/// ```
/// use swarmfall_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    ///
    /// # Arguments
    ///
    /// * `id` - The raw identifier value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

/// Coarse entity classification.
///
/// The tag drives system filters (only the player reads movement input,
/// only enemies run AI). Finer distinctions such as the enemy archetype live
/// in the entity's label and components.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// The player character.
    Player,
    /// A hostile unit.
    Enemy,
    /// A projectile, orbiter or damage zone.
    Projectile,
    /// A collectible dropped by an enemy.
    Pickup,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
            Self::Projectile => write!(f, "Projectile"),
            Self::Pickup => write!(f, "Pickup"),
        }
    }
}

/// Compile-time key of a component type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// [`Transform`]
    Transform,
    /// [`Rigidbody`]
    Rigidbody,
    /// [`Health`]
    Health,
    /// [`Renderer`]
    Renderer,
    /// [`Collider`]
    Collider,
    /// [`Stats`]
    Stats,
    /// [`Weapon`]
    Weapon,
    /// [`Ai`]
    Ai,
    /// [`WeaponSlot`]
    WeaponSlot,
    /// [`Enemy`]
    Enemy,
    /// [`Projectile`]
    Projectile,
    /// [`Pickup`]
    Pickup,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A component type stored in a [`ComponentStore`] slot.
///
/// Implemented for every component by the `component_store!` macro; there is
/// no reason to implement it by hand.
pub trait Component: Sized {
    /// Key of this component type.
    const KIND: ComponentKind;

    /// Shared access to this type's slot.
    fn slot(store: &ComponentStore) -> &Option<Self>;

    /// Exclusive access to this type's slot.
    fn slot_mut(store: &mut ComponentStore) -> &mut Option<Self>;
}

macro_rules! component_store {
    ($($field:ident: $ty:ty => $kind:ident),* $(,)?) => {
        /// One optional slot per component kind.
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        pub struct ComponentStore {
            $($field: Option<$ty>,)*
        }

        impl ComponentStore {
            /// Returns `true` if a component of `kind` is present.
            #[must_use]
            pub const fn has(&self, kind: ComponentKind) -> bool {
                match kind {
                    $(ComponentKind::$kind => self.$field.is_some(),)*
                }
            }

            /// Number of occupied slots.
            #[must_use]
            pub fn len(&self) -> usize {
                0 $(+ usize::from(self.$field.is_some()))*
            }

            /// Returns `true` if no slot is occupied.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Drops every component.
            pub fn clear(&mut self) {
                $(self.$field = None;)*
            }
        }

        $(
            impl Component for $ty {
                const KIND: ComponentKind = ComponentKind::$kind;

                fn slot(store: &ComponentStore) -> &Option<Self> {
                    &store.$field
                }

                fn slot_mut(store: &mut ComponentStore) -> &mut Option<Self> {
                    &mut store.$field
                }
            }
        )*
    };
}

component_store! {
    transform: Transform => Transform,
    rigidbody: Rigidbody => Rigidbody,
    health: Health => Health,
    renderer: Renderer => Renderer,
    collider: Collider => Collider,
    stats: Stats => Stats,
    weapon: Weapon => Weapon,
    ai: Ai => Ai,
    weapon_slot: WeaponSlot => WeaponSlot,
    enemy: Enemy => Enemy,
    projectile: Projectile => Projectile,
    pickup: Pickup => Pickup,
}

/// A simulated object.
///
/// # Lifecycle
///
/// - `active` entities participate in systems.
/// - Pooled entities sit inactive between uses but keep their components so
///   the owning pool can reset them in place.
/// - `destroyed` entities hold no components; the world drops them on its
///   next `maintain` pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    label: String,
    active: bool,
    destroyed: bool,
    components: ComponentStore,
}

impl Entity {
    /// Creates an active entity with no components.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique identifier for this entity
    /// * `tag` - Coarse type used by system filters
    /// * `label` - Human-readable name such as `"Enemy_fast"`
    #[must_use]
    pub fn new(id: EntityId, tag: EntityTag, label: impl Into<String>) -> Self {
        Self {
            id,
            tag,
            label: label.into(),
            active: true,
            destroyed: false,
            components: ComponentStore::default(),
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's type tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns `true` if the entity participates in systems.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` once [`Entity::destroy`] has run.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Returns `true` if the entity is active and not destroyed.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.active && !self.destroyed
    }

    /// Toggles participation in systems. Ignored on destroyed entities.
    pub fn set_active(&mut self, active: bool) {
        if self.destroyed {
            return;
        }
        self.active = active;
    }

    /// Releases every component and retires the entity.
    pub fn destroy(&mut self) {
        self.components.clear();
        self.active = false;
        self.destroyed = true;
    }

    /// Attaches `component`.
    ///
    /// Returns `false` and leaves the entity untouched if a component of the
    /// same kind is already attached, or if the entity is destroyed.
    pub fn add_component<C: Component>(&mut self, component: C) -> bool {
        if self.destroyed {
            tracing::warn!(entity = %self.id, kind = %C::KIND, "add_component on destroyed entity");
            return false;
        }
        let slot = C::slot_mut(&mut self.components);
        if slot.is_some() {
            tracing::warn!(
                entity = %self.id,
                label = %self.label,
                kind = %C::KIND,
                "duplicate component rejected"
            );
            return false;
        }
        *slot = Some(component);
        true
    }

    /// Detaches and returns the component of type `C`, if present.
    pub fn remove_component<C: Component>(&mut self) -> Option<C> {
        C::slot_mut(&mut self.components).take()
    }

    /// Returns the component of type `C`, if present.
    #[must_use]
    pub fn get<C: Component>(&self) -> Option<&C> {
        C::slot(&self.components).as_ref()
    }

    /// Returns the component of type `C` mutably, if present.
    #[must_use]
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        C::slot_mut(&mut self.components).as_mut()
    }

    /// Returns `true` if a component of `kind` is attached.
    #[must_use]
    pub const fn has_component(&self, kind: ComponentKind) -> bool {
        self.components.has(kind)
    }

    /// Returns `true` if every kind in `kinds` is attached.
    #[must_use]
    pub fn has_components(&self, kinds: &[ComponentKind]) -> bool {
        kinds.iter().all(|kind| self.components.has(*kind))
    }

    /// Returns the component registry.
    #[must_use]
    pub const fn components(&self) -> &ComponentStore {
        &self.components
    }
}
