//! Plain-data components.
//!
//! Each component owns only its own state. The weapon components live in
//! [`super::weapon`].

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{AiBehavior, DropKind, DropRates, EnemyConfig, PlayerConfig};

use super::{EntityId, WeaponKey};

// =============================================================================
// Spatial
// =============================================================================

/// Position, facing and uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// World position.
    pub position: Vec2,
    /// Facing in radians.
    pub rotation: f32,
    /// Uniform scale.
    pub scale: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: 1.0,
        }
    }
}

impl Transform {
    /// A transform at `position` facing +x.
    #[must_use]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Kinematic state integrated by the movement system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rigidbody {
    /// Units per second.
    pub velocity: Vec2,
    /// Units per second squared.
    pub acceleration: Vec2,
    /// Fraction of velocity lost per second.
    pub drag: f32,
    /// Speed cap; `0` means uncapped.
    pub max_speed: f32,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            drag: 0.0,
            max_speed: 0.0,
        }
    }
}

impl Rigidbody {
    /// A body capped at `max_speed`.
    #[must_use]
    pub fn with_max_speed(max_speed: f32) -> Self {
        Self {
            max_speed,
            ..Self::default()
        }
    }

    /// Zeroes velocity and acceleration.
    pub fn stop(&mut self) {
        self.velocity = Vec2::ZERO;
        self.acceleration = Vec2::ZERO;
    }
}

// =============================================================================
// Health
// =============================================================================

/// Result of [`Health::take_damage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// The target was dead or invincible; nothing changed.
    Ignored,
    /// Health dropped and the target survived.
    Damaged,
    /// This hit brought health to zero.
    Killed,
}

/// Hit points with an invincibility window.
///
/// `current` always lies in `[0, max]`. The dead flag is raised exactly once,
/// on the hit that reaches zero, and only [`Health::revive`] or
/// [`Health::reset`] lowers it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    max: f32,
    current: f32,
    invincible: bool,
    invincibility_timer: f32,
    dead: bool,
}

impl Health {
    /// Full health at `max`.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { 0.0 };
        Self {
            max,
            current: max,
            invincible: false,
            invincibility_timer: 0.0,
            dead: false,
        }
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Current health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Returns `true` once health has reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.dead
    }

    /// Returns `true` while the invincibility window is open.
    #[must_use]
    pub const fn is_invincible(&self) -> bool {
        self.invincible
    }

    /// Seconds left in the invincibility window.
    #[must_use]
    pub const fn invincibility_remaining(&self) -> f32 {
        self.invincibility_timer
    }

    /// `current / max`, or `0` for a zero-max pool.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Applies `amount` damage.
    ///
    /// A dead or invincible target, and a non-positive amount, are silent
    /// no-ops.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead || self.invincible || amount.is_nan() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }
        self.current = (self.current - amount).max(0.0);
        if self.current <= 0.0 {
            self.current = 0.0;
            self.dead = true;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Restores up to `amount` health and returns how much was restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || amount.is_nan() || amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Opens (or extends) an invincibility window of `duration` seconds.
    pub fn set_invincible(&mut self, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        self.invincible = true;
        self.invincibility_timer = self.invincibility_timer.max(duration);
    }

    /// Counts the invincibility window down by `dt`.
    pub fn tick(&mut self, dt: f32) {
        if !self.invincible {
            return;
        }
        self.invincibility_timer -= dt;
        if self.invincibility_timer <= 0.0 {
            self.invincibility_timer = 0.0;
            self.invincible = false;
        }
    }

    /// Clears the dead flag and restores full health.
    pub fn revive(&mut self) {
        self.dead = false;
        self.current = self.max;
    }

    /// Replaces the pool with a fresh one at `max`.
    pub fn reset(&mut self, max: f32) {
        *self = Self::new(max);
    }
}

// =============================================================================
// Rendering and collision
// =============================================================================

/// Primitive drawn for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderShape {
    /// Filled circle of diameter `size`.
    Circle,
    /// Axis-aligned square of side `size`.
    Square,
    /// Square rotated 45 degrees.
    Diamond,
}

/// Draw parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Renderer {
    /// Primitive to draw.
    pub shape: RenderShape,
    /// RGBA colour.
    pub color: [u8; 4],
    /// Size in world units.
    pub size: f32,
    /// Draw order; lower layers first.
    pub layer: i32,
    /// Hidden renderers are skipped.
    pub visible: bool,
}

impl Renderer {
    /// A visible renderer.
    #[must_use]
    pub const fn new(shape: RenderShape, color: [u8; 4], size: f32, layer: i32) -> Self {
        Self {
            shape,
            color,
            size,
            layer,
            visible: true,
        }
    }
}

bitflags! {
    /// Collision layer bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionLayers: u32 {
        /// The player.
        const PLAYER = 1;
        /// Enemies.
        const ENEMY = 1 << 1;
        /// Player projectiles and damage zones.
        const PROJECTILE = 1 << 2;
        /// Pickups.
        const PICKUP = 1 << 3;
    }
}

/// Collision geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Circle centred on the transform.
    Circle {
        /// Radius.
        radius: f32,
    },
    /// Axis-aligned box centred on the transform.
    Rect {
        /// Half width and half height.
        half_extents: Vec2,
    },
}

/// Collision shape plus layer filtering.
///
/// A pair is tested only when each side's layer intersects the other's mask.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    /// Geometry.
    pub shape: Shape,
    /// Layers this collider lives on.
    pub layer: CollisionLayers,
    /// Layers this collider reacts to.
    pub mask: CollisionLayers,
    /// Disabled colliders are skipped.
    pub enabled: bool,
}

impl Collider {
    /// An enabled circle collider.
    #[must_use]
    pub const fn circle(radius: f32, layer: CollisionLayers, mask: CollisionLayers) -> Self {
        Self {
            shape: Shape::Circle { radius },
            layer,
            mask,
            enabled: true,
        }
    }

    /// An enabled box collider.
    #[must_use]
    pub const fn rect(half_extents: Vec2, layer: CollisionLayers, mask: CollisionLayers) -> Self {
        Self {
            shape: Shape::Rect { half_extents },
            layer,
            mask,
            enabled: true,
        }
    }

    /// Returns `true` if both colliders accept each other.
    #[must_use]
    pub fn accepts(&self, other: &Self) -> bool {
        self.layer.intersects(other.mask) && other.layer.intersects(self.mask)
    }

    /// Sets the radius of a circle collider; boxes are left alone.
    pub fn set_radius(&mut self, new_radius: f32) {
        if let Shape::Circle { radius } = &mut self.shape {
            *radius = new_radius;
        }
    }
}

// =============================================================================
// Progression
// =============================================================================

/// Player stats and progression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Current level, starting at 1.
    pub level: u32,
    /// Experience banked toward the next level.
    pub experience: f32,
    /// Experience required for the next level.
    pub exp_to_next: f32,
    /// Growth factor of `exp_to_next` per level.
    pub exp_growth: f32,
    /// Collected gold.
    pub gold: u32,
    /// Base attack power.
    pub attack_power: f32,
    /// Movement speed.
    pub move_speed: f32,
    /// Cooldown speed-up fraction.
    pub cooldown_reduction: f32,
    /// Critical chance in `[0, 1]`.
    pub crit_chance: f32,
    /// Critical damage multiplier.
    pub crit_multiplier: f32,
    /// Additive final damage bonus.
    pub final_damage_bonus: f32,
    /// Health regenerated per second.
    pub hp_regen: f32,
    /// Pickup attraction radius.
    pub magnet_range: f32,
    /// Multiplier on experience gains.
    pub exp_multiplier: f32,
}

impl Stats {
    /// Level-1 stats from the player table.
    #[must_use]
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self {
            level: 1,
            experience: 0.0,
            exp_to_next: config.base_exp_to_next.max(1.0),
            exp_growth: config.exp_growth,
            gold: 0,
            attack_power: config.attack_power,
            move_speed: config.move_speed,
            cooldown_reduction: config.cooldown_reduction,
            crit_chance: config.crit_chance,
            crit_multiplier: config.crit_multiplier,
            final_damage_bonus: config.final_damage_bonus,
            hp_regen: config.hp_regen,
            magnet_range: config.magnet_range,
            exp_multiplier: config.exp_multiplier,
        }
    }

    /// Banks `amount` experience scaled by the experience multiplier.
    pub fn add_experience(&mut self, amount: f32) {
        if amount > 0.0 {
            self.experience += amount * self.exp_multiplier;
        }
    }

    /// Adds `amount` gold, rounded to the nearest coin.
    pub fn add_gold(&mut self, amount: f32) {
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let coins = amount.round().clamp(0.0, u32::MAX as f32) as u32;
        self.gold = self.gold.saturating_add(coins);
    }

    /// Consumes one level's worth of banked experience, if enough is banked,
    /// and returns the new level.
    ///
    /// Call repeatedly to process several level-ups from one large gain.
    pub fn take_level_up(&mut self) -> Option<u32> {
        if self.experience < self.exp_to_next {
            return None;
        }
        self.experience -= self.exp_to_next;
        self.level += 1;
        // The epsilon keeps float noise from bumping 10 * 1.2 up to 13.
        self.exp_to_next = (self.exp_to_next * self.exp_growth - 1e-3).ceil().max(1.0);
        Some(self.level)
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::from_config(&PlayerConfig::default())
    }
}

// =============================================================================
// Enemies
// =============================================================================

/// Steering state of an enemy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ai {
    /// Steering behaviour.
    pub behavior: AiBehavior,
    /// Cruise speed.
    pub speed: f32,
    /// Seconds between dashes.
    pub charge_interval: f32,
    /// Dash length.
    pub charge_duration: f32,
    /// Dash speed multiplier.
    pub charge_multiplier: f32,
    /// Seconds until the next dash.
    pub charge_cooldown: f32,
    /// Seconds left in the current dash.
    pub charge_remaining: f32,
    /// Seconds during which steering is suspended (knockback).
    pub stagger: f32,
}

impl Ai {
    /// Fresh steering state for an archetype.
    #[must_use]
    pub fn from_config(config: &EnemyConfig) -> Self {
        Self {
            behavior: config.behavior,
            speed: config.speed,
            charge_interval: config.charge_interval,
            charge_duration: config.charge_duration,
            charge_multiplier: config.charge_multiplier,
            charge_cooldown: config.charge_interval,
            charge_remaining: 0.0,
            stagger: 0.0,
        }
    }

    /// Returns `true` during a dash.
    #[must_use]
    pub fn is_charging(&self) -> bool {
        self.charge_remaining > 0.0
    }

    /// Suspends steering for `duration` seconds.
    pub fn stagger(&mut self, duration: f32) {
        self.stagger = self.stagger.max(duration);
    }

    /// Restores the initial timers.
    pub fn reset(&mut self) {
        self.charge_cooldown = self.charge_interval;
        self.charge_remaining = 0.0;
        self.stagger = 0.0;
    }
}

/// Archetype data carried by an enemy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Archetype id, e.g. `"fast"`.
    pub archetype: String,
    /// Contact damage before wave scaling.
    pub base_damage: f32,
    /// Experience carried by its gem.
    pub exp: f32,
    /// Gold carried by its coin.
    pub gold: f32,
    /// Loot table.
    pub drop_rates: DropRates,
}

impl Enemy {
    /// Archetype data from the enemy table.
    #[must_use]
    pub fn from_config(archetype: &str, config: &EnemyConfig) -> Self {
        Self {
            archetype: archetype.to_string(),
            base_damage: config.damage,
            exp: config.exp,
            gold: config.gold,
            drop_rates: config.drop_rates,
        }
    }
}

// =============================================================================
// Projectiles and pickups
// =============================================================================

/// How a projectile moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectileMotion {
    /// Travels along its rigidbody velocity.
    Linear,
    /// Held on a circle around the firing entity.
    Orbit {
        /// Angle added to the weapon's rotation.
        angle_offset: f32,
        /// Circle radius.
        radius: f32,
    },
    /// Stationary damage area.
    Zone,
}

/// Firing entity and weapon of a projectile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectileSource {
    /// Entity that fired.
    pub owner: EntityId,
    /// Weapon that fired, within the owner's loadout.
    pub weapon: WeaponKey,
}

/// Per-enemy re-hit cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitRecord {
    /// Enemy that was hit.
    pub enemy: EntityId,
    /// Seconds until it may be hit again; infinite for one-shot projectiles.
    pub cooldown: f32,
}

/// Damage payload of a projectile entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    /// Damage per hit.
    pub damage: f32,
    /// Whether the fire event that produced it was critical.
    pub critical: bool,
    /// Hits left; [`Projectile::PIERCE_INFINITE`] never runs out.
    pub pierce: u32,
    /// Seconds until expiry.
    pub lifetime: f32,
    /// Motion model.
    pub motion: ProjectileMotion,
    /// Firing entity and weapon.
    pub source: Option<ProjectileSource>,
    /// Seconds before the same enemy may be hit again; `None` never re-hits.
    pub rehit_interval: Option<f32>,
    hits: Vec<HitRecord>,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            damage: 0.0,
            critical: false,
            pierce: 1,
            lifetime: 0.0,
            motion: ProjectileMotion::Linear,
            source: None,
            rehit_interval: None,
            hits: Vec::new(),
        }
    }
}

impl Projectile {
    /// Pierce value that never runs out.
    pub const PIERCE_INFINITE: u32 = u32::MAX;

    /// Returns `true` if `enemy` is still on re-hit cooldown.
    #[must_use]
    pub fn has_hit(&self, enemy: EntityId) -> bool {
        self.hits.iter().any(|record| record.enemy == enemy)
    }

    /// Records a hit on `enemy` and spends one pierce.
    ///
    /// Returns `true` when the projectile has no pierce left.
    pub fn register_hit(&mut self, enemy: EntityId) -> bool {
        self.hits.push(HitRecord {
            enemy,
            cooldown: self.rehit_interval.unwrap_or(f32::INFINITY),
        });
        if self.pierce == Self::PIERCE_INFINITE {
            return false;
        }
        self.pierce = self.pierce.saturating_sub(1);
        self.pierce == 0
    }

    /// Counts re-hit cooldowns down and forgets the expired ones.
    pub fn tick_hits(&mut self, dt: f32) {
        self.hits.retain_mut(|record| {
            record.cooldown -= dt;
            record.cooldown > 0.0
        });
    }

    /// Clears the hit history, keeping its allocation.
    pub fn clear_hits(&mut self) {
        self.hits.clear();
    }
}

/// A collectible.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// What collecting it grants.
    pub kind: DropKind,
    /// Experience, gold or health amount.
    pub value: f32,
    /// Set on collection; the spawn manager recycles it afterwards.
    pub collected: bool,
}

impl Pickup {
    /// An uncollected pickup.
    #[must_use]
    pub const fn new(kind: DropKind, value: f32) -> Self {
        Self {
            kind,
            value,
            collected: false,
        }
    }
}
