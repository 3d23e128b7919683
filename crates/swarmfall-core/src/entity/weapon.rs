//! Weapon and loadout components.
//!
//! A [`Weapon`] is an instance of a catalogue entry: it copies the level
//! table at creation and then tracks its own level, cooldown and orbit
//! angle. A [`WeaponSlot`] is the player's bounded loadout.
//!
//! # Example
//!
//! ```
//! use swarmfall_core::config::GameConfig;
//! use swarmfall_core::entity::{SlotError, WeaponSlot};
//!
//! let config = GameConfig::default();
//! let mut slot = WeaponSlot::new();
//! slot.add_weapon("magic_bolt", &config).unwrap();
//!
//! assert!(matches!(
//!     slot.add_weapon("magic_bolt", &config),
//!     Err(SlotError::Duplicate(_))
//! ));
//! assert_eq!(slot.level_up("magic_bolt"), Ok(2));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{AttackKind, GameConfig, Targeting, WeaponConfig, WeaponLevel};

/// Identifies a weapon within its owner's loadout.
///
/// Keys are never reused by a slot, so a projectile fired by a weapon that
/// was later evolved away cannot latch onto its replacement.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeaponKey(u32);

impl WeaponKey {
    /// Creates a key from a raw value.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for WeaponKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeaponKey({})", self.0)
    }
}

/// A weapon instance.
///
/// `cooldown` only goes down through [`Weapon::tick`] and only goes back up
/// through [`Weapon::fire`]. The weapon may fire iff `cooldown <= 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    key: WeaponKey,
    id: String,
    attack: AttackKind,
    targeting: Targeting,
    manual: bool,
    grade: u8,
    level: u32,
    levels: Vec<WeaponLevel>,
    cooldown: f32,
    rotation: f32,
}

impl Weapon {
    /// Level-1 instance of catalogue entry `id`, ready to fire.
    #[must_use]
    pub fn from_config(key: WeaponKey, id: &str, config: &WeaponConfig) -> Self {
        Self {
            key,
            id: id.to_string(),
            attack: config.attack,
            targeting: config.targeting,
            manual: config.manual,
            grade: config.grade,
            level: 1,
            levels: config.levels.clone(),
            cooldown: 0.0,
            rotation: 0.0,
        }
    }

    /// Loadout key.
    #[must_use]
    pub const fn key(&self) -> WeaponKey {
        self.key
    }

    /// Catalogue id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Attack archetype.
    #[must_use]
    pub const fn attack(&self) -> AttackKind {
        self.attack
    }

    /// Targeting mode.
    #[must_use]
    pub const fn targeting(&self) -> Targeting {
        self.targeting
    }

    /// Returns `true` for weapons aimed by the input collaborator.
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        self.manual
    }

    /// Evolution grade.
    #[must_use]
    pub const fn grade(&self) -> u8 {
        self.grade
    }

    /// Current level, starting at 1.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Highest reachable level.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX).max(1)
    }

    /// Returns `true` at the last level.
    #[must_use]
    pub fn is_max_level(&self) -> bool {
        self.level >= self.max_level()
    }

    /// Stats of the current level; levels past the table reuse its last row.
    #[must_use]
    pub fn stats(&self) -> &WeaponLevel {
        let index = usize::try_from(self.level.saturating_sub(1)).unwrap_or(usize::MAX);
        self.levels
            .get(index)
            .or_else(|| self.levels.last())
            .unwrap_or(&WeaponLevel::FALLBACK)
    }

    /// Seconds until the weapon may fire.
    #[must_use]
    pub const fn cooldown(&self) -> f32 {
        self.cooldown
    }

    /// Orbit angle in radians, for rotating weapons.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Returns `true` iff the cooldown has elapsed.
    #[must_use]
    pub fn can_fire(&self) -> bool {
        self.cooldown <= 0.0
    }

    /// Advances the cooldown and orbit angle by `dt`.
    ///
    /// `cooldown_reduction` speeds the cooldown up: `0.25` ticks it 25% faster.
    pub fn tick(&mut self, dt: f32, cooldown_reduction: f32) {
        if dt <= 0.0 {
            return;
        }
        if self.cooldown > 0.0 {
            self.cooldown = (self.cooldown - dt * (1.0 + cooldown_reduction.max(0.0))).max(0.0);
        }
        if self.targeting == Targeting::Rotating && !self.manual {
            self.rotation =
                (self.rotation + self.stats().orbit_speed * dt).rem_euclid(std::f32::consts::TAU);
        }
    }

    /// Consumes the attack: the cooldown restarts at `1 / attack_speed`.
    pub fn fire(&mut self) {
        let attack_speed = self.stats().attack_speed;
        self.cooldown = if attack_speed > 0.0 {
            1.0 / attack_speed
        } else {
            f32::INFINITY
        };
    }

    /// Raises the level by one, clamped at the max. Returns the new level.
    pub fn level_up(&mut self) -> u32 {
        if !self.is_max_level() {
            self.level += 1;
        }
        self.level
    }
}

/// Error returned by [`WeaponSlot`] mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlotError {
    /// The loadout already holds [`WeaponSlot::CAPACITY`] weapons.
    #[error("weapon slot is full ({} weapons)", WeaponSlot::CAPACITY)]
    Full,
    /// The loadout already holds this weapon.
    #[error("weapon `{0}` is already equipped")]
    Duplicate(String),
    /// The loadout does not hold this weapon.
    #[error("weapon `{0}` is not equipped")]
    NotEquipped(String),
    /// An evolution input is below its max level.
    #[error("weapon `{0}` is not at max level")]
    NotMaxLevel(String),
    /// The evolution inputs have different grades.
    #[error("weapons `{0}` and `{1}` have different grades")]
    GradeMismatch(String, String),
    /// No recipe combines the two inputs.
    #[error("no evolution combines `{0}` and `{1}`")]
    NoRecipe(String, String),
}

/// The player's bounded loadout of distinct weapons.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponSlot {
    weapons: Vec<Weapon>,
    next_key: u32,
}

impl WeaponSlot {
    /// Maximum number of weapons held at once.
    pub const CAPACITY: usize = 10;

    /// An empty loadout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of equipped weapons.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weapons.len()
    }

    /// Returns `true` if nothing is equipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weapons.is_empty()
    }

    /// Returns `true` if weapon `id` is equipped.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Weapon `id`, if equipped.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Weapon> {
        self.weapons.iter().find(|weapon| weapon.id == id)
    }

    /// Weapon with loadout key `key`, if still equipped.
    #[must_use]
    pub fn get_by_key(&self, key: WeaponKey) -> Option<&Weapon> {
        self.weapons.iter().find(|weapon| weapon.key == key)
    }

    /// Equipped weapons in equip order.
    pub fn iter(&self) -> impl Iterator<Item = &Weapon> {
        self.weapons.iter()
    }

    /// Equipped weapons in equip order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Weapon> {
        self.weapons.iter_mut()
    }

    /// Equips catalogue entry `id` at level 1.
    ///
    /// Unknown ids resolve to the default weapon.
    ///
    /// # Errors
    ///
    /// [`SlotError::Duplicate`] if the resolved weapon is already equipped,
    /// [`SlotError::Full`] if the loadout is at capacity.
    pub fn add_weapon(&mut self, id: &str, config: &GameConfig) -> Result<WeaponKey, SlotError> {
        let (resolved, weapon_config) = config.weapon(id);
        if self.contains(resolved) {
            return Err(SlotError::Duplicate(resolved.to_string()));
        }
        if self.weapons.len() >= Self::CAPACITY {
            return Err(SlotError::Full);
        }
        let key = WeaponKey::new(self.next_key);
        self.next_key += 1;
        self.weapons
            .push(Weapon::from_config(key, resolved, weapon_config));
        tracing::debug!(weapon = resolved, key = key.as_u32(), "weapon equipped");
        Ok(key)
    }

    /// Unequips weapon `id`.
    pub fn remove_weapon(&mut self, id: &str) -> Option<Weapon> {
        let index = self.weapons.iter().position(|weapon| weapon.id == id)?;
        Some(self.weapons.remove(index))
    }

    /// Raises weapon `id` one level, clamped at its max. Returns the level.
    ///
    /// # Errors
    ///
    /// [`SlotError::NotEquipped`] if `id` is not equipped.
    pub fn level_up(&mut self, id: &str) -> Result<u32, SlotError> {
        self.weapons
            .iter_mut()
            .find(|weapon| weapon.id == id)
            .map(Weapon::level_up)
            .ok_or_else(|| SlotError::NotEquipped(id.to_string()))
    }

    /// Combines two max-level weapons of equal grade into the recipe result.
    ///
    /// Both inputs are removed and the result is equipped at level 1.
    ///
    /// # Errors
    ///
    /// Fails without touching the loadout if either input is missing or
    /// below max level, if their grades differ, if no recipe matches, or if
    /// the result is already equipped.
    pub fn evolve(&mut self, a: &str, b: &str, config: &GameConfig) -> Result<WeaponKey, SlotError> {
        let first = self
            .get(a)
            .ok_or_else(|| SlotError::NotEquipped(a.to_string()))?;
        let second = self
            .get(b)
            .ok_or_else(|| SlotError::NotEquipped(b.to_string()))?;
        for weapon in [first, second] {
            if !weapon.is_max_level() {
                return Err(SlotError::NotMaxLevel(weapon.id.clone()));
            }
        }
        if first.grade != second.grade {
            return Err(SlotError::GradeMismatch(a.to_string(), b.to_string()));
        }
        let recipe = config
            .evolution(a, b)
            .ok_or_else(|| SlotError::NoRecipe(a.to_string(), b.to_string()))?;
        if self.contains(&recipe.result) {
            return Err(SlotError::Duplicate(recipe.result.clone()));
        }

        self.remove_weapon(a);
        self.remove_weapon(b);
        let key = self.add_weapon(&recipe.result, config)?;
        tracing::debug!(base = a, partner = b, result = %recipe.result, "weapon evolved");
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(left: f32, right: f32) {
        assert!((left - right).abs() < 1e-5, "{left} != {right}");
    }

    fn config() -> GameConfig {
        GameConfig::default()
    }

    fn max_out(slot: &mut WeaponSlot, id: &str) {
        while !slot.get(id).unwrap().is_max_level() {
            slot.level_up(id).unwrap();
        }
    }

    mod weapon_tests {
        use super::*;

        fn bolt() -> Weapon {
            let config = config();
            Weapon::from_config(WeaponKey::new(0), "magic_bolt", &config.weapons["magic_bolt"])
        }

        #[test]
        fn new_weapon_can_fire() {
            let weapon = bolt();
            assert!(weapon.can_fire());
            assert_eq!(weapon.level(), 1);
        }

        #[test]
        fn fire_sets_cooldown_to_inverse_attack_speed() {
            let mut weapon = bolt();
            weapon.fire();
            assert_eq!(weapon.cooldown(), 1.0 / weapon.stats().attack_speed);
            assert!(!weapon.can_fire());
        }

        #[test]
        fn fire_resets_even_mid_cooldown() {
            let mut weapon = bolt();
            weapon.fire();
            weapon.tick(0.3, 0.0);
            weapon.fire();
            assert_eq!(weapon.cooldown(), 1.0 / weapon.stats().attack_speed);
        }

        #[test]
        fn tick_counts_down_and_floors_at_zero() {
            let mut weapon = bolt();
            weapon.fire();
            weapon.tick(0.25, 0.0);
            assert_close(weapon.cooldown(), 0.75);
            weapon.tick(10.0, 0.0);
            assert_eq!(weapon.cooldown(), 0.0);
            assert!(weapon.can_fire());
        }

        #[test]
        fn cooldown_reduction_speeds_up_tick() {
            let mut weapon = bolt();
            weapon.fire();
            weapon.tick(0.25, 1.0);
            assert_close(weapon.cooldown(), 0.5);
        }

        #[test]
        fn level_up_clamps() {
            let mut weapon = bolt();
            for _ in 0..20 {
                weapon.level_up();
            }
            assert_eq!(weapon.level(), weapon.max_level());
            assert!(weapon.is_max_level());
        }

        #[test]
        fn rotation_advances_for_rotating_weapons() {
            let config = config();
            let mut blade =
                Weapon::from_config(WeaponKey::new(0), "orbit_blade", &config.weapons["orbit_blade"]);
            let speed = blade.stats().orbit_speed;
            blade.tick(0.1, 0.0);
            assert_close(blade.rotation(), speed * 0.1);

            let mut bolt = bolt();
            bolt.tick(0.1, 0.0);
            assert_eq!(bolt.rotation(), 0.0);
        }

        #[test]
        fn stats_past_the_table_reuse_last_row() {
            let config = config();
            let mut weapon = Weapon::from_config(
                WeaponKey::new(0),
                "magic_bolt",
                &WeaponConfig {
                    levels: config.weapons["magic_bolt"].levels[..2].to_vec(),
                    ..config.weapons["magic_bolt"].clone()
                },
            );
            weapon.level = 7;
            assert_eq!(weapon.stats(), &config.weapons["magic_bolt"].levels[1]);
        }
    }

    mod slot_tests {
        use super::*;

        #[test]
        fn rejects_duplicates() {
            let config = config();
            let mut slot = WeaponSlot::new();
            slot.add_weapon("sword", &config).unwrap();
            assert_eq!(
                slot.add_weapon("sword", &config),
                Err(SlotError::Duplicate("sword".to_string()))
            );
            assert_eq!(slot.len(), 1);
        }

        #[test]
        fn rejects_an_eleventh_weapon() {
            let mut config = config();
            for index in 0..11 {
                config
                    .weapons
                    .insert(format!("extra_{index}"), WeaponConfig::default());
            }
            let mut slot = WeaponSlot::new();
            for index in 0..10 {
                slot.add_weapon(&format!("extra_{index}"), &config).unwrap();
            }
            assert_eq!(slot.add_weapon("extra_10", &config), Err(SlotError::Full));
            assert_eq!(slot.len(), WeaponSlot::CAPACITY);
        }

        #[test]
        fn unknown_id_resolves_to_default() {
            let config = config();
            let mut slot = WeaponSlot::new();
            slot.add_weapon("laser_sword", &config).unwrap();
            assert!(slot.contains("magic_bolt"));
        }

        #[test]
        fn keys_are_never_reused() {
            let config = config();
            let mut slot = WeaponSlot::new();
            let first = slot.add_weapon("sword", &config).unwrap();
            slot.remove_weapon("sword");
            let second = slot.add_weapon("sword", &config).unwrap();
            assert_ne!(first, second);
        }

        #[test]
        fn level_up_missing_weapon_fails() {
            let mut slot = WeaponSlot::new();
            assert_eq!(
                slot.level_up("sword"),
                Err(SlotError::NotEquipped("sword".to_string()))
            );
        }
    }

    mod evolution_tests {
        use super::*;

        #[test]
        fn max_level_pair_evolves() {
            let config = config();
            let mut slot = WeaponSlot::new();
            slot.add_weapon("magic_bolt", &config).unwrap();
            slot.add_weapon("chain_spark", &config).unwrap();
            max_out(&mut slot, "magic_bolt");
            max_out(&mut slot, "chain_spark");

            slot.evolve("chain_spark", "magic_bolt", &config).unwrap();

            assert_eq!(slot.len(), 1);
            assert!(!slot.contains("magic_bolt"));
            assert!(!slot.contains("chain_spark"));
            assert_eq!(slot.get("arcane_storm").unwrap().level(), 1);
        }

        #[test]
        fn below_max_level_is_rejected() {
            let config = config();
            let mut slot = WeaponSlot::new();
            slot.add_weapon("orbit_blade", &config).unwrap();
            slot.add_weapon("frost_nova", &config).unwrap();
            max_out(&mut slot, "orbit_blade");

            assert_eq!(
                slot.evolve("orbit_blade", "frost_nova", &config),
                Err(SlotError::NotMaxLevel("frost_nova".to_string()))
            );
            assert_eq!(slot.len(), 2);
        }

        #[test]
        fn pair_without_recipe_is_rejected() {
            let config = config();
            let mut slot = WeaponSlot::new();
            slot.add_weapon("sword", &config).unwrap();
            slot.add_weapon("beam", &config).unwrap();
            max_out(&mut slot, "sword");
            max_out(&mut slot, "beam");

            assert!(matches!(
                slot.evolve("sword", "beam", &config),
                Err(SlotError::NoRecipe(_, _))
            ));
        }

        #[test]
        fn grade_mismatch_is_rejected() {
            let mut config = config();
            if let Some(spark) = config.weapons.get_mut("chain_spark") {
                spark.grade = 3;
            }
            let mut slot = WeaponSlot::new();
            slot.add_weapon("magic_bolt", &config).unwrap();
            slot.add_weapon("chain_spark", &config).unwrap();
            max_out(&mut slot, "magic_bolt");
            max_out(&mut slot, "chain_spark");

            assert!(matches!(
                slot.evolve("magic_bolt", "chain_spark", &config),
                Err(SlotError::GradeMismatch(_, _))
            ));
        }

        #[test]
        fn missing_input_is_rejected() {
            let config = config();
            let mut slot = WeaponSlot::new();
            slot.add_weapon("magic_bolt", &config).unwrap();
            assert_eq!(
                slot.evolve("magic_bolt", "chain_spark", &config),
                Err(SlotError::NotEquipped("chain_spark".to_string()))
            );
        }
    }
}
