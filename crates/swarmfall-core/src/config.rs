//! Balance data for the simulation.
//!
//! Every tunable number the core uses lives in [`GameConfig`]: player base
//! stats, combat windows, spawn cadence and wave scaling, pool sizes, the
//! enemy archetype table, the weapon catalogue and the evolution recipes.
//!
//! The `Default` impls carry the built-in tables. A JSON document may
//! override any subset of fields; anything it omits keeps its default.
//!
//! # Example
//!
//! ```
//! use swarmfall_core::config::GameConfig;
//!
//! let config = GameConfig::from_json_str(r#"{ "spawn": { "max_enemies": 40 } }"#).unwrap();
//! assert_eq!(config.spawn.max_enemies, 40);
//! assert_eq!(config.spawn.spawn_rate(1), GameConfig::default().spawn.base_spawn_rate);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Archetype id used when an enemy lookup misses.
pub const DEFAULT_ENEMY: &str = "normal";

/// Weapon id used when a weapon lookup misses.
pub const DEFAULT_WEAPON: &str = "magic_bolt";

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document parsed but breaks a balance-data rule.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// =============================================================================
// Engine / Player / Combat
// =============================================================================

/// Frame-driver constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound applied to every incoming frame delta, in seconds.
    pub max_delta: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { max_delta: 0.1 }
    }
}

/// Player base stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting and maximum health.
    pub max_health: f32,
    /// Movement speed in units per second.
    pub move_speed: f32,
    /// Collider radius.
    pub radius: f32,
    /// Base attack power fed into every weapon's damage formula.
    pub attack_power: f32,
    /// Fractional cooldown speed-up (0.2 = cooldowns tick 20% faster).
    pub cooldown_reduction: f32,
    /// Probability in `[0, 1]` that a fire event is critical.
    pub crit_chance: f32,
    /// Damage multiplier applied on a critical fire event.
    pub crit_multiplier: f32,
    /// Additive final damage bonus (0.1 = +10%).
    pub final_damage_bonus: f32,
    /// Health regenerated per second.
    pub hp_regen: f32,
    /// Radius inside which pickups are pulled toward the player.
    pub magnet_range: f32,
    /// Multiplier applied to every experience pickup.
    pub exp_multiplier: f32,
    /// Experience needed for the first level-up.
    pub base_exp_to_next: f32,
    /// Growth factor of the experience requirement per level.
    pub exp_growth: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            move_speed: 200.0,
            radius: 16.0,
            attack_power: 10.0,
            cooldown_reduction: 0.0,
            crit_chance: 0.05,
            crit_multiplier: 2.0,
            final_damage_bonus: 0.0,
            hp_regen: 0.0,
            magnet_range: 100.0,
            exp_multiplier: 1.0,
            base_exp_to_next: 10.0,
            exp_growth: 1.2,
        }
    }
}

/// Damage-resolution constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Invincibility window granted to the player after a contact hit.
    pub player_invincibility: f32,
    /// Speed imparted to an enemy pushed away from the player after a hit.
    pub knockback_impulse: f32,
    /// Seconds during which a knocked-back enemy ignores its steering.
    pub knockback_duration: f32,
    /// Health restored by a `health` pickup.
    pub health_drop_heal: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            player_invincibility: 0.5,
            knockback_impulse: 300.0,
            knockback_duration: 0.15,
            health_drop_heal: 20.0,
        }
    }
}

// =============================================================================
// Spawning
// =============================================================================

/// Spawn cadence, wave progression and wave scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Seconds between spawns at wave 1.
    pub base_spawn_rate: f32,
    /// Seconds removed from the spawn interval per wave.
    pub spawn_rate_decrease: f32,
    /// Floor of the spawn interval.
    pub min_spawn_rate: f32,
    /// Seconds per wave.
    pub wave_duration: f32,
    /// Radius of the ring around the player on which enemies appear.
    pub spawn_radius: f32,
    /// Enemies farther than this from the player are recycled.
    pub despawn_radius: f32,
    /// Live-enemy cap; spawns beyond it are skipped.
    pub max_enemies: usize,
    /// Per-wave health multiplier.
    pub health_scale: f32,
    /// Per-wave contact damage multiplier.
    pub damage_scale: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            base_spawn_rate: 2.0,
            spawn_rate_decrease: 0.1,
            min_spawn_rate: 0.3,
            wave_duration: 30.0,
            spawn_radius: 600.0,
            despawn_radius: 1200.0,
            max_enemies: 300,
            health_scale: 1.1,
            damage_scale: 1.05,
        }
    }
}

impl SpawnConfig {
    /// Spawn interval for `wave`: `max(MIN, BASE - (wave - 1) * DECREASE)`.
    #[must_use]
    pub fn spawn_rate(&self, wave: u32) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let steps = wave.saturating_sub(1) as f32;
        (self.base_spawn_rate - steps * self.spawn_rate_decrease).max(self.min_spawn_rate)
    }

    /// Enemy health at `wave`.
    #[must_use]
    pub fn scaled_health(&self, base: f32, wave: u32) -> f32 {
        scaled_stat(base, self.health_scale, wave)
    }

    /// Enemy contact damage at `wave`.
    #[must_use]
    pub fn scaled_damage(&self, base: f32, wave: u32) -> f32 {
        scaled_stat(base, self.damage_scale, wave)
    }
}

/// `floor(base * scale^(wave - 1))`, saturating at `u32::MAX`.
///
/// The power is evaluated in `f64` so large waves saturate instead of
/// producing infinities or NaN.
///
/// ```
/// use swarmfall_core::config::scaled_stat;
///
/// assert_eq!(scaled_stat(50.0, 1.1, 1), 50.0);
/// assert_eq!(scaled_stat(50.0, 1.1, 5), 73.0);
/// assert_eq!(scaled_stat(50.0, 1.1, 100_000), u32::MAX as f32);
/// ```
#[must_use]
pub fn scaled_stat(base: f32, scale: f32, wave: u32) -> f32 {
    let exponent = i32::try_from(wave.saturating_sub(1)).unwrap_or(i32::MAX);
    let raw = (f64::from(base) * f64::from(scale).powi(exponent)).floor();
    let capped = if raw.is_nan() {
        0.0
    } else {
        raw.clamp(0.0, f64::from(u32::MAX))
    };
    #[allow(clippy::cast_possible_truncation)]
    let value = capped as f32;
    value
}

/// Bounds for one object pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Instances pre-built at warm-up.
    pub initial: usize,
    /// Hard cap on instances ever built.
    pub max: usize,
    /// Instances built per growth step once the free set runs dry.
    pub growth: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            initial: 32,
            max: 256,
            growth: 16,
        }
    }
}

/// Pool bounds for each pooled entity family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolsConfig {
    /// Per-archetype enemy pool.
    pub enemy: PoolConfig,
    /// Projectile pool.
    pub projectile: PoolConfig,
    /// Per-kind pickup pool.
    pub drop: PoolConfig,
}

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            enemy: PoolConfig {
                initial: 20,
                max: 300,
                growth: 10,
            },
            projectile: PoolConfig {
                initial: 100,
                max: 600,
                growth: 25,
            },
            drop: PoolConfig {
                initial: 50,
                max: 400,
                growth: 25,
            },
        }
    }
}

// =============================================================================
// Enemies and drops
// =============================================================================

/// Steering behaviour of an enemy archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiBehavior {
    /// Walk straight at the player.
    Chase,
    /// Walk at the player and periodically dash.
    Charge,
}

/// Kind of pickup an enemy can leave behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropKind {
    /// Grants experience.
    Experience,
    /// Grants gold.
    Gold,
    /// Restores health.
    Health,
}

impl DropKind {
    /// All drop kinds, in roll order.
    pub const ALL: [Self; 3] = [Self::Experience, Self::Gold, Self::Health];

    /// Lowercase name used in entity labels.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Experience => "experience",
            Self::Gold => "gold",
            Self::Health => "health",
        }
    }
}

/// Independent per-kind drop probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropRates {
    /// Chance of an experience gem.
    pub experience: f32,
    /// Chance of a coin.
    pub gold: f32,
    /// Chance of a health pickup.
    pub health: f32,
}

impl Default for DropRates {
    fn default() -> Self {
        Self {
            experience: 1.0,
            gold: 0.1,
            health: 0.01,
        }
    }
}

impl DropRates {
    /// Probability for `kind`.
    #[must_use]
    pub const fn rate(&self, kind: DropKind) -> f32 {
        match kind {
            DropKind::Experience => self.experience,
            DropKind::Gold => self.gold,
            DropKind::Health => self.health,
        }
    }
}

/// One enemy archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// First wave at which the archetype may spawn.
    pub unlock_wave: u32,
    /// Relative weight in the spawn draw.
    pub weight: f32,
    /// Health at wave 1.
    pub health: f32,
    /// Contact damage at wave 1.
    pub damage: f32,
    /// Movement speed.
    pub speed: f32,
    /// Collider radius.
    pub radius: f32,
    /// Experience carried by its gem.
    pub exp: f32,
    /// Gold carried by its coin.
    pub gold: f32,
    /// Loot table.
    pub drop_rates: DropRates,
    /// Steering behaviour.
    pub behavior: AiBehavior,
    /// Seconds between dashes (`charge` only).
    pub charge_interval: f32,
    /// Dash length in seconds (`charge` only).
    pub charge_duration: f32,
    /// Dash speed multiplier (`charge` only).
    pub charge_multiplier: f32,
    /// Render colour.
    pub color: [u8; 4],
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            unlock_wave: 1,
            weight: 10.0,
            health: 50.0,
            damage: 10.0,
            speed: 80.0,
            radius: 12.0,
            exp: 1.0,
            gold: 1.0,
            drop_rates: DropRates::default(),
            behavior: AiBehavior::Chase,
            charge_interval: 3.0,
            charge_duration: 0.5,
            charge_multiplier: 3.0,
            color: [200, 60, 60, 255],
        }
    }
}

/// Pickup appearance and magnet behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropConfig {
    /// Collider radius of every pickup.
    pub radius: f32,
    /// Speed at which magnetised pickups travel toward the player.
    pub magnet_speed: f32,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            radius: 8.0,
            magnet_speed: 400.0,
        }
    }
}

// =============================================================================
// Weapons
// =============================================================================

/// Shape of a weapon's attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    /// Angular sector sweep in front of the caster.
    MeleeSwing,
    /// Travelling projectile entities.
    Projectile,
    /// A single very fast, very high pierce projectile.
    Laser,
    /// Damage applied straight to targets, no projectile entity.
    DirectDamage,
    /// Damage applied over a radius.
    AreaDamage,
}

/// How an auto-fire weapon picks its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Targeting {
    /// Closest enemy in range.
    Nearest,
    /// Uniformly random directions.
    Random,
    /// Ring of projectiles orbiting the caster.
    Rotating,
    /// Several distinct random enemies in range.
    MultiRandom,
    /// Damage zones dropped at random points near the caster.
    Area,
}

/// Stats of one weapon level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponLevel {
    /// Damage multiplier in percent of attack power.
    pub damage: f32,
    /// Fire events per second.
    pub attack_speed: f32,
    /// Projectiles per volley, or orbiters per ring.
    pub projectile_count: u32,
    /// Projectile travel speed.
    pub projectile_speed: f32,
    /// Angle between neighbouring projectiles of a volley, in degrees.
    pub spread: f32,
    /// Enemies a projectile may hit before it is recycled.
    pub pierce: u32,
    /// Targeting / melee reach.
    pub range: f32,
    /// Radius of area effects and clouds.
    pub area_radius: f32,
    /// Orbit radius of rotating weapons.
    pub orbit_radius: f32,
    /// Angular speed of rotating weapons, radians per second.
    pub orbit_speed: f32,
    /// Distinct targets of a multi-target strike.
    pub target_count: u32,
    /// Upper bound of clouds dropped per fire event.
    pub cloud_count: u32,
    /// Radius around the caster in which clouds are dropped.
    pub spawn_radius: f32,
    /// Projectile, orbiter or cloud lifetime in seconds.
    pub duration: f32,
    /// Melee sweep angle in degrees.
    pub arc: f32,
    /// Projectile collider radius.
    pub size: f32,
    /// Seconds before an orbiter or cloud may hit the same enemy again.
    pub rehit_interval: f32,
}

impl WeaponLevel {
    /// Level row used when a weapon carries no stat table.
    pub const FALLBACK: Self = Self {
        damage: 100.0,
        attack_speed: 1.0,
        projectile_count: 1,
        projectile_speed: 400.0,
        spread: 10.0,
        pierce: 1,
        range: 500.0,
        area_radius: 60.0,
        orbit_radius: 80.0,
        orbit_speed: 3.0,
        target_count: 1,
        cloud_count: 1,
        spawn_radius: 200.0,
        duration: 2.0,
        arc: 90.0,
        size: 5.0,
        rehit_interval: 0.5,
    };
}

impl Default for WeaponLevel {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Static description of a weapon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponConfig {
    /// Display name.
    pub name: String,
    /// Attack archetype.
    pub attack: AttackKind,
    /// Targeting mode for auto-fire weapons.
    pub targeting: Targeting,
    /// Manual weapons fire toward the aim point while the attack action is held.
    pub manual: bool,
    /// Evolution grade; only equal grades combine.
    pub grade: u8,
    /// Per-level stats; its length is the max level.
    pub levels: Vec<WeaponLevel>,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            attack: AttackKind::Projectile,
            targeting: Targeting::Nearest,
            manual: false,
            grade: 1,
            levels: vec![WeaponLevel::FALLBACK],
        }
    }
}

impl WeaponConfig {
    /// Highest level the weapon can reach.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        u32::try_from(self.levels.len()).unwrap_or(u32::MAX).max(1)
    }
}

/// Two max-level weapons that combine into a third.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionRecipe {
    /// First input weapon id.
    pub base: String,
    /// Second input weapon id.
    pub partner: String,
    /// Resulting weapon id.
    pub result: String,
}

impl EvolutionRecipe {
    fn new(base: &str, partner: &str, result: &str) -> Self {
        Self {
            base: base.to_string(),
            partner: partner.to_string(),
            result: result.to_string(),
        }
    }

    /// Returns true if this recipe combines `a` and `b`, in either order.
    #[must_use]
    pub fn matches(&self, a: &str, b: &str) -> bool {
        (self.base == a && self.partner == b) || (self.base == b && self.partner == a)
    }
}

// =============================================================================
// GameConfig
// =============================================================================

/// Complete balance data for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Frame-driver constants.
    pub engine: EngineConfig,
    /// Player base stats.
    pub player: PlayerConfig,
    /// Damage-resolution constants.
    pub combat: CombatConfig,
    /// Spawn cadence and wave scaling.
    pub spawn: SpawnConfig,
    /// Pool bounds.
    pub pools: PoolsConfig,
    /// Pickup constants.
    pub drops: DropConfig,
    /// Enemy archetypes by id.
    pub enemies: BTreeMap<String, EnemyConfig>,
    /// Weapon catalogue by id.
    pub weapons: BTreeMap<String, WeaponConfig>,
    /// Evolution recipes.
    pub evolutions: Vec<EvolutionRecipe>,
    /// Weapons the player starts with.
    pub starting_weapons: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            player: PlayerConfig::default(),
            combat: CombatConfig::default(),
            spawn: SpawnConfig::default(),
            pools: PoolsConfig::default(),
            drops: DropConfig::default(),
            enemies: default_enemies(),
            weapons: default_weapons(),
            evolutions: vec![
                EvolutionRecipe::new("magic_bolt", "chain_spark", "arcane_storm"),
                EvolutionRecipe::new("orbit_blade", "frost_nova", "blade_tempest"),
            ],
            starting_weapons: vec![DEFAULT_WEAPON.to_string()],
        }
    }
}

impl GameConfig {
    /// Parses a JSON document. Omitted fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] when the result fails [`GameConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`GameConfig::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks the rules the frame loop relies on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first broken rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.enemies.contains_key(DEFAULT_ENEMY) {
            return Err(ConfigError::Invalid(format!(
                "enemy table must contain the `{DEFAULT_ENEMY}` archetype"
            )));
        }
        if !self.weapons.contains_key(DEFAULT_WEAPON) {
            return Err(ConfigError::Invalid(format!(
                "weapon table must contain `{DEFAULT_WEAPON}`"
            )));
        }
        for (id, weapon) in &self.weapons {
            if weapon.levels.is_empty() {
                return Err(ConfigError::Invalid(format!("weapon `{id}` has no levels")));
            }
            if weapon.levels.iter().any(|level| level.attack_speed <= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "weapon `{id}` has a non-positive attack speed"
                )));
            }
        }
        for recipe in &self.evolutions {
            for id in [&recipe.base, &recipe.partner, &recipe.result] {
                if !self.weapons.contains_key(id) {
                    return Err(ConfigError::Invalid(format!(
                        "evolution recipe references unknown weapon `{id}`"
                    )));
                }
            }
        }
        for (name, pool) in [
            ("enemy", self.pools.enemy),
            ("projectile", self.pools.projectile),
            ("drop", self.pools.drop),
        ] {
            if pool.initial > pool.max {
                return Err(ConfigError::Invalid(format!(
                    "{name} pool pre-warms {} instances but caps at {}",
                    pool.initial, pool.max
                )));
            }
        }
        if self.spawn.min_spawn_rate <= 0.0 {
            return Err(ConfigError::Invalid(
                "min_spawn_rate must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Enemy archetype `id`, falling back to [`DEFAULT_ENEMY`] on a miss.
    #[must_use]
    pub fn enemy(&self, id: &str) -> &EnemyConfig {
        if let Some(enemy) = self.enemies.get(id) {
            return enemy;
        }
        tracing::warn!(enemy = id, "unknown enemy archetype, using `{DEFAULT_ENEMY}`");
        match self.enemies.get(DEFAULT_ENEMY) {
            Some(enemy) => enemy,
            None => fallback_enemy(),
        }
    }

    /// Weapon `id` and the id actually resolved, falling back to
    /// [`DEFAULT_WEAPON`] on a miss.
    #[must_use]
    pub fn weapon<'a>(&'a self, id: &'a str) -> (&'a str, &'a WeaponConfig) {
        if let Some(weapon) = self.weapons.get(id) {
            return (id, weapon);
        }
        tracing::warn!(weapon = id, "unknown weapon, using `{DEFAULT_WEAPON}`");
        match self.weapons.get(DEFAULT_WEAPON) {
            Some(weapon) => (DEFAULT_WEAPON, weapon),
            None => (DEFAULT_WEAPON, fallback_weapon()),
        }
    }

    /// Evolution recipe combining `a` and `b`, if any.
    #[must_use]
    pub fn evolution(&self, a: &str, b: &str) -> Option<&EvolutionRecipe> {
        self.evolutions.iter().find(|recipe| recipe.matches(a, b))
    }
}

fn fallback_enemy() -> &'static EnemyConfig {
    static FALLBACK: OnceLock<EnemyConfig> = OnceLock::new();
    FALLBACK.get_or_init(EnemyConfig::default)
}

fn fallback_weapon() -> &'static WeaponConfig {
    static FALLBACK: OnceLock<WeaponConfig> = OnceLock::new();
    FALLBACK.get_or_init(WeaponConfig::default)
}

// =============================================================================
// Built-in tables
// =============================================================================

fn default_enemies() -> BTreeMap<String, EnemyConfig> {
    let mut enemies = BTreeMap::new();
    enemies.insert("normal".to_string(), EnemyConfig::default());
    enemies.insert(
        "fast".to_string(),
        EnemyConfig {
            unlock_wave: 2,
            weight: 6.0,
            health: 30.0,
            damage: 8.0,
            speed: 150.0,
            radius: 10.0,
            exp: 2.0,
            color: [230, 160, 40, 255],
            ..EnemyConfig::default()
        },
    );
    enemies.insert(
        "swarm".to_string(),
        EnemyConfig {
            unlock_wave: 3,
            weight: 8.0,
            health: 15.0,
            damage: 5.0,
            speed: 110.0,
            radius: 8.0,
            exp: 1.0,
            drop_rates: DropRates {
                experience: 0.6,
                gold: 0.05,
                health: 0.0,
            },
            color: [150, 200, 80, 255],
            ..EnemyConfig::default()
        },
    );
    enemies.insert(
        "tank".to_string(),
        EnemyConfig {
            unlock_wave: 4,
            weight: 3.0,
            health: 200.0,
            damage: 20.0,
            speed: 50.0,
            radius: 20.0,
            exp: 5.0,
            gold: 3.0,
            drop_rates: DropRates {
                experience: 1.0,
                gold: 0.3,
                health: 0.05,
            },
            color: [120, 90, 160, 255],
            ..EnemyConfig::default()
        },
    );
    enemies.insert(
        "elite".to_string(),
        EnemyConfig {
            unlock_wave: 6,
            weight: 1.0,
            health: 500.0,
            damage: 30.0,
            speed: 70.0,
            radius: 24.0,
            exp: 20.0,
            gold: 10.0,
            drop_rates: DropRates {
                experience: 1.0,
                gold: 1.0,
                health: 0.25,
            },
            behavior: AiBehavior::Charge,
            color: [240, 240, 90, 255],
            ..EnemyConfig::default()
        },
    );
    enemies
}

/// Builds `count` levels from a first row, applying `step` for each level.
fn levels(first: WeaponLevel, count: u32, step: impl Fn(&mut WeaponLevel, u32)) -> Vec<WeaponLevel> {
    (0..count)
        .map(|index| {
            let mut level = first;
            step(&mut level, index);
            level
        })
        .collect()
}

#[allow(clippy::too_many_lines)]
fn default_weapons() -> BTreeMap<String, WeaponConfig> {
    let base = WeaponLevel::FALLBACK;
    let mut weapons = BTreeMap::new();

    #[allow(clippy::cast_precision_loss)]
    let grow = |index: u32, per_level: f32| index as f32 * per_level;

    weapons.insert(
        "magic_bolt".to_string(),
        WeaponConfig {
            name: "Magic Bolt".to_string(),
            attack: AttackKind::Projectile,
            targeting: Targeting::Nearest,
            levels: levels(base, 5, |level, i| {
                level.damage += grow(i, 20.0);
                level.projectile_count = 1 + i / 2;
            }),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "scatter_shot".to_string(),
        WeaponConfig {
            name: "Scatter Shot".to_string(),
            attack: AttackKind::Projectile,
            targeting: Targeting::Random,
            levels: levels(
                WeaponLevel {
                    damage: 70.0,
                    attack_speed: 0.8,
                    projectile_count: 4,
                    projectile_speed: 350.0,
                    duration: 1.5,
                    ..base
                },
                5,
                |level, i| level.projectile_count += i,
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "orbit_blade".to_string(),
        WeaponConfig {
            name: "Orbit Blade".to_string(),
            attack: AttackKind::Projectile,
            targeting: Targeting::Rotating,
            levels: levels(
                WeaponLevel {
                    damage: 60.0,
                    attack_speed: 0.25,
                    projectile_count: 2,
                    orbit_radius: 80.0,
                    orbit_speed: 3.0,
                    duration: 3.0,
                    size: 8.0,
                    ..base
                },
                5,
                |level, i| {
                    level.projectile_count += i * 3 / 4;
                    level.damage += grow(i, 10.0);
                },
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "chain_spark".to_string(),
        WeaponConfig {
            name: "Chain Spark".to_string(),
            attack: AttackKind::DirectDamage,
            targeting: Targeting::MultiRandom,
            levels: levels(
                WeaponLevel {
                    damage: 80.0,
                    attack_speed: 0.7,
                    target_count: 2,
                    range: 400.0,
                    ..base
                },
                5,
                |level, i| level.target_count += i,
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "frost_nova".to_string(),
        WeaponConfig {
            name: "Frost Nova".to_string(),
            attack: AttackKind::AreaDamage,
            targeting: Targeting::Nearest,
            levels: levels(
                WeaponLevel {
                    damage: 90.0,
                    attack_speed: 0.5,
                    area_radius: 80.0,
                    range: 450.0,
                    ..base
                },
                5,
                |level, i| level.area_radius += grow(i, 15.0),
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "poison_cloud".to_string(),
        WeaponConfig {
            name: "Poison Cloud".to_string(),
            attack: AttackKind::AreaDamage,
            targeting: Targeting::Area,
            levels: levels(
                WeaponLevel {
                    damage: 30.0,
                    attack_speed: 0.33,
                    cloud_count: 2,
                    spawn_radius: 200.0,
                    area_radius: 50.0,
                    duration: 3.0,
                    ..base
                },
                5,
                |level, i| level.cloud_count += i * 3 / 4,
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "sword".to_string(),
        WeaponConfig {
            name: "Sword".to_string(),
            attack: AttackKind::MeleeSwing,
            targeting: Targeting::Nearest,
            manual: true,
            levels: levels(
                WeaponLevel {
                    damage: 150.0,
                    attack_speed: 1.5,
                    range: 90.0,
                    arc: 120.0,
                    ..base
                },
                5,
                |level, i| level.arc += grow(i, 10.0),
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "crossbow".to_string(),
        WeaponConfig {
            name: "Crossbow".to_string(),
            attack: AttackKind::Projectile,
            targeting: Targeting::Nearest,
            manual: true,
            levels: levels(
                WeaponLevel {
                    damage: 120.0,
                    attack_speed: 1.2,
                    spread: 12.0,
                    projectile_speed: 600.0,
                    pierce: 2,
                    ..base
                },
                5,
                |level, i| level.projectile_count = 1 + i / 2,
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "beam".to_string(),
        WeaponConfig {
            name: "Beam".to_string(),
            attack: AttackKind::Laser,
            targeting: Targeting::Nearest,
            manual: true,
            levels: levels(
                WeaponLevel {
                    damage: 60.0,
                    attack_speed: 2.0,
                    projectile_speed: 1200.0,
                    pierce: 999,
                    duration: 0.6,
                    size: 4.0,
                    ..base
                },
                5,
                |level, i| level.damage += grow(i, 10.0),
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "arcane_storm".to_string(),
        WeaponConfig {
            name: "Arcane Storm".to_string(),
            attack: AttackKind::DirectDamage,
            targeting: Targeting::MultiRandom,
            grade: 2,
            levels: levels(
                WeaponLevel {
                    damage: 150.0,
                    attack_speed: 1.0,
                    target_count: 8,
                    range: 500.0,
                    ..base
                },
                3,
                |level, i| level.target_count += i * 2,
            ),
            ..WeaponConfig::default()
        },
    );
    weapons.insert(
        "blade_tempest".to_string(),
        WeaponConfig {
            name: "Blade Tempest".to_string(),
            attack: AttackKind::Projectile,
            targeting: Targeting::Rotating,
            grade: 2,
            levels: levels(
                WeaponLevel {
                    damage: 110.0,
                    attack_speed: 0.25,
                    projectile_count: 6,
                    orbit_radius: 110.0,
                    orbit_speed: 4.0,
                    duration: 3.5,
                    size: 10.0,
                    ..base
                },
                3,
                |level, i| level.projectile_count += i,
            ),
            ..WeaponConfig::default()
        },
    );
    weapons
}
