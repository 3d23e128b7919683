//! Wave progression, enemy spawning, loot and recycling.
//!
//! The [`SpawnManager`] runs after the systems each frame. It reacts to the
//! frame's `EnemyKilled` and `ItemPickedUp` events (rolling loot and
//! recycling the entities), advances the wave clock, spawns enemies on a
//! ring around the player at the wave's interval, and recycles enemies that
//! drift past the despawn radius.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use swarmfall_core::config::GameConfig;
//! use swarmfall_core::spawn::SpawnManager;
//!
//! let config = GameConfig::default();
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! for _ in 0..100 {
//!     let id = SpawnManager::choose_enemy_type(&config, 1, &mut rng);
//!     assert_eq!(id, "normal");
//! }
//! ```

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use crate::config::{DropKind, DropRates, GameConfig, DEFAULT_ENEMY};
use crate::entity::components::Enemy;
use crate::entity::EntityId;
use crate::event::{EventBus, EventKind, GameEvent};
use crate::pools::{DropPool, DropSpawn, EnemyPool, EnemySpawn};
use crate::world::World;

// Drops of one kill are fanned out so they do not stack.
const DROP_SPREAD: f32 = 8.0;

const fn drop_offset(kind: DropKind) -> Vec2 {
    match kind {
        DropKind::Experience => Vec2::ZERO,
        DropKind::Gold => Vec2::new(DROP_SPREAD, 0.0),
        DropKind::Health => Vec2::new(-DROP_SPREAD, 0.0),
    }
}

#[derive(Debug, Clone, Copy)]
struct Loot {
    position: Vec2,
    exp: f32,
    gold: f32,
    rates: DropRates,
}

/// Owns the enemy and pickup pools and drives waves.
#[derive(Debug)]
pub struct SpawnManager {
    enemies: EnemyPool,
    drops: DropPool,
    tracked_enemies: Vec<EntityId>,
    tracked_drops: Vec<EntityId>,
    wave: u32,
    wave_timer: f32,
    spawn_timer: f32,
    kills: Vec<(EntityId, Vec2)>,
    collected: Vec<EntityId>,
}

impl SpawnManager {
    /// Builds and pre-warms the enemy and pickup pools. The run starts at
    /// wave 1.
    pub fn new(config: &GameConfig, world: &mut World) -> Self {
        Self {
            enemies: EnemyPool::new(config, world),
            drops: DropPool::new(&config.drops, config.pools.drop, world),
            tracked_enemies: Vec::new(),
            tracked_drops: Vec::new(),
            wave: 1,
            wave_timer: 0.0,
            spawn_timer: 0.0,
            kills: Vec::new(),
            collected: Vec::new(),
        }
    }

    /// Current wave number, starting at 1.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Seconds into the current wave.
    #[must_use]
    pub const fn wave_timer(&self) -> f32 {
        self.wave_timer
    }

    /// Enemies spawned by this manager and not yet recycled.
    #[must_use]
    pub fn tracked_enemies(&self) -> &[EntityId] {
        &self.tracked_enemies
    }

    /// Pickups spawned by this manager and not yet recycled.
    #[must_use]
    pub fn tracked_drops(&self) -> &[EntityId] {
        &self.tracked_drops
    }

    /// The enemy pools.
    #[must_use]
    pub const fn enemy_pool(&self) -> &EnemyPool {
        &self.enemies
    }

    /// The pickup pools.
    #[must_use]
    pub const fn drop_pool(&self) -> &DropPool {
        &self.drops
    }

    /// Weighted draw over the archetypes unlocked at `wave`.
    ///
    /// Falls back to the default archetype when nothing is unlocked or every
    /// unlocked weight is zero.
    pub fn choose_enemy_type<'c, R: Rng + ?Sized>(
        config: &'c GameConfig,
        wave: u32,
        rng: &mut R,
    ) -> &'c str {
        let unlocked = || {
            config
                .enemies
                .iter()
                .filter(move |(_, enemy)| enemy.unlock_wave <= wave && enemy.weight > 0.0)
        };
        let total: f32 = unlocked().map(|(_, enemy)| enemy.weight).sum();
        if total <= 0.0 {
            return DEFAULT_ENEMY;
        }
        let mut roll = rng.gen::<f32>() * total;
        let mut last: &str = DEFAULT_ENEMY;
        for (id, enemy) in unlocked() {
            if roll < enemy.weight {
                return id.as_str();
            }
            roll -= enemy.weight;
            last = id.as_str();
        }
        last
    }

    /// Spawns an `archetype` enemy at `position` with wave-scaled health.
    ///
    /// Returns `None` when the live-enemy cap is reached or the pool is
    /// exhausted.
    pub fn spawn_enemy(
        &mut self,
        world: &mut World,
        config: &GameConfig,
        archetype: &str,
        position: Vec2,
    ) -> Option<EntityId> {
        if self.tracked_enemies.len() >= config.spawn.max_enemies {
            tracing::debug!(cap = config.spawn.max_enemies, "enemy cap reached");
            return None;
        }
        let health = config
            .spawn
            .scaled_health(config.enemy(archetype).health, self.wave);
        let id = self
            .enemies
            .spawn(world, archetype, EnemySpawn { position, health })?;
        self.tracked_enemies.push(id);
        tracing::trace!(enemy = %id, archetype, health, "enemy spawned");
        Some(id)
    }

    /// Spawns a `kind` pickup worth `value` at `position`.
    pub fn spawn_drop(
        &mut self,
        world: &mut World,
        kind: DropKind,
        position: Vec2,
        value: f32,
    ) -> Option<EntityId> {
        let id = self.drops.spawn(world, kind, DropSpawn { position, value })?;
        self.tracked_drops.push(id);
        Some(id)
    }

    /// Recycles enemy `id`.
    pub fn despawn_enemy(&mut self, world: &mut World, id: EntityId) -> bool {
        let released = self.enemies.despawn(world, id);
        if released {
            self.tracked_enemies.retain(|tracked| *tracked != id);
        }
        released
    }

    /// Recycles pickup `id`.
    pub fn despawn_drop(&mut self, world: &mut World, id: EntityId) -> bool {
        let released = self.drops.despawn(world, id);
        if released {
            self.tracked_drops.retain(|tracked| *tracked != id);
        }
        released
    }

    /// Recycles everything and restarts at wave 1.
    pub fn reset(&mut self, world: &mut World) {
        self.enemies.despawn_all(world);
        self.drops.despawn_all(world);
        self.tracked_enemies.clear();
        self.tracked_drops.clear();
        self.wave = 1;
        self.wave_timer = 0.0;
        self.spawn_timer = 0.0;
    }

    /// Runs one frame of wave logic after the systems.
    pub fn update(
        &mut self,
        dt: f32,
        world: &mut World,
        events: &mut EventBus,
        rng: &mut impl Rng,
        config: &GameConfig,
        player: Option<EntityId>,
    ) {
        self.handle_kills(world, events, rng, config);
        self.handle_pickups(world, events);
        self.advance_wave(dt, events, config);

        let center = player
            .filter(|id| world.is_live(*id))
            .and_then(|id| world.position(id));
        if let Some(center) = center {
            self.spawn_on_timer(dt, world, rng, config, center);
            self.despawn_far(world, config, center);
        }

        self.tracked_enemies.retain(|id| world.is_live(*id));
        self.tracked_drops.retain(|id| world.is_live(*id));
    }

    fn handle_kills(
        &mut self,
        world: &mut World,
        events: &EventBus,
        rng: &mut impl Rng,
        config: &GameConfig,
    ) {
        self.kills.clear();
        self.kills
            .extend(events.events_of(EventKind::EnemyKilled).filter_map(|event| match *event {
                GameEvent::EnemyKilled { enemy, position } => Some((enemy, position)),
                _ => None,
            }));

        for index in 0..self.kills.len() {
            let (enemy, position) = self.kills[index];
            let loot = world.component::<Enemy>(enemy).map(|data| Loot {
                position,
                exp: data.exp,
                gold: data.gold,
                rates: data.drop_rates,
            });
            if let Some(loot) = loot {
                self.roll_loot(world, rng, config, loot);
            }
            self.despawn_enemy(world, enemy);
        }
    }

    fn roll_loot(&mut self, world: &mut World, rng: &mut impl Rng, config: &GameConfig, loot: Loot) {
        for kind in DropKind::ALL {
            let rate = loot.rates.rate(kind);
            if rate <= 0.0 || rng.gen::<f32>() >= rate {
                continue;
            }
            let value = match kind {
                DropKind::Experience => loot.exp,
                DropKind::Gold => loot.gold,
                DropKind::Health => config.combat.health_drop_heal,
            };
            self.spawn_drop(world, kind, loot.position + drop_offset(kind), value);
        }
    }

    fn handle_pickups(&mut self, world: &mut World, events: &EventBus) {
        self.collected.clear();
        self.collected
            .extend(events.events_of(EventKind::ItemPickedUp).filter_map(|event| match *event {
                GameEvent::ItemPickedUp { item, .. } => Some(item),
                _ => None,
            }));
        for index in 0..self.collected.len() {
            let item = self.collected[index];
            self.despawn_drop(world, item);
        }
    }

    fn advance_wave(&mut self, dt: f32, events: &mut EventBus, config: &GameConfig) {
        let duration = config.spawn.wave_duration;
        if duration <= 0.0 {
            return;
        }
        self.wave_timer += dt;
        while self.wave_timer >= duration {
            self.wave_timer -= duration;
            self.wave += 1;
            tracing::info!(wave = self.wave, "wave changed");
            events.emit(GameEvent::WaveChanged { wave: self.wave });
        }
    }

    fn spawn_on_timer(
        &mut self,
        dt: f32,
        world: &mut World,
        rng: &mut impl Rng,
        config: &GameConfig,
        center: Vec2,
    ) {
        self.spawn_timer += dt;
        if self.spawn_timer < config.spawn.spawn_rate(self.wave) {
            return;
        }
        self.spawn_timer = 0.0;
        let archetype = Self::choose_enemy_type(config, self.wave, rng);
        let angle = rng.gen_range(0.0..TAU);
        let position = center + Vec2::from_angle(angle) * config.spawn.spawn_radius;
        self.spawn_enemy(world, config, archetype, position);
    }

    fn despawn_far(&mut self, world: &mut World, config: &GameConfig, center: Vec2) {
        let limit = config.spawn.despawn_radius * config.spawn.despawn_radius;
        let mut index = 0;
        while index < self.tracked_enemies.len() {
            let id = self.tracked_enemies[index];
            let far = world
                .position(id)
                .is_some_and(|position| position.distance_squared(center) > limit);
            if far && self.enemies.despawn(world, id) {
                tracing::trace!(enemy = %id, "enemy despawned out of range");
                self.tracked_enemies.swap_remove(index);
            } else {
                index += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::{Health, Transform};
    use crate::entity::EntityTag;
    use crate::tests::helpers::rng;

    fn manager(world: &mut World) -> (SpawnManager, GameConfig) {
        let config = GameConfig::default();
        (SpawnManager::new(&config, world), config)
    }

    mod choose_tests {
        use super::*;

        #[test]
        fn locked_types_are_never_drawn() {
            let config = GameConfig::default();
            let mut rng = rng(3);
            for _ in 0..2_000 {
                let id = SpawnManager::choose_enemy_type(&config, 3, &mut rng);
                assert!(config.enemies[id].unlock_wave <= 3, "drew locked `{id}`");
            }
        }

        #[test]
        fn every_unlocked_type_is_drawn_eventually() {
            let config = GameConfig::default();
            let mut rng = rng(5);
            let mut seen = std::collections::BTreeSet::new();
            for _ in 0..5_000 {
                seen.insert(SpawnManager::choose_enemy_type(&config, 10, &mut rng));
            }
            assert_eq!(seen.len(), config.enemies.len());
        }

        #[test]
        fn zero_weights_fall_back_to_default() {
            let mut config = GameConfig::default();
            for enemy in config.enemies.values_mut() {
                enemy.weight = 0.0;
            }
            let id = SpawnManager::choose_enemy_type(&config, 10, &mut rng(1));
            assert_eq!(id, DEFAULT_ENEMY);
        }
    }

    mod wave_tests {
        use super::*;

        #[test]
        fn wave_changes_once_per_boundary() {
            let mut world = World::new();
            let (mut spawner, config) = manager(&mut world);
            let mut events = EventBus::new();
            let mut rng = rng(1);

            for _ in 0..310 {
                events.begin_frame();
                spawner.update(0.1, &mut world, &mut events, &mut rng, &config, None);
            }
            // 31 seconds with 30-second waves.
            assert_eq!(spawner.wave(), 2);
        }

        #[test]
        fn long_frame_crosses_several_waves() {
            let mut world = World::new();
            let (mut spawner, config) = manager(&mut world);
            let mut events = EventBus::new();
            spawner.update(95.0, &mut world, &mut events, &mut rng(1), &config, None);
            assert_eq!(spawner.wave(), 4);
            assert_eq!(events.events_of(EventKind::WaveChanged).count(), 3);
        }
    }

    mod spawning_tests {
        use super::*;

        #[test]
        fn spawn_rate_interval_spawns_on_ring() {
            let mut world = World::new();
            let (mut spawner, config) = manager(&mut world);
            let player = world
                .spawn(EntityTag::Player, "Player")
                .with(Transform::default())
                .id();
            let mut events = EventBus::new();
            let mut rng = rng(2);

            spawner.update(1.9, &mut world, &mut events, &mut rng, &config, Some(player));
            assert!(spawner.tracked_enemies().is_empty());
            spawner.update(0.2, &mut world, &mut events, &mut rng, &config, Some(player));
            assert_eq!(spawner.tracked_enemies().len(), 1);

            let enemy = spawner.tracked_enemies()[0];
            let distance = world.position(enemy).unwrap().length();
            assert!((distance - config.spawn.spawn_radius).abs() < 1e-2);
        }

        #[test]
        fn cap_rejects_spawns() {
            let mut world = World::new();
            let (mut spawner, mut config) = manager(&mut world);
            config.spawn.max_enemies = 2;
            for _ in 0..2 {
                assert!(spawner
                    .spawn_enemy(&mut world, &config, "normal", Vec2::ZERO)
                    .is_some());
            }
            assert!(spawner
                .spawn_enemy(&mut world, &config, "normal", Vec2::ZERO)
                .is_none());
        }

        #[test]
        fn health_scales_with_wave() {
            let mut world = World::new();
            let (mut spawner, config) = manager(&mut world);
            let mut events = EventBus::new();
            spawner.update(120.0, &mut world, &mut events, &mut rng(1), &config, None);
            assert_eq!(spawner.wave(), 5);

            let id = spawner
                .spawn_enemy(&mut world, &config, "normal", Vec2::ZERO)
                .unwrap();
            assert_eq!(world.component::<Health>(id).unwrap().max(), 73.0);
        }

        #[test]
        fn far_enemies_are_recycled() {
            let mut world = World::new();
            let (mut spawner, config) = manager(&mut world);
            let player = world
                .spawn(EntityTag::Player, "Player")
                .with(Transform::default())
                .id();
            let far = spawner
                .spawn_enemy(&mut world, &config, "normal", Vec2::new(5_000.0, 0.0))
                .unwrap();
            let near = spawner
                .spawn_enemy(&mut world, &config, "normal", Vec2::new(100.0, 0.0))
                .unwrap();

            let mut events = EventBus::new();
            spawner.update(0.01, &mut world, &mut events, &mut rng(1), &config, Some(player));
            assert!(!world.is_live(far));
            assert!(world.is_live(near));
            assert_eq!(spawner.tracked_enemies(), &[near]);
        }
    }

    mod loot_tests {
        use super::*;

        #[test]
        fn kill_recycles_enemy_and_drops_experience() {
            let mut world = World::new();
            let (mut spawner, config) = manager(&mut world);
            let enemy = spawner
                .spawn_enemy(&mut world, &config, "normal", Vec2::new(40.0, 0.0))
                .unwrap();
            world.component_mut::<Health>(enemy).unwrap().take_damage(1_000.0);

            let mut events = EventBus::new();
            events.emit(GameEvent::EnemyKilled {
                enemy,
                position: Vec2::new(40.0, 0.0),
            });
            spawner.update(0.01, &mut world, &mut events, &mut rng(9), &config, None);

            assert!(!world.is_live(enemy));
            assert!(spawner.tracked_enemies().is_empty());
            // Experience always drops for the default archetype.
            assert_eq!(spawner.drop_pool().active_count_of(DropKind::Experience), 1);
            let gem = spawner
                .tracked_drops()
                .iter()
                .copied()
                .find(|id| world.get(*id).is_some_and(|e| e.label() == "Pickup_experience"))
                .unwrap();
            assert_eq!(world.position(gem), Some(Vec2::new(40.0, 0.0)));
        }

        #[test]
        fn picked_up_items_are_recycled() {
            let mut world = World::new();
            let (mut spawner, config) = manager(&mut world);
            let item = spawner
                .spawn_drop(&mut world, DropKind::Gold, Vec2::ZERO, 1.0)
                .unwrap();
            let mut events = EventBus::new();
            events.emit(GameEvent::ItemPickedUp {
                player: EntityId::new(1),
                item,
                kind: DropKind::Gold,
                value: 1.0,
            });
            spawner.update(0.01, &mut world, &mut events, &mut rng(1), &config, None);
            assert!(!world.is_live(item));
            assert!(spawner.tracked_drops().is_empty());
        }
    }
}
