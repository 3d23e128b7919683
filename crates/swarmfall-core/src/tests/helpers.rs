//! Test helper functions for setting up worlds and entities.
//!
//! [`TestRig`] owns everything a [`SimContext`] borrows, so a test can spawn
//! a scene, run one system against it, and then inspect the world and the
//! frame's events.

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{DropKind, GameConfig};
use crate::entity::EntityId;
use crate::event::EventBus;
use crate::input::InputSnapshot;
use crate::pools::{ProjectilePool, ProjectileSpawn};
use crate::simulation::{spawn_player, Simulation};
use crate::spawn::SpawnManager;
use crate::system::SimContext;
use crate::world::World;

/// Seeded rng for tests.
pub fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

// =============================================================================
// Test Rig
// =============================================================================

/// A world with the built-in config, pre-warmed pools and an armed player at
/// the origin.
pub struct TestRig {
    pub world: World,
    pub events: EventBus,
    pub projectiles: ProjectilePool,
    pub spawner: SpawnManager,
    pub rng: ChaCha8Rng,
    pub input: InputSnapshot,
    pub config: GameConfig,
    player: EntityId,
}

impl TestRig {
    /// Builds the rig with seed 1.
    pub fn new() -> Self {
        let config = GameConfig::default();
        let mut world = World::new();
        let projectiles = ProjectilePool::new(config.pools.projectile, &mut world);
        let spawner = SpawnManager::new(&config, &mut world);
        let player = spawn_player(&mut world, &config, Vec2::ZERO);
        Self {
            world,
            events: EventBus::new(),
            projectiles,
            spawner,
            rng: rng(1),
            input: InputSnapshot::new(),
            config,
            player,
        }
    }

    /// The player entity.
    pub fn player(&self) -> EntityId {
        self.player
    }

    /// Spawns an `archetype` enemy at `position` with wave-1 health.
    ///
    /// # Panics
    ///
    /// Panics if the enemy pool is exhausted.
    pub fn enemy_at(&mut self, archetype: &str, position: Vec2) -> EntityId {
        self.spawner
            .spawn_enemy(&mut self.world, &self.config, archetype, position)
            .expect("enemy pool exhausted")
    }

    /// Spawns an unowned linear projectile that lives for ten seconds.
    ///
    /// # Arguments
    ///
    /// * `position` - Spawn position
    /// * `damage` - Damage per hit
    /// * `pierce` - Number of distinct enemies it may hit
    ///
    /// # Panics
    ///
    /// Panics if the projectile pool is exhausted.
    pub fn projectile_at(&mut self, position: Vec2, damage: f32, pierce: u32) -> EntityId {
        self.projectiles
            .spawn(
                &mut self.world,
                ProjectileSpawn {
                    position,
                    damage,
                    pierce,
                    lifetime: 10.0,
                    ..ProjectileSpawn::default()
                },
            )
            .expect("projectile pool exhausted")
    }

    /// Spawns a `kind` pickup worth `value` at `position`.
    ///
    /// # Panics
    ///
    /// Panics if the pickup pool is exhausted.
    pub fn drop_at(&mut self, kind: DropKind, position: Vec2, value: f32) -> EntityId {
        self.spawner
            .spawn_drop(&mut self.world, kind, position, value)
            .expect("drop pool exhausted")
    }

    /// Lends the rig out as a frame context at the spawner's wave.
    pub fn context(&mut self) -> SimContext<'_> {
        SimContext {
            world: &mut self.world,
            events: &mut self.events,
            projectiles: &mut self.projectiles,
            rng: &mut self.rng,
            input: &self.input,
            config: &self.config,
            wave: self.spawner.wave(),
            player: Some(self.player),
        }
    }
}

// =============================================================================
// Simulation Helpers
// =============================================================================

/// Runs `frames` frames of `dt` seconds against `input`.
///
/// # Arguments
///
/// * `sim` - The simulation to advance
/// * `frames` - Number of frames
/// * `dt` - Raw delta per frame
/// * `input` - Input held for every frame
pub fn run_frames(sim: &mut Simulation, frames: usize, dt: f32, input: &InputSnapshot) {
    for _ in 0..frames {
        sim.update(dt, input);
    }
}

/// Returns the position of an entity, or `None` if it does not exist.
pub fn position_of(sim: &Simulation, id: EntityId) -> Option<Vec2> {
    sim.world().position(id)
}

/// Captures a comparable fingerprint of the world: every live entity's id,
/// position and health, in id order.
///
/// # Returns
///
/// One `(id, position, health)` tuple per live entity with a transform.
pub fn world_fingerprint(sim: &Simulation) -> Vec<(EntityId, Vec2, Option<f32>)> {
    use crate::entity::components::{Health, Transform};

    sim.world()
        .live()
        .filter_map(|entity| {
            let position = entity.get::<Transform>()?.position;
            let health = entity.get::<Health>().map(Health::current);
            Some((entity.id(), position, health))
        })
        .collect()
}
