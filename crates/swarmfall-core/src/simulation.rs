//! The frame loop.
//!
//! [`Simulation`] owns the world, the event bus, the pools, the spawn
//! manager, the seeded rng and the ordered system list, and advances them by
//! one variable-length frame per [`Simulation::update`] call:
//!
//! 1. **CLOCK**: clamp the raw delta to `[0, max_delta]`, then apply the
//!    time scale; a zero delta (pause) skips the frame
//! 2. **SYSTEMS**: run each system in order: movement, AI, collision, combat,
//!    weapons, experience, then any host-added systems
//! 3. **SPAWN**: loot, recycling, wave clock and enemy spawns
//! 4. **FLUSH**: deliver deferred events, purge destroyed entities
//!
//! A `PlayerDied` event during the frame ends the run: later updates are
//! no-ops until [`Simulation::reset`].
//!
//! # Determinism
//!
//! Given the same config, seed and input sequence the simulation produces
//! identical results:
//! - Entities are stored in a `BTreeMap` and always visited in id order
//! - Every random draw comes from one `ChaCha8Rng`, seeded at construction
//! - Pools hand out slots in a fixed order
//!
//! # Example
//!
//! ```
//! use swarmfall_core::input::InputSnapshot;
//! use swarmfall_core::simulation::{GameState, Simulation};
//!
//! let mut sim = Simulation::with_seed(42);
//! let input = InputSnapshot::default();
//! for _ in 0..60 {
//!     sim.update(1.0 / 60.0, &input);
//! }
//! assert_eq!(sim.state(), GameState::Running);
//! assert_eq!(sim.time().frame(), 60);
//! ```

use std::fmt;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{ConfigError, DropKind, GameConfig};
use crate::entity::components::{
    Collider, CollisionLayers, Health, RenderShape, Renderer, Rigidbody, Stats, Transform,
};
use crate::entity::{EntityId, EntityTag, WeaponSlot};
use crate::event::{EventBus, EventKind};
use crate::input::InputState;
use crate::pools::{ProjectilePool, ProjectileSpawn};
use crate::render::{collect_draw_commands, DrawCommand, DrawContext};
use crate::spawn::SpawnManager;
use crate::system::{run_system, SimContext, System};
use crate::systems::default_systems;
use crate::world::World;

const PLAYER_LAYER: i32 = 3;
const PLAYER_COLOR: [u8; 4] = [90, 200, 255, 255];

// =============================================================================
// Game clock
// =============================================================================

/// Frame clock with delta clamping and a time scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameTime {
    max_delta: f32,
    time_scale: f32,
    elapsed: f64,
    frame: u64,
    last_delta: f32,
}

impl GameTime {
    /// A clock that clamps raw deltas to `max_delta`.
    #[must_use]
    pub const fn new(max_delta: f32) -> Self {
        Self {
            max_delta,
            time_scale: 1.0,
            elapsed: 0.0,
            frame: 0,
            last_delta: 0.0,
        }
    }

    /// Clamps `raw` to `[0, max_delta]` (non-finite deltas become zero),
    /// applies the time scale, and counts the frame if time moved.
    ///
    /// Returns the simulated delta.
    pub fn advance(&mut self, raw: f32) -> f32 {
        let clamped = if raw.is_finite() {
            raw.clamp(0.0, self.max_delta.max(0.0))
        } else {
            0.0
        };
        let dt = clamped * self.time_scale;
        self.last_delta = dt;
        if dt > 0.0 {
            self.elapsed += f64::from(dt);
            self.frame += 1;
        }
        dt
    }

    /// Sets the time scale; `0` pauses. Negative values are treated as `0`.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 0.0 };
    }

    /// Current time scale.
    #[must_use]
    pub const fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Upper bound on a raw delta.
    #[must_use]
    pub const fn max_delta(&self) -> f32 {
        self.max_delta
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Simulated frames so far.
    #[must_use]
    pub const fn frame(&self) -> u64 {
        self.frame
    }

    /// Delta of the last frame.
    #[must_use]
    pub const fn last_delta(&self) -> f32 {
        self.last_delta
    }
}

/// Whether the run is still going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    /// Frames advance.
    Running,
    /// The player died; frames are no-ops until reset.
    GameOver,
}

/// Spawns the player at `position`: full health, base stats, and the
/// configured starting weapons. Weapons the slot rejects are logged and
/// skipped.
pub(crate) fn spawn_player(world: &mut World, config: &GameConfig, position: Vec2) -> EntityId {
    let player = &config.player;
    let mut slot = WeaponSlot::new();
    for weapon in &config.starting_weapons {
        if let Err(error) = slot.add_weapon(weapon, config) {
            tracing::warn!(weapon = %weapon, %error, "starting weapon rejected");
        }
    }
    world
        .spawn(EntityTag::Player, "Player")
        .with(Transform::at(position))
        .with(Rigidbody::with_max_speed(player.move_speed))
        .with(Health::new(player.max_health))
        .with(Renderer::new(
            RenderShape::Circle,
            PLAYER_COLOR,
            player.radius * 2.0,
            PLAYER_LAYER,
        ))
        .with(Collider::circle(
            player.radius,
            CollisionLayers::PLAYER,
            CollisionLayers::ENEMY | CollisionLayers::PICKUP,
        ))
        .with(Stats::from_config(player))
        .with(slot)
        .id()
}

// =============================================================================
// Simulation
// =============================================================================

/// A wave-survival run.
pub struct Simulation {
    config: GameConfig,
    seed: u64,
    world: World,
    events: EventBus,
    projectiles: ProjectilePool,
    spawner: SpawnManager,
    systems: Vec<Box<dyn System>>,
    rng: ChaCha8Rng,
    time: GameTime,
    state: GameState,
    player: Option<EntityId>,
    draw_buffer: Vec<DrawCommand>,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("seed", &self.seed)
            .field("world", &self.world)
            .field("systems", &format!("[{} systems]", self.systems.len()))
            .field("time", &self.time)
            .field("state", &self.state)
            .field("player", &self.player)
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Builds a run from `config` and `seed`.
    ///
    /// # Arguments
    ///
    /// * `config` - Game tables; validated before use
    /// * `seed` - Seed of the simulation rng
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `config` fails validation.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config, seed))
    }

    /// Builds a run with the built-in tables.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::build(GameConfig::default(), seed)
    }

    fn build(config: GameConfig, seed: u64) -> Self {
        let mut world = World::new();
        let projectiles = ProjectilePool::new(config.pools.projectile, &mut world);
        let spawner = SpawnManager::new(&config, &mut world);
        let mut sim = Self {
            time: GameTime::new(config.engine.max_delta),
            config,
            seed,
            world,
            events: EventBus::new(),
            projectiles,
            spawner,
            systems: default_systems(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            state: GameState::Running,
            player: None,
            draw_buffer: Vec::new(),
        };
        sim.player = Some(spawn_player(&mut sim.world, &sim.config, Vec2::ZERO));
        tracing::info!(seed, "simulation created");
        sim
    }

    /// Advances the run by one frame of `raw_delta` seconds.
    ///
    /// Does nothing after game over or while paused.
    pub fn update(&mut self, raw_delta: f32, input: &dyn InputState) {
        if self.state == GameState::GameOver {
            return;
        }
        let dt = self.time.advance(raw_delta);
        if dt <= 0.0 {
            return;
        }
        let _span = tracing::trace_span!("frame", frame = self.time.frame()).entered();

        self.events.begin_frame();
        {
            let mut ctx = SimContext {
                world: &mut self.world,
                events: &mut self.events,
                projectiles: &mut self.projectiles,
                rng: &mut self.rng,
                input,
                config: &self.config,
                wave: self.spawner.wave(),
                player: self.player,
            };
            for system in &mut self.systems {
                run_system(system.as_mut(), dt, &mut ctx);
            }
        }
        self.spawner.update(
            dt,
            &mut self.world,
            &mut self.events,
            &mut self.rng,
            &self.config,
            self.player,
        );
        self.events.flush();
        self.world.maintain();

        if self.events.events_of(EventKind::PlayerDied).next().is_some() {
            self.state = GameState::GameOver;
            tracing::info!(
                frame = self.time.frame(),
                wave = self.spawner.wave(),
                "game over"
            );
        }
    }

    /// Hands this frame's draw commands to `draw`, lowest layer first.
    /// Returns how many were drawn.
    pub fn render(&mut self, draw: &mut dyn DrawContext) -> usize {
        collect_draw_commands(&self.world, &mut self.draw_buffer);
        for command in &self.draw_buffer {
            draw.draw(command);
        }
        self.draw_buffer.len()
    }

    /// Restarts the run with the same config and seed. Host-added systems and
    /// event listeners are kept.
    pub fn reset(&mut self) {
        self.world.clear();
        self.events.clear();
        self.projectiles = ProjectilePool::new(self.config.pools.projectile, &mut self.world);
        self.spawner = SpawnManager::new(&self.config, &mut self.world);
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.time = GameTime::new(self.config.engine.max_delta);
        self.state = GameState::Running;
        self.player = Some(spawn_player(&mut self.world, &self.config, Vec2::ZERO));
        tracing::info!(seed = self.seed, "simulation reset");
    }

    /// Appends a system after the built-in ones.
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    /// Number of systems run each frame.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Spawns an `archetype` enemy at `position`, subject to the enemy cap.
    pub fn spawn_enemy(&mut self, archetype: &str, position: Vec2) -> Option<EntityId> {
        self.spawner
            .spawn_enemy(&mut self.world, &self.config, archetype, position)
    }

    /// Spawns a `kind` pickup worth `value` at `position`.
    pub fn spawn_drop(&mut self, kind: DropKind, position: Vec2, value: f32) -> Option<EntityId> {
        self.spawner
            .spawn_drop(&mut self.world, kind, position, value)
    }

    /// Spawns a projectile.
    pub fn spawn_projectile(&mut self, spawn: ProjectileSpawn) -> Option<EntityId> {
        self.projectiles.spawn(&mut self.world, spawn)
    }

    /// The entity store.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The entity store, for setup.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The event bus.
    #[must_use]
    pub const fn events(&self) -> &EventBus {
        &self.events
    }

    /// The event bus, for subscribing.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// The game tables.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The player entity.
    #[must_use]
    pub const fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// Run state.
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// The frame clock.
    #[must_use]
    pub const fn time(&self) -> &GameTime {
        &self.time
    }

    /// The frame clock, for pausing and time scaling.
    pub fn time_mut(&mut self) -> &mut GameTime {
        &mut self.time
    }

    /// Current wave number.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.spawner.wave()
    }

    /// The spawn manager.
    #[must_use]
    pub const fn spawner(&self) -> &SpawnManager {
        &self.spawner
    }

    /// The projectile pool.
    #[must_use]
    pub const fn projectiles(&self) -> &ProjectilePool {
        &self.projectiles
    }

    /// Seed of the simulation rng.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }
}
