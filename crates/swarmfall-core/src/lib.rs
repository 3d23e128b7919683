//! # Swarmfall Core
//!
//! Simulation core for Swarmfall, a top-down wave-survival arena: the player
//! moves through an open field, weapons fire automatically at encroaching
//! enemies, defeated enemies drop pickups, and waves escalate over time.
//!
//! The crate is a headless engine. Input arrives through
//! [`input::InputState`], drawing leaves through [`render::DrawContext`];
//! everything in between is deterministic for a given seed.
//!
//! ## Architecture
//!
//! - **Entities** ([`entity`], [`world`]): ids, tags and typed components
//! - **Systems** ([`system`], [`systems`]): per-frame logic over filtered
//!   entity sets, run in a fixed order
//! - **Events** ([`event`]): typed publish/subscribe decoupling systems,
//!   the spawn manager and the host
//! - **Pools** ([`pool`], [`pools`]): recycled enemies, projectiles and
//!   pickups
//! - **Waves** ([`spawn`]): spawning, loot and escalation
//! - **Frame loop** ([`simulation`]): ties the above together
//!
//! ## Usage
//!
//! ```
//! use swarmfall_core::input::{Action, InputSnapshot};
//! use swarmfall_core::Simulation;
//!
//! let mut sim = Simulation::with_seed(7);
//! let mut input = InputSnapshot::new();
//! input.press(Action::MoveRight);
//!
//! for _ in 0..30 {
//!     sim.update(1.0 / 30.0, &input);
//! }
//! let player = sim.player().unwrap();
//! assert!(sim.world().position(player).unwrap().x > 0.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod entity;
pub mod event;
pub mod input;
pub mod pool;
pub mod pools;
pub mod render;
pub mod simulation;
pub mod spawn;
pub mod system;
pub mod systems;
pub mod world;

pub use config::{ConfigError, GameConfig};
pub use entity::{Entity, EntityId, EntityTag};
pub use event::{EventBus, EventKind, GameEvent};
pub use simulation::{GameState, GameTime, Simulation};
pub use world::World;

#[cfg(test)]
mod tests;
