//! Built-in systems, in the order the simulation runs them.
//!
//! 1. [`MovementSystem`]: player steering and rigidbody integration
//! 2. [`AiSystem`]: enemy chase and charge steering
//! 3. [`CollisionSystem`]: pairwise overlap tests, [`Collision`] events
//! 4. [`CombatSystem`]: damage, knockback, pickups from this frame's collisions
//! 5. [`WeaponSystem`]: cooldowns, targeting, projectile lifetimes
//! 6. [`ExperienceSystem`]: regeneration, pickup magnet, level-ups
//!
//! [`Collision`]: crate::event::GameEvent::Collision

mod ai;
mod collision;
mod combat;
mod experience;
mod movement;
mod weapon;

pub use ai::AiSystem;
pub use collision::{
    circle_rect_overlap, circles_overlap, rects_overlap, shapes_overlap, CollisionSystem,
};
pub use combat::{damage_enemy, CombatSystem};
pub use experience::ExperienceSystem;
pub use movement::{integrate, MovementSystem};
pub use weapon::{roll_damage, WeaponSystem};

use crate::system::System;

/// The built-in systems in run order.
#[must_use]
pub fn default_systems() -> Vec<Box<dyn System>> {
    vec![
        Box::new(MovementSystem::new()),
        Box::new(AiSystem::new()),
        Box::new(CollisionSystem::new()),
        Box::new(CombatSystem::new()),
        Box::new(WeaponSystem::new()),
        Box::new(ExperienceSystem::new()),
    ]
}
