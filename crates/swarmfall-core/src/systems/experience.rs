//! Player progression upkeep: regeneration, pickup magnet and level-ups.

use crate::entity::components::{Health, Pickup, Stats, Transform};
use crate::entity::{ComponentKind, EntityId, EntityTag};
use crate::event::GameEvent;
use crate::system::{Membership, SimContext, System};

/// Heals by `hp_regen` per second, pulls uncollected pickups inside the
/// magnet range toward the player, and turns banked experience into levels.
///
/// A single large gain can raise several levels in one frame; one
/// `PlayerLeveledUp` event is published per level.
#[derive(Debug)]
pub struct ExperienceSystem {
    membership: Membership,
}

impl ExperienceSystem {
    /// An experience system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            membership: Membership::new(&[ComponentKind::Stats, ComponentKind::Transform])
                .with_tag(EntityTag::Player),
        }
    }
}

impl Default for ExperienceSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for ExperienceSystem {
    fn name(&self) -> &'static str {
        "experience"
    }

    fn membership(&self) -> &Membership {
        &self.membership
    }

    fn membership_mut(&mut self) -> &mut Membership {
        &mut self.membership
    }

    fn process(&mut self, id: EntityId, dt: f32, ctx: &mut SimContext<'_>) {
        let Some(entity) = ctx.world.get_mut(id) else {
            return;
        };
        let (Some(stats), Some(origin)) = (
            entity.get::<Stats>().copied(),
            entity.get::<Transform>().map(|t| t.position),
        ) else {
            return;
        };
        if stats.hp_regen > 0.0 {
            if let Some(health) = entity.get_mut::<Health>() {
                if !health.is_dead() {
                    health.heal(stats.hp_regen * dt);
                }
            }
        }

        let step = ctx.config.drops.magnet_speed * dt;
        let reach = stats.magnet_range * stats.magnet_range;
        for pickup in ctx.world.iter_mut() {
            if !pickup.is_live() || pickup.tag() != EntityTag::Pickup {
                continue;
            }
            if pickup.get::<Pickup>().map_or(true, |p| p.collected) {
                continue;
            }
            let Some(transform) = pickup.get_mut::<Transform>() else {
                continue;
            };
            let offset = origin - transform.position;
            let distance_squared = offset.length_squared();
            if distance_squared > reach || distance_squared == 0.0 {
                continue;
            }
            let distance = distance_squared.sqrt();
            transform.position += offset / distance * step.min(distance);
        }

        let Some(stats) = ctx.world.component_mut::<Stats>(id) else {
            return;
        };
        while let Some(level) = stats.take_level_up() {
            tracing::info!(player = %id, level, "level up");
            ctx.events.emit(GameEvent::PlayerLeveledUp { player: id, level });
        }
    }
}
