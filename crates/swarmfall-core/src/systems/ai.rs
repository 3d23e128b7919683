//! Enemy steering.

use glam::Vec2;

use crate::config::AiBehavior;
use crate::entity::components::{Ai, Rigidbody, Transform};
use crate::entity::{ComponentKind, EntityId, EntityTag};
use crate::system::{Membership, SimContext, System};

/// Steers enemies toward the player.
///
/// Chasers move at their cruise speed. Chargers cruise, then dash at a
/// multiple of it for a short window on a fixed interval. Knockback suspends
/// steering while the enemy's stagger timer runs.
#[derive(Debug)]
pub struct AiSystem {
    membership: Membership,
}

impl AiSystem {
    /// An AI system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            membership: Membership::new(&[
                ComponentKind::Transform,
                ComponentKind::Rigidbody,
                ComponentKind::Ai,
            ])
            .with_tag(EntityTag::Enemy),
        }
    }
}

impl Default for AiSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Advances the charge timers of `ai` and returns this frame's speed.
fn steer_speed(ai: &mut Ai, dt: f32) -> f32 {
    match ai.behavior {
        AiBehavior::Chase => ai.speed,
        AiBehavior::Charge => {
            if ai.charge_remaining > 0.0 {
                ai.charge_remaining -= dt;
                if ai.charge_remaining <= 0.0 {
                    ai.charge_remaining = 0.0;
                    ai.charge_cooldown = ai.charge_interval;
                }
                return ai.speed * ai.charge_multiplier;
            }
            ai.charge_cooldown -= dt;
            if ai.charge_cooldown <= 0.0 {
                ai.charge_remaining = ai.charge_duration;
                ai.speed * ai.charge_multiplier
            } else {
                ai.speed
            }
        }
    }
}

impl System for AiSystem {
    fn name(&self) -> &'static str {
        "ai"
    }

    fn membership(&self) -> &Membership {
        &self.membership
    }

    fn membership_mut(&mut self) -> &mut Membership {
        &mut self.membership
    }

    fn process(&mut self, id: EntityId, dt: f32, ctx: &mut SimContext<'_>) {
        let target = ctx
            .player
            .filter(|player| ctx.world.is_live(*player))
            .and_then(|player| ctx.world.position(player));
        let Some(entity) = ctx.world.get_mut(id) else {
            return;
        };
        let Some(position) = entity.get::<Transform>().map(|t| t.position) else {
            return;
        };
        let Some(ai) = entity.get_mut::<Ai>() else {
            return;
        };
        if ai.stagger > 0.0 {
            ai.stagger = (ai.stagger - dt).max(0.0);
            return;
        }

        let Some(target) = target else {
            if let Some(body) = entity.get_mut::<Rigidbody>() {
                body.velocity = Vec2::ZERO;
            }
            return;
        };
        let speed = steer_speed(ai, dt);
        let direction = (target - position).normalize_or_zero();
        if let Some(body) = entity.get_mut::<Rigidbody>() {
            body.velocity = direction * speed;
        }
        if direction != Vec2::ZERO {
            if let Some(transform) = entity.get_mut::<Transform>() {
                transform.rotation = direction.y.atan2(direction.x);
            }
        }
    }
}
