//! Player steering and rigidbody integration.

use glam::Vec2;

use crate::entity::components::{Rigidbody, Stats, Transform};
use crate::entity::{ComponentKind, EntityId, EntityTag};
use crate::system::{Membership, SimContext, System};

/// Integrates every entity with a transform and a rigidbody.
///
/// The player's velocity is replaced each frame by the normalised move axis
/// times its move speed before integration.
#[derive(Debug)]
pub struct MovementSystem {
    membership: Membership,
}

impl MovementSystem {
    /// A movement system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            membership: Membership::new(&[ComponentKind::Transform, ComponentKind::Rigidbody]),
        }
    }
}

impl Default for MovementSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies acceleration, drag and the speed cap to `body` and returns the
/// displacement over `dt`.
///
/// Drag is a per-second fraction of velocity; zero `max_speed` means uncapped.
pub fn integrate(body: &mut Rigidbody, dt: f32) -> Vec2 {
    body.velocity += body.acceleration * dt;
    if body.drag > 0.0 {
        body.velocity *= (1.0 - body.drag * dt).max(0.0);
    }
    if body.max_speed > 0.0 {
        body.velocity = body.velocity.clamp_length_max(body.max_speed);
    }
    body.velocity * dt
}

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn membership(&self) -> &Membership {
        &self.membership
    }

    fn membership_mut(&mut self) -> &mut Membership {
        &mut self.membership
    }

    fn process(&mut self, id: EntityId, dt: f32, ctx: &mut SimContext<'_>) {
        let axis = ctx.input.move_axis();
        let Some(entity) = ctx.world.get_mut(id) else {
            return;
        };
        let steer = if entity.tag() == EntityTag::Player {
            entity.get::<Stats>().map(|stats| stats.move_speed)
        } else {
            None
        };
        let Some(body) = entity.get_mut::<Rigidbody>() else {
            return;
        };
        if let Some(speed) = steer {
            body.velocity = axis.normalize_or_zero() * speed;
        }
        let displacement = integrate(body, dt);
        let velocity = body.velocity;

        if let Some(transform) = entity.get_mut::<Transform>() {
            transform.position += displacement;
            if steer.is_some() && velocity != Vec2::ZERO {
                transform.rotation = velocity.y.atan2(velocity.x);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integrate_applies_acceleration() {
        let mut body = Rigidbody {
            acceleration: Vec2::new(10.0, 0.0),
            ..Rigidbody::default()
        };
        let moved = integrate(&mut body, 0.5);
        assert_eq!(body.velocity, Vec2::new(5.0, 0.0));
        assert_eq!(moved, Vec2::new(2.5, 0.0));
    }

    #[test]
    fn integrate_caps_speed() {
        let mut body = Rigidbody::with_max_speed(100.0);
        body.velocity = Vec2::new(300.0, 400.0);
        integrate(&mut body, 0.1);
        assert!((body.velocity.length() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn integrate_drag_never_reverses_velocity() {
        let mut body = Rigidbody {
            velocity: Vec2::new(50.0, 0.0),
            drag: 100.0,
            ..Rigidbody::default()
        };
        integrate(&mut body, 0.1);
        assert_eq!(body.velocity, Vec2::ZERO);
    }
}
