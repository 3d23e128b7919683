//! Pairwise overlap detection.
//!
//! Every enabled collider is tested against every other once per frame. A
//! pair is tested only when each side's layer is in the other's mask, and
//! each overlapping pair is published as one `Collision` event with the
//! lower id first. Touching edges do not count as overlap.

use glam::Vec2;

use crate::entity::components::{Collider, Shape, Transform};
use crate::entity::{ComponentKind, EntityId};
use crate::event::GameEvent;
use crate::system::{Membership, SimContext, System};

/// Circle against circle.
#[must_use]
pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

/// Circle against axis-aligned box, by the box point closest to the centre.
#[must_use]
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect_center: Vec2, half_extents: Vec2) -> bool {
    let closest = center
        .max(rect_center - half_extents)
        .min(rect_center + half_extents);
    center.distance_squared(closest) < radius * radius
}

/// Axis-aligned box against axis-aligned box.
#[must_use]
pub fn rects_overlap(a: Vec2, half_a: Vec2, b: Vec2, half_b: Vec2) -> bool {
    let gap = (a - b).abs();
    gap.x < half_a.x + half_b.x && gap.y < half_a.y + half_b.y
}

/// Any shape against any shape.
#[must_use]
pub fn shapes_overlap(a: Vec2, shape_a: &Shape, b: Vec2, shape_b: &Shape) -> bool {
    match (*shape_a, *shape_b) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => circles_overlap(a, ra, b, rb),
        (Shape::Circle { radius }, Shape::Rect { half_extents }) => {
            circle_rect_overlap(a, radius, b, half_extents)
        }
        (Shape::Rect { half_extents }, Shape::Circle { radius }) => {
            circle_rect_overlap(b, radius, a, half_extents)
        }
        (Shape::Rect { half_extents: ha }, Shape::Rect { half_extents: hb }) => {
            rects_overlap(a, ha, b, hb)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    id: EntityId,
    position: Vec2,
    collider: Collider,
}

/// Publishes a `Collision` event for every overlapping pair.
#[derive(Debug)]
pub struct CollisionSystem {
    membership: Membership,
    bodies: Vec<Body>,
}

impl CollisionSystem {
    /// A collision system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            membership: Membership::new(&[ComponentKind::Transform, ComponentKind::Collider]),
            bodies: Vec::new(),
        }
    }
}

impl Default for CollisionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for CollisionSystem {
    fn name(&self) -> &'static str {
        "collision"
    }

    fn membership(&self) -> &Membership {
        &self.membership
    }

    fn membership_mut(&mut self) -> &mut Membership {
        &mut self.membership
    }

    fn update(&mut self, _dt: f32, ctx: &mut SimContext<'_>) {
        self.bodies.clear();
        for id in self.membership.members() {
            let Some(entity) = ctx.world.get(id) else {
                continue;
            };
            if let (Some(transform), Some(collider)) =
                (entity.get::<Transform>(), entity.get::<Collider>())
            {
                if collider.enabled {
                    self.bodies.push(Body {
                        id,
                        position: transform.position,
                        collider: *collider,
                    });
                }
            }
        }

        // Members iterate in id order, so `a.id < b.id` for every pair.
        for (index, a) in self.bodies.iter().enumerate() {
            for b in &self.bodies[index + 1..] {
                if a.collider.accepts(&b.collider)
                    && shapes_overlap(a.position, &a.collider.shape, b.position, &b.collider.shape)
                {
                    ctx.events.emit(GameEvent::Collision {
                        entity_a: a.id,
                        entity_b: b.id,
                    });
                }
            }
        }
    }
}
