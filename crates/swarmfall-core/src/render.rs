//! Render collaborator boundary.
//!
//! After each update the simulation walks live entities that carry a
//! transform and a visible renderer and hands one [`DrawCommand`] per entity
//! to a [`DrawContext`], lowest layer first and by id within a layer. The
//! core never reads anything back from the context.

use glam::Vec2;

use crate::entity::components::{Health, RenderShape, Renderer, Transform};
use crate::entity::EntityId;
use crate::world::World;

/// One primitive to draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    /// Entity being drawn.
    pub entity: EntityId,
    /// World position.
    pub position: Vec2,
    /// Facing in radians.
    pub rotation: f32,
    /// Size in world units, after transform scale.
    pub size: f32,
    /// Primitive.
    pub shape: RenderShape,
    /// RGBA colour.
    pub color: [u8; 4],
    /// Draw layer.
    pub layer: i32,
    /// Health fraction for entities with health, for bars.
    pub health: Option<f32>,
}

/// Sink for draw commands.
pub trait DrawContext {
    /// Draws one primitive.
    fn draw(&mut self, command: &DrawCommand);
}

/// Collects draw commands for `world` into `out`, sorted by layer then id.
pub fn collect_draw_commands(world: &World, out: &mut Vec<DrawCommand>) {
    out.clear();
    for entity in world.live() {
        let (Some(transform), Some(renderer)) = (entity.get::<Transform>(), entity.get::<Renderer>())
        else {
            continue;
        };
        if !renderer.visible {
            continue;
        }
        out.push(DrawCommand {
            entity: entity.id(),
            position: transform.position,
            rotation: transform.rotation,
            size: renderer.size * transform.scale,
            shape: renderer.shape,
            color: renderer.color,
            layer: renderer.layer,
            health: entity.get::<Health>().map(Health::fraction),
        });
    }
    out.sort_by_key(|command| (command.layer, command.entity));
}
