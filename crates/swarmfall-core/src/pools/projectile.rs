//! The projectile pool.
//!
//! Every weapon output that exists as an entity (bolts, beams, orbiting
//! blades and lingering clouds) comes from this single pool; the
//! [`ProjectileMotion`] set at spawn decides how it behaves.

use glam::Vec2;

use crate::config::PoolConfig;
use crate::entity::components::{
    Collider, CollisionLayers, Projectile, ProjectileMotion, ProjectileSource, RenderShape,
    Renderer, Rigidbody, Transform,
};
use crate::entity::{EntityId, EntityTag};
use crate::pool::Recycle;
use crate::world::World;

use super::EntityPool;

const PROJECTILE_LAYER: i32 = 2;
const PROJECTILE_COLOR: [u8; 4] = [255, 240, 160, 255];

/// Live parameters of a projectile spawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    /// Spawn position.
    pub position: Vec2,
    /// Initial velocity; zero for orbiters and zones.
    pub velocity: Vec2,
    /// Damage per hit.
    pub damage: f32,
    /// Whether the fire event was critical.
    pub critical: bool,
    /// Hits before release.
    pub pierce: u32,
    /// Seconds until expiry.
    pub lifetime: f32,
    /// Motion model.
    pub motion: ProjectileMotion,
    /// Firing entity and weapon.
    pub source: Option<ProjectileSource>,
    /// Re-hit cooldown per enemy; `None` hits each enemy once.
    pub rehit_interval: Option<f32>,
    /// Collider radius.
    pub radius: f32,
    /// RGBA colour.
    pub color: [u8; 4],
}

impl Default for ProjectileSpawn {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            damage: 0.0,
            critical: false,
            pierce: 1,
            lifetime: 1.0,
            motion: ProjectileMotion::Linear,
            source: None,
            rehit_interval: None,
            radius: 5.0,
            color: PROJECTILE_COLOR,
        }
    }
}

/// Builds and resets projectile entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectileRecycler;

impl Recycle for ProjectileRecycler {
    type Item = EntityId;
    type Env = World;
    type Args = ProjectileSpawn;

    fn create(&mut self, world: &mut World) -> EntityId {
        let defaults = ProjectileSpawn::default();
        world
            .spawn(EntityTag::Projectile, "Projectile")
            .inactive()
            .with(Transform::default())
            .with(Rigidbody::default())
            .with(Renderer::new(
                RenderShape::Circle,
                defaults.color,
                defaults.radius * 2.0,
                PROJECTILE_LAYER,
            ))
            .with(Collider::circle(
                defaults.radius,
                CollisionLayers::PROJECTILE,
                CollisionLayers::ENEMY,
            ))
            .with(Projectile::default())
            .id()
    }

    fn reset(&mut self, id: &mut EntityId, world: &mut World, args: ProjectileSpawn) {
        let Some(entity) = world.get_mut(*id) else {
            return;
        };
        entity.set_active(true);
        if let Some(transform) = entity.get_mut::<Transform>() {
            *transform = Transform::at(args.position);
            if args.velocity != Vec2::ZERO {
                transform.rotation = args.velocity.y.atan2(args.velocity.x);
            }
        }
        if let Some(body) = entity.get_mut::<Rigidbody>() {
            body.stop();
            body.velocity = args.velocity;
        }
        if let Some(renderer) = entity.get_mut::<Renderer>() {
            renderer.size = args.radius * 2.0;
            renderer.color = args.color;
            renderer.shape = match args.motion {
                ProjectileMotion::Zone => RenderShape::Square,
                _ => RenderShape::Circle,
            };
        }
        if let Some(collider) = entity.get_mut::<Collider>() {
            collider.set_radius(args.radius);
            collider.enabled = true;
        }
        if let Some(projectile) = entity.get_mut::<Projectile>() {
            projectile.clear_hits();
            projectile.damage = args.damage;
            projectile.critical = args.critical;
            projectile.pierce = args.pierce.max(1);
            projectile.lifetime = args.lifetime;
            projectile.motion = args.motion;
            projectile.source = args.source;
            projectile.rehit_interval = args.rehit_interval;
        }
    }

    fn retire(&mut self, id: &mut EntityId, world: &mut World) {
        let Some(entity) = world.get_mut(*id) else {
            return;
        };
        entity.set_active(false);
        if let Some(body) = entity.get_mut::<Rigidbody>() {
            body.stop();
        }
        if let Some(collider) = entity.get_mut::<Collider>() {
            collider.enabled = false;
        }
    }

    fn destroy(&mut self, id: EntityId, world: &mut World) {
        world.destroy(id);
    }
}

/// Pool of projectile entities.
#[derive(Debug)]
pub struct ProjectilePool {
    inner: EntityPool<ProjectileRecycler>,
}

impl ProjectilePool {
    /// Builds and pre-warms the pool.
    pub fn new(bounds: PoolConfig, world: &mut World) -> Self {
        Self {
            inner: EntityPool::new(ProjectileRecycler, bounds, world),
        }
    }

    /// Spawns a projectile. `None` when the pool is exhausted.
    pub fn spawn(&mut self, world: &mut World, args: ProjectileSpawn) -> Option<EntityId> {
        self.inner.spawn(world, args)
    }

    /// Returns projectile `id` to the pool.
    pub fn despawn(&mut self, world: &mut World, id: EntityId) -> bool {
        self.inner.despawn(world, id)
    }

    /// Returns every projectile to the pool.
    pub fn despawn_all(&mut self, world: &mut World) -> usize {
        self.inner.despawn_all(world)
    }

    /// Destroys every pooled projectile.
    pub fn teardown(&mut self, world: &mut World) {
        self.inner.teardown(world);
    }

    /// Returns `true` if projectile `id` is in flight.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.inner.is_active(id)
    }

    /// Projectiles in flight, in slot order.
    pub fn active_ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.inner.active_ids()
    }

    /// Projectiles in flight.
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.inner.active_count()
    }

    /// Entities built so far.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.inner.total_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::WeaponKey;

    fn pool(world: &mut World) -> ProjectilePool {
        ProjectilePool::new(
            PoolConfig {
                initial: 4,
                max: 8,
                growth: 4,
            },
            world,
        )
    }

    #[test]
    fn spawn_writes_payload_and_motion() {
        let mut world = World::new();
        let mut pool = pool(&mut world);
        let owner = EntityId::new(99);
        let id = pool
            .spawn(
                &mut world,
                ProjectileSpawn {
                    position: Vec2::new(1.0, 2.0),
                    velocity: Vec2::new(0.0, 400.0),
                    damage: 12.5,
                    pierce: 3,
                    lifetime: 2.0,
                    source: Some(ProjectileSource {
                        owner,
                        weapon: WeaponKey::new(0),
                    }),
                    radius: 7.0,
                    ..ProjectileSpawn::default()
                },
            )
            .unwrap();

        let entity = world.get(id).unwrap();
        let projectile = entity.get::<Projectile>().unwrap();
        assert_eq!(projectile.damage, 12.5);
        assert_eq!(projectile.pierce, 3);
        assert_eq!(projectile.source.unwrap().owner, owner);
        assert_eq!(entity.get::<Rigidbody>().unwrap().velocity, Vec2::new(0.0, 400.0));
        assert_eq!(entity.get::<Renderer>().unwrap().size, 14.0);
        assert!(entity.get::<Collider>().unwrap().enabled);
    }

    #[test]
    fn reuse_clears_hit_history() {
        let mut world = World::new();
        let mut pool = pool(&mut world);
        let enemy = EntityId::new(500);
        let id = pool.spawn(&mut world, ProjectileSpawn::default()).unwrap();
        world
            .component_mut::<Projectile>(id)
            .unwrap()
            .register_hit(enemy);
        pool.despawn(&mut world, id);

        let reused = pool.spawn(&mut world, ProjectileSpawn::default()).unwrap();
        assert_eq!(reused, id);
        assert!(!world.component::<Projectile>(reused).unwrap().has_hit(enemy));
    }

    #[test]
    fn despawn_disables_collider() {
        let mut world = World::new();
        let mut pool = pool(&mut world);
        let id = pool.spawn(&mut world, ProjectileSpawn::default()).unwrap();
        assert!(pool.despawn(&mut world, id));
        assert!(!pool.is_active(id));
        assert!(!world.component::<Collider>(id).unwrap().enabled);
        assert_eq!(pool.active_count(), 0);
    }

    #[test]
    fn grows_past_prewarm() {
        let mut world = World::new();
        let mut pool = pool(&mut world);
        let spawned: Vec<EntityId> = (0..8)
            .map(|_| pool.spawn(&mut world, ProjectileSpawn::default()).unwrap())
            .collect();
        assert_eq!(pool.total_count(), 8);
        assert!(pool.spawn(&mut world, ProjectileSpawn::default()).is_none());
        assert!(spawned.iter().all(|id| pool.is_active(*id)));
        assert!(pool.despawn(&mut world, spawned[7]));
    }
}
