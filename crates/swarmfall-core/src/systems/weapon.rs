//! Weapon firing and projectile upkeep.
//!
//! Every frame the weapon system:
//!
//! 1. Counts projectile lifetimes and re-hit cooldowns down, releasing
//!    expired projectiles
//! 2. Ticks each weapon of each armed entity and fires the ready ones, by
//!    targeting mode for auto-fire weapons and toward the aim point for
//!    manual weapons while attack is held
//! 3. Places orbiting projectiles around their owner at the firing weapon's
//!    current rotation, releasing orbiters whose owner or weapon is gone
//!
//! A fire event rolls its damage once:
//! `attack_power * (level damage / 100) * (1 + final_damage_bonus)`, then a
//! crit roll multiplies it by `crit_multiplier`. The cooldown restarts on
//! every fire event, whether or not a target was found.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::{AttackKind, Targeting, WeaponLevel};
use crate::entity::components::{
    Health, Projectile, ProjectileMotion, ProjectileSource, Stats, Transform,
};
use crate::entity::{ComponentKind, EntityId, EntityTag, Weapon, WeaponSlot};
use crate::input::Action;
use crate::pools::ProjectileSpawn;
use crate::system::{Membership, SimContext, System};
use crate::world::World;

use super::combat::damage_enemy;

/// Rolls the damage of one fire event. Returns the damage and whether it
/// was critical.
pub fn roll_damage<R: Rng + ?Sized>(stats: &Stats, level: &WeaponLevel, rng: &mut R) -> (f32, bool) {
    let base = stats.attack_power * (level.damage / 100.0) * (1.0 + stats.final_damage_bonus);
    let critical = rng.gen::<f32>() < stats.crit_chance;
    if critical {
        (base * stats.crit_multiplier, true)
    } else {
        (base, false)
    }
}

#[derive(Debug, Clone, Copy)]
struct Target {
    id: EntityId,
    position: Vec2,
}

/// One fire event's shared parameters.
#[derive(Debug, Clone, Copy)]
struct Volley {
    origin: Vec2,
    damage: f32,
    critical: bool,
    source: ProjectileSource,
    level: WeaponLevel,
}

impl Volley {
    fn spawn(&self) -> ProjectileSpawn {
        ProjectileSpawn {
            position: self.origin,
            damage: self.damage,
            critical: self.critical,
            pierce: self.level.pierce,
            lifetime: self.level.duration,
            source: Some(self.source),
            radius: self.level.size,
            ..ProjectileSpawn::default()
        }
    }

    fn launch(&self, ctx: &mut SimContext<'_>, direction: Vec2) {
        let spawn = ProjectileSpawn {
            velocity: direction * self.level.projectile_speed,
            ..self.spawn()
        };
        ctx.projectiles.spawn(ctx.world, spawn);
    }
}

/// Per-owner state while its weapons are fired.
struct Armory<'s> {
    owner: EntityId,
    origin: Vec2,
    facing: Vec2,
    stats: Stats,
    targets: &'s [Target],
    candidates: &'s mut Vec<usize>,
}

fn nearest(targets: &[Target], origin: Vec2, range: f32) -> Option<Target> {
    let reach = range * range;
    let mut best: Option<(f32, Target)> = None;
    for target in targets {
        let distance = origin.distance_squared(target.position);
        if distance <= reach && best.map_or(true, |(closest, _)| distance < closest) {
            best = Some((distance, *target));
        }
    }
    best.map(|(_, target)| target)
}

#[allow(clippy::cast_precision_loss)]
fn fan(ctx: &mut SimContext<'_>, volley: &Volley, direction: Vec2) {
    let count = volley.level.projectile_count.max(1);
    let spread = volley.level.spread.to_radians();
    let middle = (count - 1) as f32 / 2.0;
    for index in 0..count {
        let offset = (index as f32 - middle) * spread;
        volley.launch(ctx, Vec2::from_angle(offset).rotate(direction));
    }
}

fn scatter(ctx: &mut SimContext<'_>, volley: &Volley) {
    for _ in 0..volley.level.projectile_count.max(1) {
        let angle = ctx.rng.gen_range(0.0..TAU);
        volley.launch(ctx, Vec2::from_angle(angle));
    }
}

#[allow(clippy::cast_precision_loss)]
fn orbit_ring(ctx: &mut SimContext<'_>, volley: &Volley, rotation: f32) {
    let count = volley.level.projectile_count.max(1);
    let radius = volley.level.orbit_radius;
    for index in 0..count {
        let angle_offset = index as f32 * TAU / count as f32;
        let spawn = ProjectileSpawn {
            position: volley.origin + Vec2::from_angle(rotation + angle_offset) * radius,
            pierce: Projectile::PIERCE_INFINITE,
            motion: ProjectileMotion::Orbit {
                angle_offset,
                radius,
            },
            rehit_interval: Some(volley.level.rehit_interval),
            ..volley.spawn()
        };
        ctx.projectiles.spawn(ctx.world, spawn);
    }
}

fn beam(ctx: &mut SimContext<'_>, volley: &Volley, direction: Vec2) {
    volley.launch(ctx, direction);
}

fn sweep(ctx: &mut SimContext<'_>, volley: &Volley, targets: &[Target], direction: Vec2) {
    let reach = volley.level.range * volley.level.range;
    let min_cos = (volley.level.arc / 2.0).to_radians().cos();
    for target in targets {
        let offset = target.position - volley.origin;
        let distance = offset.length_squared();
        if distance > reach {
            continue;
        }
        if distance == 0.0 || (offset / distance.sqrt()).dot(direction) >= min_cos {
            damage_enemy(ctx, target.id, volley.damage);
        }
    }
}

fn strike_random(
    ctx: &mut SimContext<'_>,
    volley: &Volley,
    targets: &[Target],
    candidates: &mut Vec<usize>,
) {
    let reach = volley.level.range * volley.level.range;
    candidates.clear();
    candidates.extend(
        targets
            .iter()
            .enumerate()
            .filter(|(_, target)| volley.origin.distance_squared(target.position) <= reach)
            .map(|(index, _)| index),
    );
    let count = usize::try_from(volley.level.target_count)
        .unwrap_or(usize::MAX)
        .min(candidates.len());
    let (chosen, _) = candidates.partial_shuffle(&mut *ctx.rng, count);
    for &index in chosen.iter() {
        damage_enemy(ctx, targets[index].id, volley.damage);
    }
}

fn nova(ctx: &mut SimContext<'_>, volley: &Volley, targets: &[Target], center: Vec2) {
    let reach = volley.level.area_radius * volley.level.area_radius;
    for target in targets {
        if center.distance_squared(target.position) <= reach {
            damage_enemy(ctx, target.id, volley.damage);
        }
    }
}

fn clouds(ctx: &mut SimContext<'_>, volley: &Volley) {
    let count = ctx.rng.gen_range(1..=volley.level.cloud_count.max(1));
    for _ in 0..count {
        let angle = ctx.rng.gen_range(0.0..TAU);
        let distance = volley.level.spawn_radius * ctx.rng.gen::<f32>().sqrt();
        let spawn = ProjectileSpawn {
            position: volley.origin + Vec2::from_angle(angle) * distance,
            pierce: Projectile::PIERCE_INFINITE,
            motion: ProjectileMotion::Zone,
            rehit_interval: Some(volley.level.rehit_interval),
            radius: volley.level.area_radius,
            ..volley.spawn()
        };
        ctx.projectiles.spawn(ctx.world, spawn);
    }
}

fn fire_weapon(weapon: &mut Weapon, armory: &mut Armory<'_>, dt: f32, ctx: &mut SimContext<'_>) {
    weapon.tick(dt, armory.stats.cooldown_reduction);
    if !weapon.can_fire() {
        return;
    }
    if weapon.is_manual() && !ctx.input.is_down(Action::Attack) {
        return;
    }

    let level = *weapon.stats();
    let (damage, critical) = roll_damage(&armory.stats, &level, &mut *ctx.rng);
    let volley = Volley {
        origin: armory.origin,
        damage,
        critical,
        source: ProjectileSource {
            owner: armory.owner,
            weapon: weapon.key(),
        },
        level,
    };
    let targets = armory.targets;

    if weapon.is_manual() {
        let aim = (ctx.input.aim_world() - armory.origin)
            .try_normalize()
            .unwrap_or(armory.facing);
        match weapon.attack() {
            AttackKind::MeleeSwing => sweep(ctx, &volley, targets, aim),
            AttackKind::Laser => beam(ctx, &volley, aim),
            _ => fan(ctx, &volley, aim),
        }
    } else {
        match weapon.targeting() {
            Targeting::Rotating => orbit_ring(ctx, &volley, weapon.rotation()),
            Targeting::MultiRandom => strike_random(ctx, &volley, targets, armory.candidates),
            Targeting::Area => clouds(ctx, &volley),
            Targeting::Random => scatter(ctx, &volley),
            Targeting::Nearest => {
                let closest = nearest(targets, armory.origin, level.range);
                let toward = closest.map(|target| {
                    (target.position - armory.origin)
                        .try_normalize()
                        .unwrap_or(armory.facing)
                });
                match (weapon.attack(), closest, toward) {
                    (AttackKind::AreaDamage, Some(target), _) => {
                        nova(ctx, &volley, targets, target.position);
                    }
                    (AttackKind::DirectDamage, Some(target), _) => {
                        damage_enemy(ctx, target.id, damage);
                    }
                    (AttackKind::MeleeSwing, _, direction) => {
                        sweep(ctx, &volley, targets, direction.unwrap_or(armory.facing));
                    }
                    (AttackKind::Laser, _, Some(direction)) => beam(ctx, &volley, direction),
                    (AttackKind::Projectile, _, Some(direction)) => fan(ctx, &volley, direction),
                    _ => {}
                }
            }
        }
    }
    tracing::trace!(weapon = weapon.id(), damage, critical, "weapon fired");
    weapon.fire();
}

fn orbit_anchor(world: &World, source: ProjectileSource) -> Option<(Vec2, f32)> {
    let owner = world.get(source.owner).filter(|entity| entity.is_live())?;
    let center = owner.get::<Transform>()?.position;
    let rotation = owner
        .get::<WeaponSlot>()
        .and_then(|slot| slot.get_by_key(source.weapon))
        .or_else(|| owner.get::<Weapon>().filter(|weapon| weapon.key() == source.weapon))
        .map(Weapon::rotation)?;
    Some((center, rotation))
}

/// Fires weapons and maintains projectiles.
#[derive(Debug)]
pub struct WeaponSystem {
    membership: Membership,
    targets: Vec<Target>,
    candidates: Vec<usize>,
    in_flight: Vec<EntityId>,
}

impl WeaponSystem {
    /// A weapon system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            membership: Membership::new(&[ComponentKind::Transform])
                .with_any(&[ComponentKind::WeaponSlot, ComponentKind::Weapon]),
            targets: Vec::new(),
            candidates: Vec::new(),
            in_flight: Vec::new(),
        }
    }

    fn expire_projectiles(&mut self, dt: f32, ctx: &mut SimContext<'_>) {
        self.in_flight.clear();
        self.in_flight.extend(ctx.projectiles.active_ids());
        for &id in &self.in_flight {
            let expired = ctx
                .world
                .component_mut::<Projectile>(id)
                .map_or(true, |projectile| {
                    projectile.lifetime -= dt;
                    projectile.tick_hits(dt);
                    projectile.lifetime <= 0.0
                });
            if expired {
                ctx.projectiles.despawn(ctx.world, id);
            }
        }
    }

    fn collect_targets(&mut self, world: &World) {
        self.targets.clear();
        self.targets.extend(
            world
                .live_tagged(EntityTag::Enemy)
                .filter(|enemy| enemy.get::<Health>().is_some_and(|health| !health.is_dead()))
                .filter_map(|enemy| {
                    enemy.get::<Transform>().map(|transform| Target {
                        id: enemy.id(),
                        position: transform.position,
                    })
                }),
        );
    }

    fn place_orbiters(&mut self, ctx: &mut SimContext<'_>) {
        self.in_flight.clear();
        self.in_flight.extend(ctx.projectiles.active_ids());
        for &id in &self.in_flight {
            let Some(projectile) = ctx.world.component::<Projectile>(id) else {
                continue;
            };
            let ProjectileMotion::Orbit {
                angle_offset,
                radius,
            } = projectile.motion
            else {
                continue;
            };
            let anchor = projectile
                .source
                .and_then(|source| orbit_anchor(ctx.world, source));
            match anchor {
                Some((center, rotation)) => {
                    if let Some(transform) = ctx.world.component_mut::<Transform>(id) {
                        let angle = rotation + angle_offset;
                        transform.position = center + Vec2::from_angle(angle) * radius;
                        transform.rotation = angle;
                    }
                }
                None => {
                    ctx.projectiles.despawn(ctx.world, id);
                }
            }
        }
    }
}

impl Default for WeaponSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for WeaponSystem {
    fn name(&self) -> &'static str {
        "weapon"
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
        let Some(transform) = entity.get::<Transform>().copied() else {
            return;
        };
        let stats = entity.get::<Stats>().copied().unwrap_or_default();
        let mut slot = entity.remove_component::<WeaponSlot>();
        let mut single = entity.remove_component::<Weapon>();

        let mut armory = Armory {
            owner: id,
            origin: transform.position,
            facing: Vec2::from_angle(transform.rotation),
            stats,
            targets: &self.targets,
            candidates: &mut self.candidates,
        };
        if let Some(slot) = slot.as_mut() {
            for weapon in slot.iter_mut() {
                fire_weapon(weapon, &mut armory, dt, ctx);
            }
        }
        if let Some(weapon) = single.as_mut() {
            fire_weapon(weapon, &mut armory, dt, ctx);
        }

        if let Some(entity) = ctx.world.get_mut(id) {
            if let Some(slot) = slot {
                entity.add_component(slot);
            }
            if let Some(weapon) = single {
                entity.add_component(weapon);
            }
        }
    }

    fn update(&mut self, dt: f32, ctx: &mut SimContext<'_>) {
        self.expire_projectiles(dt, ctx);
        self.collect_targets(ctx.world);

        let members = self.membership.take_snapshot();
        for &id in &members {
            if ctx.world.is_live(id) {
                self.process(id, dt, ctx);
            }
        }
        self.membership.restore_snapshot(members);

        self.place_orbiters(ctx);
    }
}
