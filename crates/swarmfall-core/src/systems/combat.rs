//! Collision consequences.
//!
//! Combat owns no members. Each frame it counts down every invincibility
//! window, then reads the `Collision` events published earlier in the frame
//! and resolves each pair by tag:
//!
//! - projectile and enemy: damage, hit event, pierce bookkeeping
//! - player and enemy: wave-scaled contact damage, invincibility, knockback
//! - player and pickup: experience, gold or healing
//!
//! Pairs whose entities were released or killed earlier in the frame are
//! skipped.

use glam::Vec2;

use crate::config::DropKind;
use crate::entity::components::{
    Ai, DamageOutcome, Enemy, Health, Pickup, Projectile, Rigidbody, Stats,
};
use crate::entity::{EntityId, EntityTag};
use crate::event::{EventKind, GameEvent};
use crate::system::{Membership, SimContext, System};
use crate::world::World;

/// Resolves this frame's collisions.
#[derive(Debug)]
pub struct CombatSystem {
    membership: Membership,
    pairs: Vec<(EntityId, EntityId)>,
}

impl CombatSystem {
    /// A combat system.
    #[must_use]
    pub fn new() -> Self {
        Self {
            membership: Membership::new(&[]),
            pairs: Vec::new(),
        }
    }
}

impl Default for CombatSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn live_tag(world: &World, id: EntityId) -> Option<EntityTag> {
    world.get(id).filter(|entity| entity.is_live()).map(|entity| entity.tag())
}

fn apply_damage(world: &mut World, enemy: EntityId, amount: f32) -> DamageOutcome {
    world
        .component_mut::<Health>(enemy)
        .map_or(DamageOutcome::Ignored, |health| health.take_damage(amount))
}

fn report_kill(ctx: &mut SimContext<'_>, enemy: EntityId) {
    let position = ctx.world.position(enemy).unwrap_or(Vec2::ZERO);
    ctx.events.emit(GameEvent::EnemyKilled { enemy, position });
}

/// Damages `enemy` and publishes `EnemyKilled` on the killing blow.
///
/// Dead, missing or inactive enemies are left alone.
pub fn damage_enemy(ctx: &mut SimContext<'_>, enemy: EntityId, amount: f32) -> DamageOutcome {
    if live_tag(ctx.world, enemy).is_none() {
        return DamageOutcome::Ignored;
    }
    let outcome = apply_damage(ctx.world, enemy, amount);
    if outcome == DamageOutcome::Killed {
        report_kill(ctx, enemy);
    }
    outcome
}

fn projectile_hits_enemy(ctx: &mut SimContext<'_>, projectile: EntityId, enemy: EntityId) {
    let Some(payload) = ctx.world.component::<Projectile>(projectile) else {
        return;
    };
    if payload.has_hit(enemy) {
        return;
    }
    let (damage, critical) = (payload.damage, payload.critical);

    let outcome = apply_damage(ctx.world, enemy, damage);
    if outcome == DamageOutcome::Ignored {
        return;
    }
    ctx.events.emit(GameEvent::ProjectileHit {
        projectile,
        enemy,
        damage,
        critical,
    });
    if outcome == DamageOutcome::Killed {
        report_kill(ctx, enemy);
    }

    let spent = ctx
        .world
        .component_mut::<Projectile>(projectile)
        .is_some_and(|payload| payload.register_hit(enemy));
    if spent {
        ctx.projectiles.despawn(ctx.world, projectile);
    }
}

fn enemy_hits_player(ctx: &mut SimContext<'_>, player: EntityId, enemy: EntityId) {
    if ctx
        .world
        .component::<Health>(enemy)
        .map_or(true, Health::is_dead)
    {
        return;
    }
    let Some(base) = ctx.world.component::<Enemy>(enemy).map(|e| e.base_damage) else {
        return;
    };
    let damage = ctx.config.spawn.scaled_damage(base, ctx.wave);
    let Some(health) = ctx.world.component_mut::<Health>(player) else {
        return;
    };
    let outcome = health.take_damage(damage);
    if outcome == DamageOutcome::Ignored {
        return;
    }
    health.set_invincible(ctx.config.combat.player_invincibility);
    tracing::debug!(%player, %enemy, damage, hp = health.current(), "player hit");

    knock_back(ctx, player, enemy);
    if outcome == DamageOutcome::Killed {
        ctx.events.emit(GameEvent::PlayerDied { player });
    }
}

fn knock_back(ctx: &mut SimContext<'_>, player: EntityId, enemy: EntityId) {
    let (Some(from), Some(to)) = (ctx.world.position(player), ctx.world.position(enemy)) else {
        return;
    };
    let direction = (to - from).try_normalize().unwrap_or(Vec2::X);
    let combat = &ctx.config.combat;
    let Some(entity) = ctx.world.get_mut(enemy) else {
        return;
    };
    if let Some(body) = entity.get_mut::<Rigidbody>() {
        body.velocity = direction * combat.knockback_impulse;
    }
    if let Some(ai) = entity.get_mut::<Ai>() {
        ai.stagger(combat.knockback_duration);
    }
}

fn collect_pickup(ctx: &mut SimContext<'_>, player: EntityId, item: EntityId) {
    let Some(pickup) = ctx.world.component_mut::<Pickup>(item) else {
        return;
    };
    if pickup.collected {
        return;
    }
    pickup.collected = true;
    let (kind, value) = (pickup.kind, pickup.value);

    let Some(entity) = ctx.world.get_mut(player) else {
        return;
    };
    match kind {
        DropKind::Experience => {
            if let Some(stats) = entity.get_mut::<Stats>() {
                stats.add_experience(value);
            }
        }
        DropKind::Gold => {
            if let Some(stats) = entity.get_mut::<Stats>() {
                stats.add_gold(value);
            }
        }
        DropKind::Health => {
            if let Some(health) = entity.get_mut::<Health>() {
                health.heal(value);
            }
        }
    }
    ctx.events.emit(GameEvent::ItemPickedUp {
        player,
        item,
        kind,
        value,
    });
}

fn resolve_pair(ctx: &mut SimContext<'_>, a: EntityId, b: EntityId) {
    let (Some(tag_a), Some(tag_b)) = (live_tag(ctx.world, a), live_tag(ctx.world, b)) else {
        return;
    };
    match (tag_a, tag_b) {
        (EntityTag::Projectile, EntityTag::Enemy) => projectile_hits_enemy(ctx, a, b),
        (EntityTag::Enemy, EntityTag::Projectile) => projectile_hits_enemy(ctx, b, a),
        (EntityTag::Player, EntityTag::Enemy) => enemy_hits_player(ctx, a, b),
        (EntityTag::Enemy, EntityTag::Player) => enemy_hits_player(ctx, b, a),
        (EntityTag::Player, EntityTag::Pickup) => collect_pickup(ctx, a, b),
        (EntityTag::Pickup, EntityTag::Player) => collect_pickup(ctx, b, a),
        _ => {}
    }
}

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn membership(&self) -> &Membership {
        &self.membership
    }

    fn membership_mut(&mut self) -> &mut Membership {
        &mut self.membership
    }

    fn update(&mut self, dt: f32, ctx: &mut SimContext<'_>) {
        for entity in ctx.world.iter_mut() {
            if !entity.is_live() {
                continue;
            }
            if let Some(health) = entity.get_mut::<Health>() {
                health.tick(dt);
            }
        }

        self.pairs.clear();
        self.pairs
            .extend(ctx.events.events_of(EventKind::Collision).filter_map(|event| match *event {
                GameEvent::Collision { entity_a, entity_b } => Some((entity_a, entity_b)),
                _ => None,
            }));
        for &(a, b) in &self.pairs {
            resolve_pair(ctx, a, b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::Transform;
    use crate::tests::helpers::TestRig;

    #[test]
    fn damage_enemy_reports_kill_once() {
        let mut rig = TestRig::new();
        let enemy = rig.enemy_at("normal", Vec2::new(50.0, 0.0));
        let mut ctx = rig.context();

        assert_eq!(damage_enemy(&mut ctx, enemy, 30.0), DamageOutcome::Damaged);
        assert_eq!(damage_enemy(&mut ctx, enemy, 30.0), DamageOutcome::Killed);
        assert_eq!(damage_enemy(&mut ctx, enemy, 30.0), DamageOutcome::Ignored);
        assert_eq!(ctx.events.events_of(EventKind::EnemyKilled).count(), 1);
    }

    #[test]
    fn projectile_with_pierce_survives_first_hit() {
        let mut rig = TestRig::new();
        let a = rig.enemy_at("normal", Vec2::new(10.0, 0.0));
        let b = rig.enemy_at("normal", Vec2::new(12.0, 0.0));
        let projectile = rig.projectile_at(Vec2::new(11.0, 0.0), 5.0, 2);
        let mut ctx = rig.context();

        projectile_hits_enemy(&mut ctx, projectile, a);
        projectile_hits_enemy(&mut ctx, projectile, a);
        assert!(ctx.projectiles.is_active(projectile));
        assert_eq!(ctx.events.events_of(EventKind::ProjectileHit).count(), 1);

        projectile_hits_enemy(&mut ctx, projectile, b);
        assert!(!ctx.projectiles.is_active(projectile));
        assert_eq!(ctx.events.events_of(EventKind::ProjectileHit).count(), 2);
    }

    #[test]
    fn contact_damage_knocks_enemy_back() {
        let mut rig = TestRig::new();
        let player = rig.player();
        let enemy = rig.enemy_at("normal", Vec2::new(10.0, 0.0));
        let mut ctx = rig.context();

        enemy_hits_player(&mut ctx, player, enemy);
        let health = ctx.world.component::<Health>(player).unwrap();
        assert_eq!(health.current(), 90.0);
        assert!(health.is_invincible());

        let body = ctx.world.component::<Rigidbody>(enemy).unwrap();
        assert_eq!(body.velocity, Vec2::new(300.0, 0.0));
        assert!(ctx.world.component::<Ai>(enemy).unwrap().stagger > 0.0);
        assert_eq!(
            ctx.world.component::<Transform>(enemy).unwrap().position,
            Vec2::new(10.0, 0.0)
        );
    }

    #[test]
    fn pickup_is_collected_once() {
        let mut rig = TestRig::new();
        let player = rig.player();
        let gem = rig.drop_at(DropKind::Experience, Vec2::ZERO, 4.0);
        let mut ctx = rig.context();

        collect_pickup(&mut ctx, player, gem);
        collect_pickup(&mut ctx, player, gem);
        assert_eq!(ctx.world.component::<Stats>(player).unwrap().experience, 4.0);
        assert_eq!(ctx.events.events_of(EventKind::ItemPickedUp).count(), 1);
    }
}
