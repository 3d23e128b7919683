//! Integration tests for the frame pipeline.
//!
//! These tests run several systems, the spawn manager, or the whole
//! [`Simulation`] together:
//! - Projectile hits resolving into kills, loot and recycling
//! - Contact damage and invincibility across frames
//! - Orbiting weapons laid out around their owner
//! - Wave escalation through the event bus
//! - Pickup collection driving level-ups

use std::cell::RefCell;
use std::f32::consts::{FRAC_PI_2, TAU};
use std::rc::Rc;

use glam::Vec2;

use crate::config::{DropKind, GameConfig};
use crate::entity::components::{Health, Pickup, Projectile, ProjectileMotion, Stats};
use crate::entity::{EntityId, EntityTag, WeaponSlot};
use crate::event::{EventKind, GameEvent};
use crate::input::InputSnapshot;
use crate::simulation::Simulation;
use crate::spawn::SpawnManager;
use crate::system::{run_system, System};
use crate::systems::{CollisionSystem, CombatSystem, WeaponSystem};

use super::helpers::{rng, run_frames, TestRig};

fn collide_and_resolve(rig: &mut TestRig, dt: f32) {
    let mut systems: [Box<dyn System>; 2] =
        [Box::new(CollisionSystem::new()), Box::new(CombatSystem::new())];
    let mut ctx = rig.context();
    for system in &mut systems {
        run_system(system.as_mut(), dt, &mut ctx);
    }
}

fn wave_log(sim: &mut Simulation) -> Rc<RefCell<Vec<u32>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    sim.events_mut().subscribe(EventKind::WaveChanged, move |event, _| {
        if let GameEvent::WaveChanged { wave } = event {
            sink.borrow_mut().push(*wave);
        }
    });
    log
}

// =============================================================================
// Combat Pipeline
// =============================================================================

#[test]
fn projectile_kill_rolls_loot_and_recycles() {
    let mut rig = TestRig::new();
    let enemy = rig.enemy_at("normal", Vec2::new(100.0, 0.0));
    let projectile = rig.projectile_at(Vec2::new(100.0, 0.0), 60.0, 1);

    rig.events.begin_frame();
    collide_and_resolve(&mut rig, 0.016);

    let health = rig.world.component::<Health>(enemy).unwrap();
    assert!(health.is_dead());
    assert_eq!(health.current(), 0.0);
    assert_eq!(rig.events.events_of(EventKind::ProjectileHit).count(), 1);
    assert_eq!(rig.events.events_of(EventKind::EnemyKilled).count(), 1);
    assert!(!rig.projectiles.is_active(projectile));

    // Normal enemies always drop an experience gem.
    let player = rig.player();
    rig.spawner.update(
        0.016,
        &mut rig.world,
        &mut rig.events,
        &mut rig.rng,
        &rig.config,
        Some(player),
    );
    assert!(!rig.spawner.enemy_pool().is_active(enemy));
    let gems: Vec<_> = rig
        .world
        .live_tagged(EntityTag::Pickup)
        .filter(|entity| entity.get::<Pickup>().is_some_and(|p| p.kind == DropKind::Experience))
        .collect();
    assert_eq!(gems.len(), 1);
    assert_eq!(rig.world.position(gems[0].id()), Some(Vec2::new(100.0, 0.0)));
}

#[test]
fn invincibility_blocks_repeat_contact() {
    let mut rig = TestRig::new();
    let player = rig.player();
    rig.enemy_at("normal", Vec2::new(10.0, 0.0));

    rig.events.begin_frame();
    collide_and_resolve(&mut rig, 0.016);
    assert_eq!(rig.world.component::<Health>(player).unwrap().current(), 90.0);

    rig.events.begin_frame();
    collide_and_resolve(&mut rig, 0.1);
    let health = rig.world.component::<Health>(player).unwrap();
    assert_eq!(health.current(), 90.0);
    assert!(health.is_invincible());
}

#[test]
fn invincibility_expires() {
    let mut rig = TestRig::new();
    let player = rig.player();
    rig.enemy_at("normal", Vec2::new(10.0, 0.0));

    rig.events.begin_frame();
    collide_and_resolve(&mut rig, 0.016);
    rig.events.begin_frame();
    collide_and_resolve(&mut rig, 0.6);
    assert_eq!(rig.world.component::<Health>(player).unwrap().current(), 80.0);
}

// =============================================================================
// Weapons
// =============================================================================

fn arm_orbit_blades(rig: &mut TestRig, count: u32) {
    let player = rig.player();
    rig.config
        .weapons
        .get_mut("orbit_blade")
        .unwrap()
        .levels[0]
        .projectile_count = count;
    let config = rig.config.clone();
    let slot = rig.world.component_mut::<WeaponSlot>(player).unwrap();
    *slot = WeaponSlot::new();
    slot.add_weapon("orbit_blade", &config).unwrap();
}

fn orbit_offsets(rig: &TestRig) -> Vec<(EntityId, f32)> {
    let mut offsets: Vec<(EntityId, f32)> = rig
        .projectiles
        .active_ids()
        .map(|id| match rig.world.component::<Projectile>(id).unwrap().motion {
            ProjectileMotion::Orbit { angle_offset, .. } => (id, angle_offset),
            other => panic!("unexpected motion {other:?}"),
        })
        .collect();
    offsets.sort_by(|a, b| a.1.total_cmp(&b.1));
    offsets
}

fn assert_quarter_turns(offsets: &[(EntityId, f32)]) {
    assert_eq!(offsets.len(), 4);
    for (index, (_, offset)) in offsets.iter().enumerate() {
        assert!((offset - index as f32 * FRAC_PI_2).abs() < 1e-5);
    }
}

#[test]
fn orbit_ring_is_evenly_spaced() {
    let mut rig = TestRig::new();
    arm_orbit_blades(&mut rig, 4);

    let mut system = WeaponSystem::new();
    let mut ctx = rig.context();
    run_system(&mut system, 0.016, &mut ctx);

    let offsets = orbit_offsets(&rig);
    for &(id, _) in &offsets {
        let position = rig.world.position(id).unwrap();
        assert!((position.length() - 80.0).abs() < 1e-3);
    }
    assert_quarter_turns(&offsets);
    assert!(offsets.iter().all(|(_, offset)| *offset < TAU));
}

#[test]
fn orbit_ring_follows_rotation_across_cycles() {
    let mut rig = TestRig::new();
    let player = rig.player();
    arm_orbit_blades(&mut rig, 4);
    let mut system = WeaponSystem::new();

    let mut rings = 0;
    let mut was_empty = true;
    let mut first_rotation = None;
    let mut turned = false;
    // 4 s cooldown against a 3 s lifetime: three rings in ten seconds.
    for _ in 0..600 {
        let mut ctx = rig.context();
        run_system(&mut system, 1.0 / 60.0, &mut ctx);

        let rotation = rig
            .world
            .component::<WeaponSlot>(player)
            .unwrap()
            .get("orbit_blade")
            .unwrap()
            .rotation();
        let offsets = orbit_offsets(&rig);
        if offsets.is_empty() {
            was_empty = true;
            continue;
        }
        if was_empty {
            rings += 1;
            was_empty = false;
        }
        assert_quarter_turns(&offsets);
        for &(id, offset) in &offsets {
            let expected = Vec2::from_angle(rotation + offset) * 80.0;
            let position = rig.world.position(id).unwrap();
            assert!(
                position.distance(expected) < 1e-3,
                "orbiter at {position} expected at {expected}"
            );
        }
        let first = *first_rotation.get_or_insert(rotation);
        turned |= (rotation - first).abs() > 1e-3;
    }

    assert!(rings >= 2, "saw {rings} rings");
    assert!(turned);
}

// =============================================================================
// Waves
// =============================================================================

fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.engine.max_delta = 0.5;
    config.spawn.wave_duration = 1.0;
    config.spawn.base_spawn_rate = 1000.0;
    config.spawn.min_spawn_rate = 1000.0;
    config
}

#[test]
fn wave_changes_once_per_boundary() {
    let mut sim = Simulation::new(quiet_config(), 5).unwrap();
    let log = wave_log(&mut sim);

    run_frames(&mut sim, 14, 0.25, &InputSnapshot::new());
    assert_eq!(*log.borrow(), vec![2, 3, 4]);
    assert_eq!(sim.wave(), 4);
    assert!((sim.spawner().wave_timer() - 0.5).abs() < 1e-5);
}

#[test]
fn locked_archetypes_are_never_drawn() {
    let config = GameConfig::default();
    let mut rng = rng(11);
    for _ in 0..500 {
        let id = SpawnManager::choose_enemy_type(&config, 3, &mut rng);
        assert!(config.enemies[id].unlock_wave <= 3, "drew locked `{id}`");
    }
}

// =============================================================================
// Progression
// =============================================================================

#[test]
fn collected_gem_levels_the_player() {
    let mut sim = Simulation::new(quiet_config(), 9).unwrap();
    let player = sim.player().unwrap();
    let levels = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&levels);
    sim.events_mut()
        .subscribe(EventKind::PlayerLeveledUp, move |event, _| {
            if let GameEvent::PlayerLeveledUp { level, .. } = event {
                sink.borrow_mut().push(*level);
            }
        });

    let gem = sim
        .spawn_drop(DropKind::Experience, Vec2::new(50.0, 0.0), 25.0)
        .unwrap();
    run_frames(&mut sim, 30, 1.0 / 60.0, &InputSnapshot::new());

    assert!(!sim.world().is_live(gem));
    assert!(sim.spawner().tracked_drops().is_empty());
    assert_eq!(*levels.borrow(), vec![2, 3]);
    assert_eq!(sim.world().component::<Stats>(player).unwrap().level, 3);
}
