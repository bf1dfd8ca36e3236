use std::time::Duration;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::faction::Faction;
use crate::common::test_utils::{
    TestRng, combat_world, drain_messages, ensure_messages, run_system_once,
};
use crate::common::tunables::{EnemyTunables, Tunables};
use crate::plugins::combat::{Facing, Health, Vitals};
use crate::plugins::threats::{SpawnThreatRequest, ThreatKind};

use super::*;

fn secs(s: f32) -> Duration {
    Duration::from_secs_f32(s)
}

fn melee_brain(waypoints: Vec<Vec2>) -> EnemyBrain {
    EnemyBrain::new(AttackProfile::Melee(EnemyTunables::default().melee), waypoints)
}

fn ranged_brain() -> EnemyBrain {
    EnemyBrain::new(AttackProfile::Ranged(EnemyTunables::default().ranged), Vec::new())
}

fn sees(position: Vec2, target: Vec2) -> Perception {
    Perception { position, target: Some(target), alerted: false }
}

// -----------------------------------------------------------------------------
// Brain
// -----------------------------------------------------------------------------

#[test]
fn patrol_walks_between_waypoints() {
    let t = EnemyTunables::default();
    let mut brain = melee_brain(vec![Vec2::new(-100.0, 0.0), Vec2::new(100.0, 0.0)]);
    let alone = |x: f32| Perception { position: Vec2::new(x, 0.0), ..default() };

    let out = brain.think(secs(0.1), &alone(0.0), &t);
    assert_eq!(out.velocity_x, Some(-t.patrol_speed));
    assert_eq!(out.facing, Some(Facing::Left));

    // Within reach: switch to the next waypoint.
    let out = brain.think(secs(0.1), &alone(-95.0), &t);
    assert_eq!(out.velocity_x, Some(0.0));
    assert_eq!(brain.next_waypoint(), Some(Vec2::new(100.0, 0.0)));

    let out = brain.think(secs(0.1), &alone(-95.0), &t);
    assert_eq!(out.velocity_x, Some(t.patrol_speed));
    assert_eq!(out.facing, Some(Facing::Right));

    brain.think(secs(0.1), &alone(95.0), &t);
    assert_eq!(brain.next_waypoint(), Some(Vec2::new(-100.0, 0.0)));
    assert_eq!(brain.state(), BehaviorState::Patrol);
}

#[test]
fn patrol_without_waypoints_stands_still() {
    let t = EnemyTunables::default();
    let mut brain = melee_brain(Vec::new());
    let out = brain.think(secs(0.1), &Perception::default(), &t);
    assert_eq!(out.velocity_x, Some(0.0));
    assert_eq!(brain.state(), BehaviorState::Patrol);
}

#[test]
fn seeing_the_target_starts_a_chase() {
    let t = EnemyTunables::default();
    let mut brain = melee_brain(Vec::new());

    let out = brain.think(secs(0.1), &sees(Vec2::ZERO, Vec2::new(200.0, 0.0)), &t);

    assert_eq!(out.entered, Some(BehaviorState::Chase));
    assert_eq!(out.velocity_x, Some(t.chase_speed));
    assert_eq!(out.facing, Some(Facing::Right));
}

#[test]
fn target_beyond_vision_is_ignored_unless_alerted() {
    let t = EnemyTunables::default();
    let far = Vec2::new(t.vision_range + 40.0, 0.0);

    let mut brain = melee_brain(Vec::new());
    brain.think(secs(0.1), &sees(Vec2::ZERO, far), &t);
    assert_eq!(brain.state(), BehaviorState::Patrol);

    let mut brain = melee_brain(Vec::new());
    let alerted = Perception { position: Vec2::ZERO, target: Some(far), alerted: true };
    brain.think(secs(0.1), &alerted, &t);
    assert_eq!(brain.state(), BehaviorState::Chase);
}

#[test]
fn melee_swings_in_range_then_waits_for_the_cooldown() {
    let t = EnemyTunables::default();
    let mut brain = melee_brain(Vec::new());
    let near = sees(Vec2::ZERO, Vec2::new(55.0, 0.0));

    // Spotting and swinging never happen on the same tick.
    let out = brain.think(secs(0.25), &near, &t);
    assert_eq!(out.entered, Some(BehaviorState::Chase));
    assert!(out.attack.is_none());

    let out = brain.think(secs(0.25), &near, &t);
    assert_eq!(out.entered, Some(BehaviorState::Attack));
    let req = out.attack.expect("swing");
    assert_eq!(req.kind, ThreatKind::Melee);
    assert_eq!(req.owner, Faction::Enemy);
    assert_eq!(req.pos, Vec2::new(t.melee.range, 0.0));
    assert_eq!(req.lifetime, t.melee.duration);
    assert_eq!(brain.state(), BehaviorState::Attack);
    assert_eq!(out.velocity_x, Some(0.0));

    // The swing lasts `duration`, then back to Chase.
    brain.think(secs(0.25), &near, &t);
    assert_eq!(brain.state(), BehaviorState::Attack);
    let out = brain.think(secs(0.25), &near, &t);
    assert_eq!(out.entered, Some(BehaviorState::Chase));
    assert!(!brain.is_acting());

    // Still cooling down.
    let out = brain.think(secs(0.25), &near, &t);
    assert!(out.attack.is_none());
    assert!(brain.on_cooldown());
}

#[test]
fn melee_stops_at_stopping_distance() {
    let t = EnemyTunables::default();
    let mut brain = melee_brain(Vec::new());
    // Start a swing so the cooldown blocks the next one.
    brain.think(secs(0.1), &sees(Vec2::ZERO, Vec2::new(55.0, 0.0)), &t);
    for _ in 0..10 {
        brain.think(secs(0.1), &sees(Vec2::ZERO, Vec2::new(55.0, 0.0)), &t);
    }
    assert_eq!(brain.state(), BehaviorState::Chase);

    let inside = Vec2::new(t.stopping_distance - 5.0, 0.0);
    let out = brain.think(secs(0.1), &sees(Vec2::ZERO, inside), &t);
    assert_eq!(out.velocity_x, Some(0.0));

    let outside = Vec2::new(t.stopping_distance + 5.0, 0.0);
    let out = brain.think(secs(0.1), &sees(Vec2::ZERO, outside), &t);
    assert_eq!(out.velocity_x, Some(t.chase_speed));
}

#[test]
fn ranged_keeps_its_distance() {
    let t = EnemyTunables::default();

    let mut brain = ranged_brain();
    let out = brain.think(secs(0.1), &sees(Vec2::ZERO, Vec2::new(50.0, 0.0)), &t);
    assert_eq!(out.velocity_x, Some(-t.chase_speed));
    assert_eq!(out.facing, Some(Facing::Right));
    assert!(out.attack.is_none());

    let mut brain = ranged_brain();
    let far = Perception {
        position: Vec2::ZERO,
        target: Some(Vec2::new(-300.0, 0.0)),
        alerted: true,
    };
    let out = brain.think(secs(0.1), &far, &t);
    assert_eq!(out.velocity_x, Some(-t.chase_speed));
    assert_eq!(out.facing, Some(Facing::Left));
}

#[test]
fn ranged_winds_up_before_firing_at_the_target() {
    let t = EnemyTunables::default();
    let mut brain = ranged_brain();
    let target = sees(Vec2::ZERO, Vec2::new(150.0, 0.0));

    brain.think(secs(0.1), &target, &t);
    assert_eq!(brain.state(), BehaviorState::Chase);
    let out = brain.think(secs(0.1), &target, &t);
    assert!(out.attack.is_none());
    assert_eq!(brain.state(), BehaviorState::Attack);
    assert!(brain.is_acting());

    let out = brain.think(secs(0.5), &target, &t);
    assert!(out.attack.is_none());

    let out = brain.think(secs(0.5), &target, &t);
    let req = out.attack.expect("shot");
    assert_eq!(req.kind, ThreatKind::Projectile);
    assert_eq!(req.owner, Faction::Enemy);
    assert!((req.vel - Vec2::new(t.ranged.speed, 0.0)).length() < 1e-3);
    assert!(req.pos.x > 0.0);
    assert_eq!(out.entered, Some(BehaviorState::Chase));
}

#[test]
fn losing_the_target_returns_to_patrol() {
    let t = EnemyTunables::default();
    let mut brain = melee_brain(vec![Vec2::new(-100.0, 0.0)]);
    brain.think(secs(0.5), &sees(Vec2::ZERO, Vec2::new(200.0, 0.0)), &t);
    assert_eq!(brain.state(), BehaviorState::Chase);

    let gone = Perception { position: Vec2::ZERO, ..default() };
    for _ in 0..3 {
        let out = brain.think(secs(0.5), &gone, &t);
        assert!(out.entered.is_none());
    }
    let out = brain.think(secs(0.5), &gone, &t);
    assert_eq!(out.entered, Some(BehaviorState::Patrol));
    assert_eq!(out.velocity_x, Some(-t.patrol_speed));
}

#[test]
fn losing_the_target_mid_wind_up_cancels_the_shot() {
    let t = EnemyTunables::default();
    let mut brain = ranged_brain();
    for _ in 0..2 {
        brain.think(secs(0.1), &sees(Vec2::ZERO, Vec2::new(150.0, 0.0)), &t);
    }
    assert!(brain.is_acting());

    let gone = Perception { position: Vec2::ZERO, ..default() };
    let out = brain.think(secs(t.lost_player_time), &gone, &t);
    assert_eq!(out.entered, Some(BehaviorState::Patrol));
    assert!(out.attack.is_none());
    assert!(!brain.is_acting());
}

#[test]
fn random_perception_keeps_transitions_legal_and_attacks_spaced() {
    let t = EnemyTunables::default();
    let mut rng = TestRng::new(0x5EED_0F_B4A1);

    for case in 0..200 {
        let mut brain = if case % 2 == 0 {
            melee_brain(vec![Vec2::new(-150.0, 0.0), Vec2::new(150.0, 0.0)])
        } else {
            ranged_brain()
        };
        let cooldown = match brain.profile() {
            AttackProfile::Melee(m) => m.cooldown,
            AttackProfile::Ranged(r) => r.cooldown,
        };

        let mut now = 0.0;
        let mut last_attack: Option<f32> = None;
        for _ in 0..300 {
            let dt = rng.range_f32(0.01, 0.1);
            now += dt;
            let p = Perception {
                position: Vec2::new(rng.range_f32(-300.0, 300.0), 0.0),
                target: rng
                    .chance(0.8)
                    .then(|| Vec2::new(rng.range_f32(-400.0, 400.0), 0.0)),
                alerted: rng.chance(0.1),
            };

            let before = brain.state();
            let out = brain.think(secs(dt), &p, &t);
            let after = brain.state();

            let legal = before == after
                || matches!(
                (before, after),
                (BehaviorState::Patrol, BehaviorState::Chase)
                    | (BehaviorState::Chase, BehaviorState::Attack)
                    | (BehaviorState::Chase, BehaviorState::Patrol)
                    | (BehaviorState::Attack, BehaviorState::Chase)
                    | (BehaviorState::Attack, BehaviorState::Patrol)
            );
            assert!(legal, "{before:?} -> {after:?}");
            assert_eq!(out.entered.is_some(), before != after);

            if out.attack.is_some() {
                if let Some(prev) = last_attack {
                    assert!(now - prev >= cooldown - 0.2, "attacks {prev} and {now}");
                }
                last_attack = Some(now);
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Systems
// -----------------------------------------------------------------------------

fn enemy_world() -> World {
    let mut world = combat_world(0.05);
    ensure_messages::<SpawnThreatRequest>(&mut world);
    world
}

fn spawn_player(world: &mut World, x: f32) -> Entity {
    world
        .spawn((
            Faction::Player,
            Health::full(5),
            Vitals::new(1.5, 0.3, 2.0),
            Transform::from_xyz(x, 0.0, 1.0),
        ))
        .id()
}

fn spawn_enemy(world: &mut World, kind: EnemyKind, x: f32, group: u32) -> Entity {
    let tunables = world.resource::<Tunables>().clone();
    world
        .spawn(enemy_bundle(&tunables, kind, Vec2::new(x, 0.0), Vec::new(), EnemyGroup(group)))
        .id()
}

fn state_of(world: &World, e: Entity) -> BehaviorState {
    world.get::<EnemyBrain>(e).unwrap().state()
}

#[test]
fn spawn_enemies_creates_both_kinds() {
    let mut world = enemy_world();
    run_system_once(&mut world, spawn_enemies);

    let brains: Vec<AttackProfile> = world
        .query_filtered::<&EnemyBrain, With<Enemy>>()
        .iter(&world)
        .map(|b| b.profile().clone())
        .collect();
    assert!(brains.iter().any(|p| matches!(p, AttackProfile::Melee(_))));
    assert!(brains.iter().any(|p| matches!(p, AttackProfile::Ranged(_))));
}

#[test]
fn group_members_share_sightings() {
    let mut world = enemy_world();
    spawn_player(&mut world, 0.0);
    let spotter = spawn_enemy(&mut world, EnemyKind::Melee, 200.0, 1);
    let mate = spawn_enemy(&mut world, EnemyKind::Melee, 500.0, 1);
    let stranger = spawn_enemy(&mut world, EnemyKind::Melee, -560.0, 2);

    run_system_once(&mut world, drive_enemies);

    assert_eq!(state_of(&world, spotter), BehaviorState::Chase);
    assert_eq!(state_of(&world, mate), BehaviorState::Chase);
    assert_eq!(state_of(&world, stranger), BehaviorState::Patrol);
    assert_eq!(world.get::<Facing>(mate).unwrap(), &Facing::Left);
}

#[test]
fn melee_enemy_in_range_requests_a_hitbox() {
    let mut world = enemy_world();
    spawn_player(&mut world, 0.0);
    spawn_enemy(&mut world, EnemyKind::Melee, -50.0, 0);

    run_system_once(&mut world, drive_enemies);
    run_system_once(&mut world, drive_enemies);

    let reqs = drain_messages::<SpawnThreatRequest>(&mut world);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].owner, Faction::Enemy);
    assert!(reqs[0].pos.x > -50.0);
}

#[test]
fn dead_players_are_not_targets() {
    let mut world = enemy_world();
    let player = spawn_player(&mut world, 0.0);
    assert!(world.get_mut::<Vitals>(player).unwrap().kill());
    let enemy = spawn_enemy(&mut world, EnemyKind::Melee, -50.0, 0);

    run_system_once(&mut world, drive_enemies);

    assert_eq!(state_of(&world, enemy), BehaviorState::Patrol);
    assert!(drain_messages::<SpawnThreatRequest>(&mut world).is_empty());
}

#[test]
fn dead_enemies_do_nothing() {
    let mut world = enemy_world();
    spawn_player(&mut world, 0.0);
    let enemy = spawn_enemy(&mut world, EnemyKind::Melee, -50.0, 0);
    assert!(world.get_mut::<Vitals>(enemy).unwrap().kill());

    run_system_once(&mut world, drive_enemies);

    assert_eq!(state_of(&world, enemy), BehaviorState::Patrol);
    assert!(drain_messages::<SpawnThreatRequest>(&mut world).is_empty());
}

#[test]
fn knockback_velocity_is_left_alone() {
    let mut world = enemy_world();
    spawn_player(&mut world, 0.0);
    let enemy = spawn_enemy(&mut world, EnemyKind::Melee, -200.0, 0);
    world.get_mut::<Vitals>(enemy).unwrap().start_knockback();
    world.get_mut::<LinearVelocity>(enemy).unwrap().0 = Vec2::new(-300.0, 40.0);

    run_system_once(&mut world, drive_enemies);

    assert_eq!(state_of(&world, enemy), BehaviorState::Chase);
    assert_eq!(world.get::<LinearVelocity>(enemy).unwrap().0, Vec2::new(-300.0, 40.0));
}
