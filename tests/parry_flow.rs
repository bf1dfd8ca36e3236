mod common;

use bevy::prelude::*;
use riposte::common::faction::Faction;
use riposte::common::state::GameState;
use riposte::common::tunables::Tunables;
use riposte::plugins::combat::{DamageRequest, Health, Hit};
use riposte::plugins::enemies::{EnemyGroup, EnemyKind, enemy_bundle};
use riposte::plugins::parry::{ParryFeedback, ThreatTracker};
use riposte::plugins::player::PlayerInput;
use riposte::plugins::threats::{SpawnThreatRequest, Threat, ThreatPool, ThreatState};

/// A level with the player at the origin and a single idle melee enemy
/// outside its vision range.
fn duel() -> (App, Entity, Entity) {
    let mut app = common::app_in_game();
    common::clear_enemies(&mut app);

    let tunables = app.world().resource::<Tunables>().clone();
    let enemy = app
        .world_mut()
        .spawn(enemy_bundle(
            &tunables,
            EnemyKind::Melee,
            Vec2::new(-300.0, 0.0),
            Vec::new(),
            EnemyGroup(7),
        ))
        .id();
    app.update();

    let player = common::player(&mut app);
    (app, player, enemy)
}

fn launch(app: &mut App, x: f32) {
    app.world_mut().write_message(SpawnThreatRequest::projectile(
        Faction::Enemy,
        Vec2::new(x, 0.0),
        Vec2::ZERO,
        1,
        100.0,
        5.0,
    ));
}

fn tick_until(app: &mut App, max: usize, mut done: impl FnMut(&mut App) -> bool) -> bool {
    for _ in 0..max {
        app.update();
        if done(app) {
            return true;
        }
    }
    false
}

fn hp(app: &App, e: Entity) -> i32 {
    app.world().get::<Health>(e).unwrap().hp
}

fn live_threats(app: &mut App) -> Vec<Threat> {
    app.world_mut()
        .query::<(&Threat, &ThreatState)>()
        .iter(app.world())
        .filter(|(_, s)| **s == ThreatState::Live)
        .map(|(t, _)| t.clone())
        .collect()
}

#[test]
fn timed_parry_sends_the_threat_back_into_its_owner() {
    let (mut app, player, enemy) = duel();
    let mut feedback = common::Collector::<ParryFeedback>::new(&app);
    let player_hp = hp(&app, player);
    let enemy_hp = hp(&app, enemy);

    launch(&mut app, 40.0);
    assert!(tick_until(&mut app, 10, |app| {
        !app.world().get::<ThreatTracker>(player).unwrap().is_empty()
    }));

    app.world_mut().resource_mut::<PlayerInput>().parry = true;
    let mut seen = Vec::new();
    assert!(tick_until(&mut app, 30, |app| {
        seen.extend(feedback.read(app));
        seen.iter().any(|f| matches!(f, ParryFeedback::Success { .. }))
    }));
    assert!(!seen.iter().any(|f| matches!(f, ParryFeedback::Failed { .. })));

    let threats = live_threats(&mut app);
    assert_eq!(threats.len(), 1);
    assert_eq!(threats[0].owner, Faction::Player);
    assert!(threats[0].reflected);

    assert!(tick_until(&mut app, 120, |app| hp(app, enemy) < enemy_hp));
    assert_eq!(hp(&app, player), player_hp);
}

#[test]
fn whiffed_parry_lets_the_claimed_threat_land() {
    let (mut app, player, _) = duel();
    let mut feedback = common::Collector::<ParryFeedback>::new(&app);
    let player_hp = hp(&app, player);

    // Inside the detection zone, outside the hit zone.
    launch(&mut app, 100.0);
    assert!(tick_until(&mut app, 10, |app| {
        !app.world().get::<ThreatTracker>(player).unwrap().is_empty()
    }));

    app.world_mut().resource_mut::<PlayerInput>().parry = true;
    let mut seen = Vec::new();
    assert!(tick_until(&mut app, 60, |app| {
        seen.extend(feedback.read(app));
        seen.iter().any(|f| matches!(f, ParryFeedback::Failed { .. }))
    }));
    assert!(seen.iter().any(|f| matches!(f, ParryFeedback::Active { .. })));
    assert!(!seen.iter().any(|f| matches!(f, ParryFeedback::Success { .. })));

    app.update();
    assert_eq!(hp(&app, player), player_hp - 1);
    assert!(live_threats(&mut app).is_empty());
}

#[test]
fn player_death_ends_the_run_and_recalls_threats() {
    let (mut app, player, _) = duel();
    launch(&mut app, 200.0);
    app.update();

    app.world_mut().write_message(DamageRequest {
        target: player,
        hit: Hit { amount: 99, source: Vec2::new(50.0, 0.0), knockback: 0.0 },
    });

    assert!(tick_until(&mut app, 400, |app| {
        *app.world().resource::<State<GameState>>().get() == GameState::GameOver
    }));
    app.update();

    assert!(app.world().get_entity(player).is_err());
    assert!(live_threats(&mut app).is_empty());
    let pool = app.world().resource::<ThreatPool>();
    assert_eq!(pool.available(), pool.capacity());
}
