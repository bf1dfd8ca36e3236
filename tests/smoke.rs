mod common;

use bevy::prelude::*;
use riposte::common::state::GameState;
use riposte::common::tunables::Tunables;
use riposte::plugins::enemies::Enemy;
use riposte::plugins::parry::{ParryMachine, ParryState};
use riposte::plugins::threats::ThreatPool;

#[test]
fn boots_and_ticks() {
    let mut app = common::app_headless();
    for _ in 0..10 {
        app.update();
    }
    assert_eq!(*app.world().resource::<State<GameState>>().get(), GameState::InGame);
}

#[test]
fn level_is_populated_on_enter() {
    let mut app = common::app_in_game();

    let player = common::player(&mut app);
    assert_eq!(app.world().get::<ParryMachine>(player).unwrap().state(), ParryState::Ready);

    let enemies = app
        .world_mut()
        .query_filtered::<Entity, With<Enemy>>()
        .iter(app.world())
        .count();
    assert!(enemies >= 2);

    let capacity = app.world().resource::<Tunables>().threat_pool_capacity;
    assert_eq!(app.world().resource::<ThreatPool>().capacity(), capacity);
}
