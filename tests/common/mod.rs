//! Integration test harness.
//!
//! Headless: `MinimalPlugins` plus the few engine plugins gameplay needs, then
//! `riposte::game::configure_headless`. Every `app.update()` advances time by
//! exactly one fixed step, so one update is one combat tick.

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::ecs::message::{Message, MessageCursor, Messages};
use bevy::input::InputPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use bevy::transform::TransformPlugin;

use riposte::plugins::enemies::Enemy;
use riposte::plugins::player::Player;

/// Bevy's default fixed timestep (64 Hz).
pub const STEP: Duration = Duration::from_micros(15_625);

pub fn app_headless() -> App {
    let mut app = App::new();

    // AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        InputPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(STEP));

    riposte::game::configure_headless(&mut app);
    if !app.is_plugin_added::<TransformPlugin>() {
        app.add_plugins(TransformPlugin);
    }
    // `App::run` normally does this; plugins register resources in `finish`.
    app.finish();
    app.cleanup();
    app
}

/// Boot into `InGame` and let the startup work settle.
pub fn app_in_game() -> App {
    let mut app = app_headless();
    for _ in 0..3 {
        app.update();
    }
    app
}

pub fn player(app: &mut App) -> Entity {
    app.world_mut()
        .query_filtered::<Entity, With<Player>>()
        .single(app.world())
        .expect("exactly one player")
}

/// Remove the default enemy layout so a test can place its own.
pub fn clear_enemies(app: &mut App) {
    let enemies: Vec<Entity> = app
        .world_mut()
        .query_filtered::<Entity, With<Enemy>>()
        .iter(app.world())
        .collect();
    for e in enemies {
        app.world_mut().despawn(e);
    }
}

/// Reads every message of type `M` written since the previous call.
pub struct Collector<M: Message> {
    cursor: MessageCursor<M>,
}

impl<M: Message + Clone> Collector<M> {
    pub fn new(app: &App) -> Self {
        Self { cursor: app.world().resource::<Messages<M>>().get_cursor() }
    }

    pub fn read(&mut self, app: &App) -> Vec<M> {
        let messages = app.world().resource::<Messages<M>>();
        self.cursor.read(messages).cloned().collect()
    }
}
