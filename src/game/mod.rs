//! Game composition root.
//!
//! - `configure_full`: DefaultPlugins (window/render), tunables from disk,
//!   gameplay and render plugins.
//! - `configure_headless`: gameplay only, default tunables; used by
//!   integration tests.

use bevy::prelude::*;
use bevy::window::WindowResolution;

use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins;

#[cfg(target_os = "windows")]
use bevy::render::{
    RenderPlugin,
    settings::{Backends, PowerPreference, WgpuSettings},
};

pub fn run() {
    App::new().add_plugins(configure_full).run();
}

pub fn configure_full(app: &mut App) {
    let default_plugins = DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Riposte".into(),
            resolution: WindowResolution::new(1280, 720),
            ..default()
        }),
        ..default()
    });

    // Force DX12 and the high-performance adapter on Windows.
    #[cfg(target_os = "windows")]
    let default_plugins = default_plugins.set(RenderPlugin {
        render_creation: WgpuSettings {
            backends: Some(Backends::DX12),
            power_preference: PowerPreference::HighPerformance,
            ..default()
        }
        .into(),
        ..default()
    });

    app.add_plugins(default_plugins);
    app.insert_resource(Tunables::load_or_default(plugins::core::TUNABLES_PATH));

    configure_game(app);
    plugins::register_render(app);
}

/// No DefaultPlugins and no render-only plugins.
pub fn configure_headless(app: &mut App) {
    configure_game(app);
}

fn configure_game(app: &mut App) {
    app.init_state::<GameState>();
    plugins::register_gameplay(app);
}
