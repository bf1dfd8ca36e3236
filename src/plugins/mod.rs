//! Feature plugins.

use bevy::prelude::*;

use crate::plugins::threats::ThreatsPlugin;

pub mod combat;
pub mod core;
pub mod enemies;
pub mod parry;
pub mod physics;
pub mod player;
pub mod threats;
pub mod world;

// Render-only
pub mod camera;
pub mod fx;

/// Register gameplay plugins that work in headless tests.
///
/// `core` must come first: physics reads `Tunables` while building.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    world::plugin(app);
    combat::plugin(app);
    app.add_plugins(ThreatsPlugin);
    parry::plugin(app);
    player::plugin(app);
    enemies::plugin(app);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    camera::plugin(app);
    fx::plugin(app);
}
