//! Core plugin: shared resources and global settings.
//!
//! `Tunables` may be inserted before this plugin runs (the full app loads
//! them from disk); otherwise the built-in defaults are used.

use crate::common::tunables::Tunables;
use bevy::prelude::*;

pub const TUNABLES_PATH: &str = "assets/tunables.ron";

pub fn plugin(app: &mut App) {
    if !app.world().contains_resource::<Tunables>() {
        app.insert_resource(Tunables::default());
    }
    app.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.07)));
}
