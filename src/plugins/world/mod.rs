//! World plugin: the arena the fight takes place in.
//!
//! Actors move along the x axis at y = 0; the walls bound the arena and stop
//! projectiles, the floor tiles are decoration only.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::layers::world_layers;
use crate::common::state::GameState;

const TILE: i32 = 64;
const HALF_W: i32 = TILE * 14;
const HALF_H: i32 = TILE * 4;

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), (spawn_arena, spawn_floor));
}

fn spawn_arena(mut commands: Commands) {
    let wall_color = Color::srgb(0.25, 0.27, 0.33);
    let thickness = 30.0;
    let layers = world_layers();

    let mut spawn_wall = |name: &str, pos: Vec3, size: Vec2| {
        commands.spawn((
            Name::new(name.to_owned()),
            Sprite {
                color: wall_color,
                custom_size: Some(size),
                ..default()
            },
            Transform::from_translation(pos),
            RigidBody::Static,
            Collider::rectangle(size.x, size.y),
            layers,
            DespawnOnExit(GameState::InGame),
        ));
    };

    let (w, h) = (HALF_W as f32, HALF_H as f32);
    spawn_wall(
        "WallTop",
        Vec3::new(0.0, h + thickness * 0.5, 0.0),
        Vec2::new(w * 2.0 + thickness * 2.0, thickness),
    );
    spawn_wall(
        "WallBottom",
        Vec3::new(0.0, -h - thickness * 0.5, 0.0),
        Vec2::new(w * 2.0 + thickness * 2.0, thickness),
    );
    spawn_wall(
        "WallLeft",
        Vec3::new(-w - thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, h * 2.0),
    );
    spawn_wall(
        "WallRight",
        Vec3::new(w + thickness * 0.5, 0.0, 0.0),
        Vec2::new(thickness, h * 2.0),
    );
}

/// Checkerboard floor built from solid-colour sprites.
fn spawn_floor(mut commands: Commands) {
    (-(HALF_H / TILE)..=HALF_H / TILE)
        .flat_map(|y| (-(HALF_W / TILE)..=HALF_W / TILE).map(move |x| (x, y)))
        .for_each(|(x, y)| {
            let color = if (x + y) % 2 == 0 {
                Color::srgb(0.14, 0.14, 0.16)
            } else {
                Color::srgb(0.12, 0.12, 0.14)
            };

            commands.spawn((
                Sprite::from_color(color, Vec2::splat(TILE as f32)),
                Transform::from_xyz(x as f32 * TILE as f32, y as f32 * TILE as f32, 0.0),
                DespawnOnExit(GameState::InGame),
            ));
        });
}
