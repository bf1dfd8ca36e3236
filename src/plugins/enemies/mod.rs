//! Enemies plugin: melee and ranged enemies driven by an `EnemyBrain`.
//!
//! Each fixed tick (`CombatSet::Behavior`) every living enemy gets a
//! `Perception` of the nearest living player-side actor, the brain decides,
//! and the result is applied here: horizontal velocity (unless a knockback
//! is playing out), facing, and attacks as `SpawnThreatRequest`s.
//!
//! Enemies sharing an `EnemyGroup` alert each other: once one of them sees
//! the target, every member within `alert_radius` of it gives chase too.

pub mod brain;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::faction::Faction;
use crate::common::layers::actor_layers;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::combat::components::DespawnOnDeath;
use crate::plugins::combat::{CombatSet, Facing, Health, Vitals};
use crate::plugins::threats::SpawnThreatRequest;

pub use brain::{AttackProfile, BehaviorState, BrainOutput, EnemyBrain, Perception};

#[derive(Component, Debug, Clone, Copy)]
pub struct Enemy;

/// Enemies with the same id share sightings.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnemyGroup(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyKind {
    Melee,
    Ranged,
}

pub fn plugin(app: &mut App) {
    app.add_systems(OnEnter(GameState::InGame), spawn_enemies)
        .add_systems(FixedPostUpdate, drive_enemies.in_set(CombatSet::Behavior));
}

/// Everything a freshly spawned enemy carries.
pub fn enemy_bundle(
    tunables: &Tunables,
    kind: EnemyKind,
    position: Vec2,
    waypoints: Vec<Vec2>,
    group: EnemyGroup,
) -> impl Bundle {
    let t = &tunables.enemy;
    let (profile, color) = match kind {
        EnemyKind::Melee => (AttackProfile::Melee(t.melee.clone()), Color::srgb(0.9, 0.25, 0.25)),
        EnemyKind::Ranged => (AttackProfile::Ranged(t.ranged.clone()), Color::srgb(0.95, 0.6, 0.2)),
    };

    (
        Name::new(format!("{kind:?}Enemy")),
        Enemy,
        Faction::Enemy,
        group,
        Health::full(t.vitals.max_hp),
        Vitals::from_tunables(&t.vitals),
        Facing::Right,
        DespawnOnDeath,
        EnemyBrain::new(profile, waypoints),
        Sprite {
            color,
            custom_size: Some(Vec2::splat(32.0)),
            ..default()
        },
        Transform::from_translation(position.extend(1.0)),
        (
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            Collider::circle(16.0),
            actor_layers(Faction::Enemy),
            LinearVelocity::ZERO,
        ),
        DespawnOnExit(GameState::InGame),
    )
}

fn spawn_enemies(mut commands: Commands, tunables: Res<Tunables>) {
    let layout = [
        (EnemyKind::Melee, -320.0, -440.0, -200.0, 0),
        (EnemyKind::Melee, 280.0, 200.0, 360.0, 1),
        (EnemyKind::Ranged, 520.0, 460.0, 600.0, 1),
        (EnemyKind::Ranged, -620.0, -700.0, -540.0, 0),
    ];

    for (kind, x, left, right, group) in layout {
        let waypoints = vec![Vec2::new(left, 0.0), Vec2::new(right, 0.0)];
        commands.spawn(enemy_bundle(
            &tunables,
            kind,
            Vec2::new(x, 0.0),
            waypoints,
            EnemyGroup(group),
        ));
    }
}

pub fn drive_enemies(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut spawn: MessageWriter<SpawnThreatRequest>,
    q_targets: Query<(&Transform, &Faction, &Vitals), Without<Enemy>>,
    mut q_enemies: Query<
        (
            Entity,
            &Transform,
            &Vitals,
            &EnemyGroup,
            &mut EnemyBrain,
            &mut LinearVelocity,
            &mut Facing,
        ),
        With<Enemy>,
    >,
) {
    let dt = time.delta();
    let t = &tunables.enemy;

    let targets: Vec<Vec2> = q_targets
        .iter()
        .filter(|(_, faction, vitals)| **faction == Faction::Player && !vitals.is_dead())
        .map(|(tf, ..)| tf.translation.truncate())
        .collect();
    let nearest_target = |from: Vec2| {
        targets
            .iter()
            .copied()
            .min_by(|a, b| a.distance_squared(from).total_cmp(&b.distance_squared(from)))
    };

    let spotters: Vec<(EnemyGroup, Vec2)> = q_enemies
        .iter()
        .filter(|(_, _, vitals, ..)| !vitals.is_dead())
        .filter_map(|(_, tf, _, group, ..)| {
            let pos = tf.translation.truncate();
            let target = nearest_target(pos)?;
            (target.distance(pos) <= t.vision_range).then_some((*group, pos))
        })
        .collect();

    for (e, tf, vitals, group, mut brain, mut vel, mut facing) in &mut q_enemies {
        if vitals.is_dead() {
            continue;
        }
        let position = tf.translation.truncate();
        let perception = Perception {
            position,
            target: nearest_target(position),
            alerted: spotters
                .iter()
                .any(|(g, p)| g == group && p.distance(position) <= t.alert_radius),
        };

        let out = brain.think(dt, &perception, t);

        if let Some(state) = out.entered {
            debug!("enemy {e:?} -> {state:?}");
        }
        if let Some(vx) = out.velocity_x.filter(|_| !vitals.is_knockbacked()) {
            vel.0 = Vec2::new(vx, 0.0);
        }
        if let Some(f) = out.facing {
            *facing = f;
        }
        if let Some(req) = out.attack {
            spawn.write(req);
        }
    }
}

#[cfg(test)]
mod tests;
