//! Player plugin.
//!
//! Pipeline:
//! - Update: sample devices into the `PlayerInput` latch
//! - FixedUpdate: horizontal movement, `ParryPressed` for a latched parry
//! - FixedPostUpdate (`Behavior`): latched melee attack -> `SpawnThreatRequest`
//! - FixedPostUpdate (`Cleanup`): a dead player ends the run
//!
//! Presses are latched in `Update` and consumed by the next fixed tick, so a
//! short tap is never lost between fixed steps.

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;

use crate::common::faction::Faction;
use crate::common::layers::actor_layers;
use crate::common::state::GameState;
use crate::common::tunables::Tunables;
use crate::plugins::combat::{CombatSet, Facing, Health, LifeState, Vitals};
use crate::plugins::parry::{self, ParryPressed};
use crate::plugins::threats::SpawnThreatRequest;

#[derive(Component)]
pub struct Player;

/// Cooldown between player swings.
#[derive(Component, Debug, Default)]
pub struct AttackCooldown(Option<Timer>);

impl AttackCooldown {
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.0.is_none()
    }
}

#[derive(Resource, Default, Debug)]
pub struct PlayerInput {
    pub move_axis: f32,
    pub parry: bool,
    pub attack: bool,
}

pub fn plugin(app: &mut App) {
    app.insert_resource(PlayerInput::default())
        .add_systems(OnEnter(GameState::InGame), spawn)
        .add_systems(Update, gather_input.run_if(in_state(GameState::InGame)))
        .add_systems(Update, restart.run_if(in_state(GameState::GameOver)))
        .add_systems(
            FixedUpdate,
            (apply_movement, send_parry_input).run_if(in_state(GameState::InGame)),
        )
        .add_systems(FixedPostUpdate, player_attack.in_set(CombatSet::Behavior))
        .add_systems(FixedPostUpdate, check_player_death.in_set(CombatSet::Cleanup));
}

fn spawn(mut commands: Commands, tunables: Res<Tunables>) {
    let t = &tunables.player;

    commands.spawn((
        Name::new("Player"),
        Player,
        Faction::Player,
        Health::full(t.vitals.max_hp),
        Vitals::from_tunables(&t.vitals),
        Facing::Right,
        AttackCooldown::default(),
        parry::defender(&tunables),
        Sprite {
            color: Color::srgb(0.2, 0.75, 0.9),
            custom_size: Some(Vec2::splat(26.0)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 1.0),
        (
            RigidBody::Dynamic,
            LockedAxes::ROTATION_LOCKED,
            Collider::circle(13.0),
            actor_layers(Faction::Player),
            LinearVelocity::ZERO,
        ),
        DespawnOnExit(GameState::InGame),
    ));
}

fn gather_input(keys: Res<ButtonInput<KeyCode>>, mut input: ResMut<PlayerInput>) {
    let mut axis = 0.0;
    if keys.pressed(KeyCode::KeyA) {
        axis -= 1.0;
    }
    if keys.pressed(KeyCode::KeyD) {
        axis += 1.0;
    }
    input.move_axis = axis;

    // Latched until a fixed tick consumes them.
    input.parry |= keys.just_pressed(KeyCode::KeyC);
    input.attack |= keys.just_pressed(KeyCode::KeyZ);
}

fn apply_movement(
    tunables: Res<Tunables>,
    input: Res<PlayerInput>,
    mut q_player: Query<(&Vitals, &mut LinearVelocity, &mut Facing), With<Player>>,
) {
    let Ok((vitals, mut vel, mut facing)) = q_player.single_mut() else {
        return;
    };
    if vitals.is_knockbacked() {
        return;
    }
    if vitals.is_dead() {
        vel.0 = Vec2::ZERO;
        return;
    }

    vel.0 = Vec2::new(input.move_axis * tunables.player.speed, 0.0);
    if let Some(f) = Facing::from_x(input.move_axis) {
        *facing = f;
    }
}

fn send_parry_input(
    mut input: ResMut<PlayerInput>,
    mut pressed: MessageWriter<ParryPressed>,
    q_player: Query<Entity, With<Player>>,
) {
    if !std::mem::take(&mut input.parry) {
        return;
    }
    if let Ok(defender) = q_player.single() {
        pressed.write(ParryPressed { defender });
    }
}

fn player_attack(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut input: ResMut<PlayerInput>,
    mut spawn: MessageWriter<SpawnThreatRequest>,
    mut q_player: Query<(&Transform, &Facing, &Vitals, &mut AttackCooldown), With<Player>>,
) {
    let wants_attack = std::mem::take(&mut input.attack);
    let Ok((tf, facing, vitals, mut cooldown)) = q_player.single_mut() else {
        return;
    };

    if let Some(timer) = &mut cooldown.0 {
        timer.tick(time.delta());
        if timer.is_finished() {
            cooldown.0 = None;
        }
    }

    if !wants_attack || vitals.is_dead() || !cooldown.is_ready() {
        return;
    }

    let t = &tunables.player;
    let origin = tf.translation.truncate();
    let center = origin + Vec2::X * facing.sign() * t.attack_reach;
    spawn.write(SpawnThreatRequest::melee(
        Faction::Player,
        center,
        t.attack_radius,
        t.attack_damage,
        t.attack_knockback,
        t.attack_duration,
    )
    .from_source(origin));
    cooldown.0 = Some(Timer::from_seconds(t.attack_cooldown, TimerMode::Once));
    debug!("player attack at {center}");
}

fn check_player_death(
    q_player: Query<&Vitals, With<Player>>,
    mut next: ResMut<NextState<GameState>>,
) {
    let Ok(vitals) = q_player.single() else {
        return;
    };
    if matches!(vitals.life(), LifeState::Dead) {
        info!("player is dead, game over");
        next.set(GameState::GameOver);
    }
}

fn restart(keys: Res<ButtonInput<KeyCode>>, mut next: ResMut<NextState<GameState>>) {
    if keys.just_pressed(KeyCode::KeyR) {
        next.set(GameState::InGame);
    }
}
