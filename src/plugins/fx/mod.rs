//! Feedback effects: screen shake, flash overlay, hitstop/slowmo and the
//! parry ring drawn around each defender.
//!
//! Render-only. Everything here reads `ParryFeedback` / `ActorDied` and the
//! actors' `Vitals`; nothing writes gameplay state.
//!
//! Global effects are intents stored in `GlobalFx` and applied by a single
//! system (`apply_global_fx`), which is the only writer of camera shake,
//! overlay alpha and virtual time speed.
//!
//! Hitstop/slowmo change the speed of virtual time. Their timers tick on real
//! time so they keep progressing while virtual time is frozen.

use std::f32::consts::TAU;

use bevy::prelude::*;
use bevy::state::state_scoped::DespawnOnExit;
use bevy::time::{Real, Virtual};

use crate::common::faction::Faction;
use crate::common::state::GameState;
use crate::plugins::camera::MainCamera;
use crate::plugins::combat::{ActorDied, LifeState, Vitals};
use crate::plugins::parry::{ParryFeedback, ParryMachine};

/// A non-negative level that drains towards zero on its own. Used both for
/// intensities in `[0, 1]` and for remaining wall-clock seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Drain(f32);

impl Drain {
    fn unit(v: f32) -> Self {
        Self(v.clamp(0.0, 1.0))
    }

    fn secs(v: f32) -> Self {
        Self(v.max(0.0))
    }

    #[inline]
    fn value(self) -> f32 {
        self.0
    }

    #[inline]
    fn is_active(self) -> bool {
        self.0 > 0.0
    }

    /// Add `dv`, never going past `cap`.
    fn bump(&mut self, dv: f32, cap: f32) {
        self.0 = (self.0 + dv).clamp(0.0, cap);
    }

    fn at_least(&mut self, v: f32) {
        self.0 = self.0.max(v.max(0.0));
    }

    fn drain(&mut self, amount: f32) {
        self.0 = (self.0 - amount).max(0.0);
    }
}

const WARNING_COLOR: Srgba = Srgba::new(1.0, 0.92, 0.016, 1.0);
const ACTIVE_COLOR: Srgba = Srgba::GREEN;
const SUCCESS_COLOR: Srgba = Srgba::new(0.0, 1.0, 1.0, 1.0);
const PERFECT_COLOR: Srgba = Srgba::new(1.0, 0.0, 1.0, 1.0);
const FAILED_COLOR: Srgba = Srgba::RED;

const SHAKE_AMPLITUDE: f32 = 42.0;
const OVERLAY_Z: f32 = 10_000.0;

/// Marker for the fullscreen flash overlay entity.
#[derive(Component, Debug, Clone, Copy)]
struct FlashOverlay;

/// Camera and overlay entities, found once. `applied_shake` is the offset
/// currently added to the camera; it is removed before the next one is applied.
#[derive(Resource, Debug, Default, Clone, Copy)]
struct FxTargets {
    camera: Option<Entity>,
    overlay: Option<Entity>,
    applied_shake: Vec2,
}

/// Screen-wide effect intents. Triggers only raise levels; `apply_global_fx`
/// drains them.
#[derive(Resource, Debug)]
pub struct GlobalFx {
    trauma: Drain,
    shake_clock: f32,
    flash: Drain,
    flash_color: Srgba,
    hitstop: Drain,
    slowmo: Option<Slowmo>,
}

#[derive(Debug, Clone, Copy)]
struct Slowmo {
    remaining: Drain,
    length: f32,
    floor: f32,
}

impl Default for GlobalFx {
    fn default() -> Self {
        Self {
            trauma: Drain::default(),
            shake_clock: 0.0,
            flash: Drain::default(),
            flash_color: Srgba::WHITE,
            hitstop: Drain::default(),
            slowmo: None,
        }
    }
}

impl GlobalFx {
    fn shake(&mut self, amount: f32) {
        self.trauma.bump(amount, 1.0);
    }

    fn flash(&mut self, color: Srgba, intensity: f32) {
        self.flash_color = color;
        self.flash.at_least(intensity.min(1.0));
    }

    fn slow_down(&mut self, length: f32, floor: f32) {
        let remaining = self.slowmo.map_or(0.0, |s| s.remaining.value()).max(length);
        self.slowmo = Some(Slowmo { remaining: Drain::secs(remaining), length, floor });
    }

    fn is_slowed(&self) -> bool {
        self.slowmo.is_some_and(|s| s.remaining.is_active())
    }

    pub fn trigger_parry_success(&mut self) {
        self.shake(0.35);
        self.hitstop.at_least(0.04);
    }

    /// White flash, hard shake, hitstop and a slow-motion tail.
    pub fn trigger_perfect_parry(&mut self) {
        self.shake(0.8);
        self.flash(Srgba::WHITE, 0.8);
        self.hitstop.at_least(0.09);
        self.slow_down(0.6, 0.3);
    }

    pub fn trigger_parry_failed(&mut self) {
        self.shake(0.25);
        self.flash(FAILED_COLOR, 0.5);
    }

    pub fn trigger_player_death(&mut self) {
        self.shake(0.6);
        self.flash(FAILED_COLOR, 1.0);
        self.slow_down(1.0, 0.22);
    }

    /// Virtual time speed for this frame. Hitstop wins over slow motion,
    /// which eases back to full speed over its length.
    fn time_scale(&mut self, dt: f32) -> f32 {
        if self.hitstop.is_active() {
            self.hitstop.drain(dt);
            return 0.0;
        }
        let Some(slowmo) = self.slowmo.as_mut() else {
            return 1.0;
        };
        slowmo.remaining.drain(dt);
        if !slowmo.remaining.is_active() {
            self.slowmo = None;
            return 1.0;
        }
        let progress = 1.0 - (slowmo.remaining.value() / slowmo.length.max(1e-4)).min(1.0);
        let floor = slowmo.floor.clamp(0.0, 1.0);
        floor + (1.0 - floor) * smootherstep(progress)
    }
}

/// Camera offset for a given trauma level. Amplitude grows with trauma
/// squared; the wobble is a fixed sum of sines so it is reproducible.
fn shake_offset(clock: f32, trauma: f32) -> Vec2 {
    if trauma <= 0.0 {
        return Vec2::ZERO;
    }
    let w = clock * TAU;
    let wobble = Vec2::new(
        (w * 37.0).sin() + 0.5 * (w * 61.0).sin(),
        (w * 41.0).cos() + 0.5 * (w * 53.0).cos(),
    );
    wobble.clamp_length_max(1.0) * SHAKE_AMPLITUDE * trauma * trauma
}

/// Circle-ish sprite that follows a defender and shows its parry state.
#[derive(Component, Debug, Clone)]
pub struct ParryRing {
    defender: Entity,
    color: Srgba,
    alpha: Drain,
    /// While active the current colour holds and warnings are ignored.
    hold: Drain,
}

impl ParryRing {
    fn new(defender: Entity) -> Self {
        Self {
            defender,
            color: WARNING_COLOR,
            alpha: Drain::default(),
            hold: Drain::default(),
        }
    }

    fn show(&mut self, color: Srgba, alpha: f32, hold: f32) {
        self.color = color;
        self.alpha = Drain::unit(alpha);
        self.hold = Drain::secs(hold);
    }

    fn on_feedback(&mut self, feedback: &ParryFeedback) {
        match *feedback {
            ParryFeedback::Warning { fill, .. } => {
                if !self.hold.is_active() {
                    self.color = WARNING_COLOR;
                    self.alpha = Drain::unit(fill * 0.5);
                }
            }
            ParryFeedback::Active { .. } => self.show(ACTIVE_COLOR, 0.7, 0.1),
            ParryFeedback::Success { perfect: false, .. } => self.show(SUCCESS_COLOR, 1.0, 0.5),
            ParryFeedback::Success { perfect: true, .. } => self.show(PERFECT_COLOR, 1.0, 0.35),
            ParryFeedback::Failed { .. } => self.show(FAILED_COLOR, 1.0, 0.8),
        }
    }

    fn fade(&mut self, dt: f32) {
        if self.hold.is_active() {
            self.hold.drain(dt);
        } else if self.color != WARNING_COLOR {
            self.alpha.drain(dt / 0.3);
        }
    }
}

pub fn plugin(app: &mut App) {
    app.insert_resource(GlobalFx::default())
        .insert_resource(FxTargets::default())
        .add_systems(
            Update,
            (attach_parry_rings, react_to_feedback, react_to_deaths)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            PostUpdate,
            (
                locate_fx_targets,
                apply_global_fx,
                update_parry_rings,
                fade_dying_actors,
            )
                .chain()
                .before(TransformSystems::Propagate)
                .run_if(in_state(GameState::InGame)),
        );
}

fn attach_parry_rings(
    mut commands: Commands,
    q: Query<(Entity, &Transform), Added<ParryMachine>>,
) {
    for (e, tf) in &q {
        commands.spawn((
            Name::new("ParryRing"),
            ParryRing::new(e),
            Sprite {
                color: Color::NONE,
                custom_size: Some(Vec2::splat(56.0)),
                ..default()
            },
            Transform::from_translation(tf.translation.with_z(0.5)),
            DespawnOnExit(GameState::InGame),
        ));
    }
}

fn react_to_feedback(
    mut feedback: MessageReader<ParryFeedback>,
    mut fx: ResMut<GlobalFx>,
    mut q_rings: Query<&mut ParryRing>,
) {
    for msg in feedback.read() {
        match msg {
            ParryFeedback::Success { perfect: true, .. } => fx.trigger_perfect_parry(),
            ParryFeedback::Success { perfect: false, .. } => fx.trigger_parry_success(),
            ParryFeedback::Failed { .. } => fx.trigger_parry_failed(),
            _ => {}
        }
        for mut ring in &mut q_rings {
            if ring.defender == msg.defender() {
                ring.on_feedback(msg);
            }
        }
    }
}

fn react_to_deaths(mut died: MessageReader<ActorDied>, mut fx: ResMut<GlobalFx>) {
    for msg in died.read() {
        if msg.faction == Faction::Player {
            fx.trigger_player_death();
        }
    }
}

/// Find the camera and spawn the overlay, once each.
fn locate_fx_targets(
    mut commands: Commands,
    mut targets: ResMut<FxTargets>,
    q_main_cam: Query<Entity, With<MainCamera>>,
    q_any_cam: Query<Entity, With<Camera2d>>,
    q_overlay: Query<Entity, With<FlashOverlay>>,
) {
    if targets.camera.is_none() {
        targets.camera = q_main_cam.single().ok().or_else(|| q_any_cam.iter().next());
    }
    // The overlay is scoped to the level; a restart needs a new one.
    if targets.overlay.is_some_and(|e| q_overlay.contains(e)) {
        return;
    }
    let overlay = q_overlay.single().unwrap_or_else(|_| {
        commands
            .spawn((
                FlashOverlay,
                Sprite {
                    color: Color::NONE,
                    custom_size: Some(Vec2::splat(5000.0)),
                    ..default()
                },
                Transform::from_xyz(0.0, 0.0, OVERLAY_Z),
                Visibility::Hidden,
                DespawnOnExit(GameState::InGame),
            ))
            .id()
    });
    targets.overlay = Some(overlay);
}

/// Quintic ease, used for the slow-motion fade-back.
#[inline]
fn smootherstep(x: f32) -> f32 {
    x * x * x * (x * (x * 6.0 - 15.0) + 10.0)
}

/// Single writer of virtual time speed, camera shake and the flash overlay.
/// Runs on real time so it keeps going while virtual time is frozen.
fn apply_global_fx(
    real_time: Res<Time<Real>>,
    mut virtual_time: ResMut<Time<Virtual>>,
    mut fx: ResMut<GlobalFx>,
    mut targets: ResMut<FxTargets>,
    mut q_cam: Query<&mut Transform, (With<Camera2d>, Without<FlashOverlay>)>,
    mut q_overlay: Query<(&mut Transform, &mut Sprite, &mut Visibility), (With<FlashOverlay>, Without<Camera2d>)>,
) {
    let (Some(camera), Some(overlay)) = (targets.camera, targets.overlay) else {
        return;
    };
    let dt = real_time.delta_secs();

    let scale = fx.time_scale(dt);
    virtual_time.set_relative_speed(scale);

    fx.shake_clock += dt;
    fx.trauma.drain(0.9 * dt);
    fx.flash.drain(3.0 * dt);

    let mut cam_xy = None;
    if let Ok(mut cam_tf) = q_cam.get_mut(camera) {
        let offset = shake_offset(fx.shake_clock, fx.trauma.value());
        let delta = offset - targets.applied_shake;
        cam_tf.translation += delta.extend(0.0);
        targets.applied_shake = offset;
        cam_xy = Some(cam_tf.translation.truncate());
    }

    let Ok((mut tf, mut sprite, mut vis)) = q_overlay.get_mut(overlay) else {
        return;
    };
    if let Some(xy) = cam_xy {
        tf.translation = xy.extend(OVERLAY_Z);
    }
    let intensity = fx.flash.value();
    if intensity > 0.001 {
        *vis = Visibility::Visible;
        sprite.color = fx.flash_color.with_alpha(intensity * 0.85).into();
    } else {
        *vis = Visibility::Hidden;
    }
}

fn update_parry_rings(
    real_time: Res<Time<Real>>,
    mut commands: Commands,
    q_defenders: Query<&Transform, (With<ParryMachine>, Without<ParryRing>)>,
    mut q_rings: Query<(Entity, &mut ParryRing, &mut Sprite, &mut Transform)>,
) {
    let dt = real_time.delta_secs();
    for (e, mut ring, mut sprite, mut tf) in &mut q_rings {
        let Ok(defender_tf) = q_defenders.get(ring.defender) else {
            commands.entity(e).despawn();
            continue;
        };
        tf.translation.x = defender_tf.translation.x;
        tf.translation.y = defender_tf.translation.y;

        ring.fade(dt);
        sprite.color = ring.color.with_alpha(ring.alpha.value()).into();
    }
}

/// Shrink and fade actors while their death delay runs.
fn fade_dying_actors(mut q: Query<(&Vitals, &mut Sprite, &mut Transform), Without<ParryRing>>) {
    for (vitals, mut sprite, mut tf) in &mut q {
        let LifeState::Dying { timer } = vitals.life() else {
            continue;
        };
        let dur = timer.duration().as_secs_f32().max(0.0001);
        let t = (timer.elapsed_secs() / dur).clamp(0.0, 1.0);

        tf.scale = Vec3::splat(1.0 - 0.5 * t);
        let mut c = sprite.color.to_srgba();
        c.alpha = 1.0 - t;
        sprite.color = c.into();
    }
}
