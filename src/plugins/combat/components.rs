use std::time::Duration;

use bevy::prelude::*;

use crate::common::tunables::VitalsTunables;

#[derive(Component, Debug, Clone)]
pub struct Health {
    pub hp: i32,
    pub max_hp: i32,
}

impl Health {
    pub fn full(max_hp: i32) -> Self {
        Self { hp: max_hp, max_hp }
    }
}

/// Horizontal facing, kept as a sign so it can scale offsets directly.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }

    /// Facing implied by a horizontal direction; `None` when there is no clear direction.
    #[inline]
    pub fn from_x(x: f32) -> Option<Self> {
        if x > f32::EPSILON {
            Some(Facing::Right)
        } else if x < -f32::EPSILON {
            Some(Facing::Left)
        } else {
            None
        }
    }
}

/// One-way life cycle. `Dying` holds the optional death-animation delay.
#[derive(Debug, Clone)]
pub enum LifeState {
    Alive,
    Dying { timer: Timer },
    Dead,
}

/// Marker: remove this actor once it reaches `LifeState::Dead`.
#[derive(Component, Debug, Clone, Copy)]
pub struct DespawnOnDeath;

/// Marker: despawn in `PostUpdate`.
#[derive(Component, Debug, Clone, Copy)]
pub struct PendingDespawn;

/// Damage-side state every actor carries.
///
/// The damage model is the only writer of the timers and the life state.
/// `guarded` is the external invulnerability source (the parry Active phase).
#[derive(Component, Debug, Clone)]
pub struct Vitals {
    hit_cooldown_secs: f32,
    knockback_recovery_secs: f32,
    death_delay_secs: f32,
    hit_cooldown: Option<Timer>,
    knockback: Option<Timer>,
    guarded: bool,
    life: LifeState,
}

impl Vitals {
    pub fn new(hit_cooldown_secs: f32, knockback_recovery_secs: f32, death_delay_secs: f32) -> Self {
        Self {
            hit_cooldown_secs,
            knockback_recovery_secs,
            death_delay_secs,
            hit_cooldown: None,
            knockback: None,
            guarded: false,
            life: LifeState::Alive,
        }
    }

    pub fn from_tunables(t: &VitalsTunables) -> Self {
        Self::new(t.hit_cooldown, t.knockback_recovery, t.death_delay)
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.is_guarded() || self.in_hit_cooldown()
    }

    #[inline]
    pub fn in_hit_cooldown(&self) -> bool {
        self.hit_cooldown.is_some()
    }

    #[inline]
    pub fn is_knockbacked(&self) -> bool {
        self.knockback.is_some()
    }

    #[inline]
    pub fn is_guarded(&self) -> bool {
        self.guarded
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        !matches!(self.life, LifeState::Alive)
    }

    #[inline]
    pub fn life(&self) -> &LifeState {
        &self.life
    }

    pub fn set_guard(&mut self, on: bool) {
        self.guarded = on;
    }

    pub(crate) fn start_hit_cooldown(&mut self) {
        if self.hit_cooldown_secs > 0.0 {
            self.hit_cooldown = Some(Timer::from_seconds(self.hit_cooldown_secs, TimerMode::Once));
        }
    }

    pub(crate) fn start_knockback(&mut self) {
        self.knockback = Some(Timer::from_seconds(self.knockback_recovery_secs, TimerMode::Once));
    }

    /// Alive -> Dying. A zero delay still spends one tick in `Dying`.
    /// Hit cooldown and guard are dropped; a knockback in progress plays out.
    /// Returns false if already dying or dead.
    pub(crate) fn kill(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        self.hit_cooldown = None;
        self.guarded = false;
        self.life = LifeState::Dying {
            timer: Timer::from_seconds(self.death_delay_secs.max(0.0), TimerMode::Once),
        };
        true
    }

    /// Advance the actor's timers. Returns true on the tick the actor becomes `Dead`.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if let Some(t) = &mut self.hit_cooldown {
            t.tick(dt);
            if t.is_finished() {
                self.hit_cooldown = None;
            }
        }
        if let Some(t) = &mut self.knockback {
            t.tick(dt);
            if t.is_finished() {
                self.knockback = None;
            }
        }
        if let LifeState::Dying { timer } = &mut self.life {
            timer.tick(dt);
            if timer.is_finished() {
                self.life = LifeState::Dead;
                return true;
            }
        }
        false
    }
}
