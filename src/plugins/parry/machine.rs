//! Parry state machine.
//!
//! ```text
//! Ready --press--> Startup --t--> Active --t--> Recovery --1 tick--> Cooldown --t--> Ready
//! ```
//!
//! No phase is ever skipped. A failed attempt uses the longer cooldown. The
//! machine itself holds no references to other entities besides the weak
//! threat handle in the session.

use std::time::Duration;

use bevy::prelude::*;

use crate::common::tunables::ParryTunables;
use crate::plugins::threats::ThreatHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParryState {
    Ready,
    Startup,
    Active,
    Recovery,
    Cooldown,
}

#[derive(Debug, Clone)]
enum Phase {
    Ready,
    Startup(Timer),
    Active(Timer),
    Recovery,
    Cooldown(Timer),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParryTimings {
    pub startup: f32,
    pub active: f32,
    pub success_cooldown: f32,
    pub failure_cooldown: f32,
    pub perfect_window: f32,
}

impl From<&ParryTunables> for ParryTimings {
    fn from(t: &ParryTunables) -> Self {
        Self {
            startup: t.startup,
            active: t.active,
            success_cooldown: t.success_cooldown,
            failure_cooldown: t.failure_cooldown,
            perfect_window: t.perfect_window,
        }
    }
}

/// One parry attempt, from input to the end of Recovery.
#[derive(Debug, Clone, PartialEq)]
pub struct ParrySession {
    pub started_at: f32,
    /// Nearest tracked threat when the input was accepted.
    pub threat: ThreatHandle,
    pub threat_first_seen: f32,
    /// Damage of that threat, applied to the defender if the attempt fails.
    pub threat_damage: i32,
    pub threat_knockback: f32,
    pub was_perfect: bool,
    pub was_successful: bool,
}

#[derive(Component, Debug, Clone)]
pub struct ParryMachine {
    timings: ParryTimings,
    phase: Phase,
    session: Option<ParrySession>,
    last_session: Option<ParrySession>,
    warning_shown: bool,
}

impl ParryMachine {
    pub fn new(timings: ParryTimings) -> Self {
        Self {
            timings,
            phase: Phase::Ready,
            session: None,
            last_session: None,
            warning_shown: false,
        }
    }

    pub fn state(&self) -> ParryState {
        match self.phase {
            Phase::Ready => ParryState::Ready,
            Phase::Startup(_) => ParryState::Startup,
            Phase::Active(_) => ParryState::Active,
            Phase::Recovery => ParryState::Recovery,
            Phase::Cooldown(_) => ParryState::Cooldown,
        }
    }

    /// Startup or Active.
    #[inline]
    pub fn is_parrying(&self) -> bool {
        matches!(self.phase, Phase::Startup(_) | Phase::Active(_))
    }

    #[inline]
    pub fn session(&self) -> Option<&ParrySession> {
        self.session.as_ref()
    }

    /// The most recent finished (or cancelled) session.
    #[inline]
    pub fn last_session(&self) -> Option<&ParrySession> {
        self.last_session.as_ref()
    }

    /// Threat claimed by the running session, if any.
    #[inline]
    pub fn session_threat(&self) -> Option<ThreatHandle> {
        self.session.as_ref().map(|s| s.threat)
    }

    /// True while the attempt is still open for `handle`: it is the claimed
    /// threat and the machine is in Startup or Active. From Recovery on the
    /// threat is fair game again.
    pub fn claims(&self, handle: ThreatHandle) -> bool {
        self.is_parrying() && self.session_threat() == Some(handle)
    }

    pub fn can_execute(&self, has_threat: bool, defender_invulnerable: bool) -> bool {
        matches!(self.phase, Phase::Ready) && has_threat && !defender_invulnerable
    }

    /// Ready -> Startup. The attempt is perfect if the input came within the
    /// perfect window of the threat first being seen.
    pub fn start(&mut self, now: f32, threat: ThreatHandle, first_seen: f32, damage: i32, knockback: f32) -> bool {
        if !matches!(self.phase, Phase::Ready) {
            return false;
        }
        let was_perfect = now - first_seen <= self.timings.perfect_window;
        self.session = Some(ParrySession {
            started_at: now,
            threat,
            threat_first_seen: first_seen,
            threat_damage: damage,
            threat_knockback: knockback,
            was_perfect,
            was_successful: false,
        });
        self.phase = Phase::Startup(Timer::from_seconds(self.timings.startup, TimerMode::Once));
        self.warning_shown = false;
        true
    }

    /// Advance one tick. Returns the state entered this tick, if any.
    ///
    /// Recovery always lasts exactly one tick; its cooldown length is chosen
    /// from the session outcome when leaving it.
    pub fn advance(&mut self, dt: Duration) -> Option<ParryState> {
        let next = match &mut self.phase {
            Phase::Ready => None,
            Phase::Startup(t) => {
                t.tick(dt);
                t.is_finished()
                    .then(|| Phase::Active(Timer::from_seconds(self.timings.active, TimerMode::Once)))
            }
            Phase::Active(t) => {
                t.tick(dt);
                t.is_finished().then_some(Phase::Recovery)
            }
            Phase::Recovery => {
                let success = self.session.as_ref().is_some_and(|s| s.was_successful);
                let secs = if success {
                    self.timings.success_cooldown
                } else {
                    self.timings.failure_cooldown
                };
                Some(Phase::Cooldown(Timer::from_seconds(secs, TimerMode::Once)))
            }
            Phase::Cooldown(t) => {
                t.tick(dt);
                t.is_finished().then_some(Phase::Ready)
            }
        }?;

        self.phase = next;
        if matches!(self.phase, Phase::Ready) {
            self.last_session = self.session.take();
        }
        Some(self.state())
    }

    /// Mark the running session successful. Only valid while Active; the
    /// first call wins and later ones return false.
    pub fn record_success(&mut self) -> bool {
        if !matches!(self.phase, Phase::Active(_)) {
            return false;
        }
        match &mut self.session {
            Some(s) if !s.was_successful => {
                s.was_successful = true;
                true
            }
            _ => false,
        }
    }

    /// Abort whatever is in progress and return to Ready without a cooldown.
    /// Returns true if there was something to abort.
    pub fn cancel(&mut self) -> bool {
        if matches!(self.phase, Phase::Ready) {
            return false;
        }
        self.phase = Phase::Ready;
        self.last_session = self.session.take();
        self.warning_shown = false;
        true
    }

    /// Decide what warning to emit this tick: a fill ratio while threats are
    /// tracked, a single zero when they go away, otherwise nothing.
    pub fn warning(&mut self, fill: Option<f32>) -> Option<f32> {
        match fill {
            Some(f) => {
                self.warning_shown = true;
                Some(f.clamp(0.0, 1.0))
            }
            None if self.warning_shown => {
                self.warning_shown = false;
                Some(0.0)
            }
            None => None,
        }
    }
}
