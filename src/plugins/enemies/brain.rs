//! Enemy behaviour: Patrol -> Chase -> Attack.
//!
//! The brain is plain data; `drive_enemies` feeds it a `Perception` once per
//! fixed tick and applies the returned `BrainOutput`. Movement is horizontal
//! only, vertical velocity is left to physics.

use std::time::Duration;

use bevy::prelude::*;

use crate::common::faction::Faction;
use crate::common::tunables::{EnemyTunables, MeleeTunables, RangedTunables};
use crate::plugins::combat::Facing;
use crate::plugins::threats::SpawnThreatRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BehaviorState {
    Patrol,
    Chase,
    Attack,
}

#[derive(Debug, Clone)]
pub enum AttackProfile {
    /// Hitbox in front of the enemy for `duration`.
    Melee(MeleeTunables),
    /// Telegraphed shot after `wind_up`.
    Ranged(RangedTunables),
}

impl AttackProfile {
    fn cooldown(&self) -> f32 {
        match self {
            AttackProfile::Melee(m) => m.cooldown,
            AttackProfile::Ranged(r) => r.cooldown,
        }
    }
}

/// What the enemy knows this tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Perception {
    pub position: Vec2,
    /// Position of a live target, wherever it is.
    pub target: Option<Vec2>,
    /// A group mate spotted the target.
    pub alerted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BrainOutput {
    /// Horizontal velocity to apply; `None` leaves the current one alone.
    pub velocity_x: Option<f32>,
    pub facing: Option<Facing>,
    pub attack: Option<SpawnThreatRequest>,
    pub entered: Option<BehaviorState>,
}

#[derive(Component, Debug, Clone)]
pub struct EnemyBrain {
    profile: AttackProfile,
    state: BehaviorState,
    waypoints: Vec<Vec2>,
    next_waypoint: usize,
    lost_for: f32,
    cooldown: Option<Timer>,
    /// Melee swing or ranged wind-up, only while in Attack.
    action: Option<Timer>,
    facing: Facing,
}

impl EnemyBrain {
    pub fn new(profile: AttackProfile, waypoints: Vec<Vec2>) -> Self {
        Self {
            profile,
            state: BehaviorState::Patrol,
            waypoints,
            next_waypoint: 0,
            lost_for: 0.0,
            cooldown: None,
            action: None,
            facing: Facing::Right,
        }
    }

    #[inline]
    pub fn state(&self) -> BehaviorState {
        self.state
    }

    #[inline]
    pub fn profile(&self) -> &AttackProfile {
        &self.profile
    }

    #[inline]
    pub fn next_waypoint(&self) -> Option<Vec2> {
        self.waypoints.get(self.next_waypoint).copied()
    }

    /// An attack is winding up or swinging.
    #[inline]
    pub fn is_acting(&self) -> bool {
        self.action.is_some()
    }

    #[inline]
    pub fn on_cooldown(&self) -> bool {
        self.cooldown.is_some()
    }

    fn enter(&mut self, state: BehaviorState, out: &mut BrainOutput) {
        if self.state != state {
            self.state = state;
            out.entered = Some(state);
        }
        if state != BehaviorState::Attack {
            self.action = None;
        }
        if state == BehaviorState::Chase {
            self.lost_for = 0.0;
        }
    }

    fn face(&mut self, dx: f32, out: &mut BrainOutput) {
        if let Some(f) = Facing::from_x(dx) {
            self.facing = f;
            out.facing = Some(f);
        }
    }

    pub fn think(&mut self, dt: Duration, p: &Perception, t: &EnemyTunables) -> BrainOutput {
        let mut out = BrainOutput::default();

        if let Some(cd) = &mut self.cooldown {
            cd.tick(dt);
            if cd.is_finished() {
                self.cooldown = None;
            }
        }

        let in_sight = p
            .target
            .is_some_and(|tp| tp.distance(p.position) <= t.vision_range);
        let aware = p.target.is_some() && (in_sight || p.alerted);

        // One transition per tick: a chase that just started only moves.
        let mut may_attack = true;
        match self.state {
            BehaviorState::Patrol if aware => {
                self.enter(BehaviorState::Chase, &mut out);
                may_attack = false;
            }
            BehaviorState::Chase | BehaviorState::Attack => {
                if aware {
                    self.lost_for = 0.0;
                } else {
                    self.lost_for += dt.as_secs_f32();
                    if self.lost_for >= t.lost_player_time {
                        self.enter(BehaviorState::Patrol, &mut out);
                    }
                }
            }
            BehaviorState::Patrol => {}
        }

        match self.state {
            BehaviorState::Patrol => self.patrol(p.position, t, &mut out),
            BehaviorState::Chase => self.chase(p, t, may_attack, &mut out),
            BehaviorState::Attack => self.attack(dt, p, &mut out),
        }
        out
    }

    fn patrol(&mut self, pos: Vec2, t: &EnemyTunables, out: &mut BrainOutput) {
        let Some(wp) = self.next_waypoint() else {
            out.velocity_x = Some(0.0);
            return;
        };
        let dx = wp.x - pos.x;
        if dx.abs() <= t.waypoint_reach {
            self.next_waypoint = (self.next_waypoint + 1) % self.waypoints.len();
            out.velocity_x = Some(0.0);
            return;
        }
        self.face(dx, out);
        out.velocity_x = Some(dx.signum() * t.patrol_speed);
    }

    fn chase(&mut self, p: &Perception, t: &EnemyTunables, may_attack: bool, out: &mut BrainOutput) {
        let Some(target) = p.target else {
            out.velocity_x = Some(0.0);
            return;
        };
        let dx = target.x - p.position.x;
        let dist = target.distance(p.position);
        self.face(dx, out);

        let (in_range, vx) = match &self.profile {
            AttackProfile::Melee(m) => {
                let vx = if dist > t.stopping_distance { dx.signum() * t.chase_speed } else { 0.0 };
                (dist <= m.range, vx)
            }
            AttackProfile::Ranged(_) => {
                let vx = if dist < t.retreat_distance {
                    -dx.signum() * t.chase_speed
                } else if dist > t.vision_range - t.chase_stop_margin {
                    dx.signum() * t.chase_speed
                } else {
                    0.0
                };
                (dist >= t.retreat_distance && dist <= t.vision_range, vx)
            }
        };

        if may_attack && in_range && self.cooldown.is_none() {
            self.start_attack(p.position, out);
            self.enter(BehaviorState::Attack, out);
            out.velocity_x = Some(0.0);
        } else {
            out.velocity_x = Some(vx);
        }
    }

    fn start_attack(&mut self, pos: Vec2, out: &mut BrainOutput) {
        self.cooldown = Some(Timer::from_seconds(self.profile.cooldown(), TimerMode::Once));
        match &self.profile {
            AttackProfile::Melee(m) => {
                let center = pos + Vec2::X * self.facing.sign() * m.range;
                out.attack = Some(SpawnThreatRequest::melee(
                    Faction::Enemy,
                    center,
                    m.radius,
                    m.damage,
                    m.knockback,
                    m.duration,
                )
                .from_source(pos));
                self.action = Some(Timer::from_seconds(m.duration, TimerMode::Once));
            }
            AttackProfile::Ranged(r) => {
                self.action = Some(Timer::from_seconds(r.wind_up, TimerMode::Once));
            }
        }
    }

    fn attack(&mut self, dt: Duration, p: &Perception, out: &mut BrainOutput) {
        out.velocity_x = Some(0.0);
        let Some(action) = &mut self.action else {
            self.enter(BehaviorState::Chase, out);
            return;
        };
        action.tick(dt);
        if !action.is_finished() {
            return;
        }

        if let AttackProfile::Ranged(r) = &self.profile {
            let aim = p
                .target
                .and_then(|tp| (tp - p.position).try_normalize())
                .unwrap_or(Vec2::X * self.facing.sign());
            out.attack = Some(SpawnThreatRequest::projectile(
                Faction::Enemy,
                p.position + aim * 20.0,
                aim * r.speed,
                r.damage,
                r.knockback,
                r.lifetime,
            )
            .from_source(p.position));
        }
        self.enter(BehaviorState::Chase, out);
    }
}
