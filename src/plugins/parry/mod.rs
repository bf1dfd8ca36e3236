//! Parry plugin.
//!
//! Each defender carries a `ThreatTracker` and a `ParryMachine`. Per fixed tick:
//!
//! - `Detect`: hostile live threats within the detection radius enter the
//!   tracker, ones that left (or changed side) exit.
//! - `Parry`: the machine advances; entering Active raises the damage guard,
//!   Active resolves every tracked threat inside the hit zone, Recovery drops
//!   the guard and settles a failed attempt, and a pending press may start a
//!   new attempt.
//!
//! Input arrives as `ParryPressed` messages; nothing here polls devices.

pub mod feedback;
pub mod machine;
pub mod reflection;
pub mod tracker;

use avian2d::prelude::*;
use bevy::prelude::*;
use thiserror::Error;

use crate::common::faction::Faction;
use crate::common::layers::live_threat_layers;
use crate::common::tunables::Tunables;
use crate::plugins::combat::{CombatSet, DamageRequest, Health, Hit, Vitals};
use crate::plugins::threats::{PooledThreat, Threat, ThreatHandle, ThreatState};

use feedback::{FeedbackWriter, ParryObserver};
use reflection::{Candidate, Resolution};

pub use feedback::ParryFeedback;
pub use machine::{ParryMachine, ParrySession, ParryState, ParryTimings};
pub use tracker::{ThreatTracker, TrackedThreat};

/// Edge-triggered parry input for one defender.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParryPressed {
    pub defender: Entity,
}

/// Stunned, dead or otherwise unable to act: abort any running attempt.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefenderDisabled {
    pub defender: Entity,
}

/// Set on defenders that failed setup validation; their parry never runs.
#[derive(Component, Debug, Clone, Copy)]
pub struct ParryDisabled;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("parry defender {entity:?} is missing {component}")]
    MissingComponent { entity: Entity, component: &'static str },
}

pub fn plugin(app: &mut App) {
    app.add_message::<ParryPressed>()
        .add_message::<DefenderDisabled>()
        .add_message::<ParryFeedback>()
        .add_systems(
            FixedPostUpdate,
            (validate_defenders, scan_detection_zones)
                .chain()
                .in_set(CombatSet::Detect),
        )
        .add_systems(FixedPostUpdate, run_parry.in_set(CombatSet::Parry));
}

/// Components a parrying actor needs besides the two defender components.
pub fn defender(tunables: &Tunables) -> (ParryMachine, ThreatTracker) {
    (
        ParryMachine::new(ParryTimings::from(&tunables.parry)),
        ThreatTracker::default(),
    )
}

pub fn check_defender(entity: Entity, present: &[(&'static str, bool)]) -> Result<(), SetupError> {
    match present.iter().find(|(_, ok)| !ok) {
        Some((component, _)) => Err(SetupError::MissingComponent { entity, component }),
        None => Ok(()),
    }
}

pub fn validate_defenders(
    mut commands: Commands,
    q: Query<
        (Entity, Has<ThreatTracker>, Has<Vitals>, Has<Health>, Has<Faction>, Has<Transform>),
        Added<ParryMachine>,
    >,
) {
    for (e, tracker, vitals, health, faction, transform) in &q {
        let present = [
            ("ThreatTracker", tracker),
            ("Vitals", vitals),
            ("Health", health),
            ("Faction", faction),
            ("Transform", transform),
        ];
        if let Err(err) = check_defender(e, &present) {
            error!("{err}; parry disabled");
            commands.entity(e).insert(ParryDisabled);
        }
    }
}

pub fn scan_detection_zones(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut q_defenders: Query<(&Transform, &Faction, &mut ThreatTracker), Without<ParryDisabled>>,
    q_threats: Query<(Entity, &Threat, &ThreatState, &Transform), With<PooledThreat>>,
) {
    let now = time.elapsed_secs();
    let radius = tunables.parry.detection_radius;

    for (tf, faction, mut tracker) in &mut q_defenders {
        let origin = tf.translation.truncate();
        for (e, threat, state, threat_tf) in &q_threats {
            if *state != ThreatState::Live {
                continue;
            }
            let handle = threat.handle(e);
            let inside = threat.can_damage(*faction)
                && threat_tf.translation.truncate().distance(origin) <= radius;

            if inside {
                if tracker.on_threat_entered(handle, threat.owner, *faction, now) {
                    debug!("threat {e:?} entered detection zone");
                }
            } else if tracker.contains(handle) && tracker.on_threat_exited(e) {
                debug!("threat {e:?} left detection zone");
            }
        }
    }
}

type ThreatQuery<'w, 's> = Query<
    'w,
    's,
    (
        &'static mut Threat,
        &'static mut ThreatState,
        &'static Transform,
        &'static mut LinearVelocity,
        &'static mut CollisionLayers,
    ),
    With<PooledThreat>,
>;

fn threat_position(q: &ThreatQuery, handle: ThreatHandle) -> Option<Vec2> {
    let (threat, state, tf, ..) = q.get(handle.entity).ok()?;
    handle.refers_to(threat, *state).then(|| tf.translation.truncate())
}

#[allow(clippy::too_many_arguments)]
pub fn run_parry(
    time: Res<Time<Fixed>>,
    tunables: Res<Tunables>,
    mut pressed: MessageReader<ParryPressed>,
    mut disabled: MessageReader<DefenderDisabled>,
    mut feedback: MessageWriter<ParryFeedback>,
    mut damage: MessageWriter<DamageRequest>,
    mut q_defenders: Query<
        (Entity, &Transform, &mut ParryMachine, &mut ThreatTracker, &mut Vitals),
        (Without<ParryDisabled>, Without<PooledThreat>),
    >,
    mut q_threats: ThreatQuery,
    q_candidates: Query<
        (Entity, &Transform, &Faction, &Vitals),
        (Without<ParryMachine>, Without<PooledThreat>),
    >,
) {
    let now = time.elapsed_secs();
    let dt = time.delta();
    let p = &tunables.parry;

    let pressed: Vec<Entity> = pressed.read().map(|m| m.defender).collect();
    let disabled: Vec<Entity> = disabled.read().map(|m| m.defender).collect();

    let candidates: Vec<Candidate> = q_candidates
        .iter()
        .filter(|(.., vitals)| !vitals.is_dead())
        .map(|(entity, tf, faction, _)| Candidate {
            entity,
            position: tf.translation.truncate(),
            faction: *faction,
        })
        .collect();

    for (e, tf, mut machine, mut tracker, mut vitals) in &mut q_defenders {
        let origin = tf.translation.truncate();
        let mut observer = FeedbackWriter { defender: e, writer: &mut feedback };

        if disabled.contains(&e) || vitals.is_dead() {
            if machine.cancel() {
                vitals.set_guard(false);
                debug!("parry on {e:?} cancelled");
            }
            tracker.clear();
            if let Some(fill) = machine.warning(None) {
                observer.on_warning(fill);
            }
            continue;
        }

        match machine.advance(dt) {
            Some(ParryState::Active) => {
                vitals.set_guard(true);
                observer.on_parry_active();
            }
            Some(ParryState::Recovery) => {
                vitals.set_guard(false);
                if let Some(session) = machine.session().filter(|s| !s.was_successful).cloned() {
                    settle_failure(e, &session, &mut q_threats, &mut damage);
                    tracker.on_threat_exited(session.threat.entity);
                    observer.on_parry_failed();
                    debug!("parry on {e:?} failed");
                }
            }
            Some(state) => debug!("parry on {e:?} -> {state:?}"),
            None => {}
        }

        if machine.state() == ParryState::Active {
            let perfect = machine.session().is_some_and(|s| s.was_perfect);
            let range = if perfect { p.perfect_reflection_range } else { p.reflection_range };
            let handles: Vec<ThreatHandle> = tracker.iter().map(|t| t.handle).collect();

            for handle in handles {
                let Ok((mut threat, mut state, threat_tf, mut vel, mut layers)) =
                    q_threats.get_mut(handle.entity)
                else {
                    tracker.on_threat_exited(handle.entity);
                    continue;
                };
                if !handle.refers_to(&threat, *state) {
                    tracker.on_threat_exited(handle.entity);
                    continue;
                }
                let pos = threat_tf.translation.truncate();
                if pos.distance(origin) > p.hit_zone_radius {
                    continue;
                }

                match reflection::resolve(&mut threat, pos, origin, range, candidates.iter().copied()) {
                    Resolution::Reflected { target, direction } => {
                        let base = vel.0.length();
                        let base = if base > f32::EPSILON { base } else { tunables.enemy.ranged.speed };
                        vel.0 = direction * base * p.reflected_speed_scale;
                        *layers = live_threat_layers(threat.owner);
                        debug!("threat {:?} reflected at {target:?}", handle.entity);
                    }
                    Resolution::Neutralized => {
                        *state = ThreatState::Spent;
                        debug!("threat {:?} neutralized", handle.entity);
                    }
                    Resolution::AlreadyReflected => {}
                }
                tracker.on_threat_exited(handle.entity);

                if machine.record_success() {
                    observer.on_parry_success(perfect);
                    debug!("parry on {e:?} succeeded (perfect: {perfect})");
                }
            }
        }

        if pressed.contains(&e) {
            let nearest = tracker.nearest(origin, |h| threat_position(&q_threats, h));
            match nearest {
                Some((tracked, _)) if machine.can_execute(true, vitals.is_invulnerable()) => {
                    let (dmg, knockback) = q_threats
                        .get(tracked.handle.entity)
                        .map(|(t, ..)| (t.damage, t.knockback))
                        .unwrap_or((0, 0.0));
                    machine.start(now, tracked.handle, tracked.first_seen, dmg, knockback);
                    debug!("parry on {e:?} started against {:?}", tracked.handle.entity);
                }
                _ => debug!("parry input on {e:?} ignored in {:?}", machine.state()),
            }
        }

        let fill = tracker
            .nearest(origin, |h| threat_position(&q_threats, h))
            .map(|(_, d)| 1.0 - d / p.detection_radius);
        if let Some(fill) = machine.warning(fill) {
            observer.on_warning(fill);
        }
    }
}

/// A failed parry: the claimed threat lands on the defender (if it still
/// exists) and is removed.
fn settle_failure(
    defender: Entity,
    session: &ParrySession,
    q_threats: &mut ThreatQuery,
    damage: &mut MessageWriter<DamageRequest>,
) {
    let Ok((threat, mut state, tf, ..)) = q_threats.get_mut(session.threat.entity) else {
        return;
    };
    if !session.threat.refers_to(&threat, *state) {
        return;
    }
    damage.write(DamageRequest {
        target: defender,
        hit: Hit {
            amount: session.threat_damage,
            source: tf.translation.truncate(),
            knockback: session.threat_knockback,
        },
    });
    *state = ThreatState::Spent;
}
