//! Combat plugin: actor vitals, the damage model and the fixed-step ordering.
//!
//! Every gameplay system that touches combat state runs in `FixedPostUpdate`,
//! after Avian has emitted collision messages, in this order:
//!
//! ```text
//! Timers -> Detect -> Parry -> Behavior -> Resolve -> Cleanup
//! ```
//!
//! A parry that becomes Active in a tick is therefore resolved before any
//! collision damage from that same tick.

pub mod components;
pub mod damage;
pub mod messages;

use avian2d::collision::narrow_phase::CollisionEventSystems;
use bevy::prelude::*;

use crate::common::state::GameState;

pub use components::{Facing, Health, LifeState, Vitals};
pub use damage::{DamageOutcome, Hit, apply_damage};
pub use messages::{ActorDied, DamageRequest};

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatSet {
    /// Countdown timers (hit cooldowns, knockback, threat lifetimes).
    Timers,
    /// Threat entry/exit for every defender's tracker.
    Detect,
    /// Parry state machines.
    Parry,
    /// Enemy brains and player actions.
    Behavior,
    /// Collision hits and damage application.
    Resolve,
    /// Pool returns, threat allocation, death bookkeeping.
    Cleanup,
}

pub fn plugin(app: &mut App) {
    app.add_message::<DamageRequest>()
        .add_message::<ActorDied>()
        .configure_sets(
            FixedPostUpdate,
            (
                CombatSet::Timers,
                CombatSet::Detect,
                CombatSet::Parry,
                CombatSet::Behavior,
                CombatSet::Resolve,
                CombatSet::Cleanup,
            )
                .chain()
                .after(CollisionEventSystems)
                .run_if(in_state(GameState::InGame)),
        )
        .add_systems(
            FixedPostUpdate,
            (damage::tick_vitals, damage::halt_dying_actors)
                .chain()
                .in_set(CombatSet::Timers),
        )
        .add_systems(
            FixedPostUpdate,
            damage::apply_damage_requests.in_set(CombatSet::Resolve),
        )
        .add_systems(PostUpdate, damage::despawn_pending);
}
