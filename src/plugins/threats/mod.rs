//! Threats plugin: pooled damaging objects (projectiles and melee hitboxes).
//!
//! ```text
//!   Timers    lifetimes expire -> Spent
//!   Behavior  attackers write SpawnThreatRequest, reflected threats home in
//!   Resolve   CollisionStart -> DamageRequest, projectiles -> Spent
//!   Cleanup   Spent -> Inactive (back on the free list), then requests -> Live
//! ```
//!
//! Releasing before allocating lets a threat freed this tick be reused at once;
//! its generation bump invalidates any handle still pointing at it.

pub mod allocator;
pub mod collision;
pub mod commit;
pub mod components;
pub mod messages;
pub mod pool;
pub mod steering;

use bevy::prelude::*;

use crate::common::state::GameState;
use crate::plugins::combat::{CombatSet, damage::apply_damage_requests};

pub use components::{PooledThreat, Threat, ThreatHandle, ThreatKind, ThreatState};
pub use messages::SpawnThreatRequest;
pub use pool::ThreatPool;

pub struct ThreatsPlugin;

impl Plugin for ThreatsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<SpawnThreatRequest>()
            .add_systems(Startup, pool::init_threat_pool)
            .add_systems(
                OnExit(GameState::InGame),
                (commit::recall_live_threats, commit::release_spent_threats).chain(),
            );

        app.add_systems(
            FixedPostUpdate,
            commit::tick_threat_lifetimes.in_set(CombatSet::Timers),
        )
        .add_systems(
            FixedPostUpdate,
            steering::steer_reflected_threats.in_set(CombatSet::Behavior),
        )
        .add_systems(
            FixedPostUpdate,
            collision::resolve_threat_hits
                .in_set(CombatSet::Resolve)
                .before(apply_damage_requests),
        )
        .add_systems(
            FixedPostUpdate,
            (commit::release_spent_threats, allocator::allocate_threats)
                .chain()
                .in_set(CombatSet::Cleanup),
        );
    }
}
