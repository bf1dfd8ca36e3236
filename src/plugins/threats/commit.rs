//! Return commit: recycle spent threats back into the pool.
//!
//! This system owns the inactive invariants: hidden, not moving, filtering
//! nothing, and back on the free list exactly once.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::inactive_threat_layers;

use super::components::{PooledThreat, Threat, ThreatState};
use super::pool::ThreatPool;

pub fn release_spent_threats(
    mut pool: ResMut<ThreatPool>,
    mut q: Query<
        (
            Entity,
            &mut ThreatState,
            &mut Threat,
            &mut Visibility,
            &mut LinearVelocity,
            &mut CollisionLayers,
        ),
        With<PooledThreat>,
    >,
) {
    for (e, mut state, mut threat, mut vis, mut vel, mut layers) in &mut q {
        if *state != ThreatState::Spent {
            continue;
        }

        *state = ThreatState::Inactive;
        threat.target = None;
        *vis = Visibility::Hidden;
        vel.0 = Vec2::ZERO;
        *layers = inactive_threat_layers();

        pool.push_free(e);
    }
}

/// Expire threats whose lifetime ran out.
pub fn tick_threat_lifetimes(
    time: Res<Time<Fixed>>,
    mut q: Query<(&mut Threat, &mut ThreatState), With<PooledThreat>>,
) {
    let dt = time.delta();
    for (mut threat, mut state) in &mut q {
        if *state != ThreatState::Live {
            continue;
        }
        threat.lifetime.tick(dt);
        if threat.lifetime.is_finished() {
            *state = ThreatState::Spent;
        }
    }
}

/// Leaving the level: every live threat goes back to the pool.
pub fn recall_live_threats(mut q: Query<&mut ThreatState, With<PooledThreat>>) {
    for mut state in &mut q {
        if *state == ThreatState::Live {
            *state = ThreatState::Spent;
        }
    }
}
