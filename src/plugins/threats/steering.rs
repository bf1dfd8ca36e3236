//! Reflected projectiles home on the actor they were sent back at.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::plugins::combat::Vitals;

use super::components::{PooledThreat, Threat, ThreatState};

/// Turn each reflected threat towards its target, keeping its speed. Once the
/// target is gone or dying the threat drops it and flies straight on.
pub fn steer_reflected_threats(
    mut q_threats: Query<
        (Entity, &mut Threat, &ThreatState, &Transform, &mut LinearVelocity),
        With<PooledThreat>,
    >,
    q_targets: Query<(&Transform, &Vitals), Without<PooledThreat>>,
) {
    for (e, mut threat, state, tf, mut vel) in &mut q_threats {
        if *state != ThreatState::Live {
            continue;
        }
        let Some(target) = threat.target else {
            continue;
        };

        let aim = q_targets
            .get(target)
            .ok()
            .filter(|(_, vitals)| !vitals.is_dead())
            .map(|(target_tf, _)| target_tf.translation.truncate());
        let Some(aim) = aim else {
            debug!("threat {e:?} lost its target {target:?}");
            threat.target = None;
            continue;
        };

        if let Some(dir) = (aim - tf.translation.truncate()).try_normalize() {
            vel.0 = dir * vel.0.length();
        }
    }
}
