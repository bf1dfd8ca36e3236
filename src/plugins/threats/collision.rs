use avian2d::prelude::*;
use bevy::platform::collections::HashSet;
use bevy::prelude::*;

use crate::common::faction::Faction;
use crate::common::layers::{Layer, is_in_layer};
use crate::plugins::combat::{DamageRequest, Hit, Vitals};
use crate::plugins::parry::ParryMachine;

use super::components::{PooledThreat, Threat, ThreatKind, ThreatState};

#[derive(Clone, Copy, Debug)]
struct CollisionTarget {
    collider: Entity,
    body: Option<Entity>,
}

impl CollisionTarget {
    #[inline]
    fn gameplay_owner(self) -> Entity {
        self.body.unwrap_or(self.collider)
    }
}

#[inline]
fn targets(ev: &CollisionStart) -> (CollisionTarget, CollisionTarget) {
    (
        CollisionTarget { collider: ev.collider1, body: ev.body1 },
        CollisionTarget { collider: ev.collider2, body: ev.body2 },
    )
}

/// Turn threat contacts into damage requests.
///
/// - Walls spend projectiles; melee hitboxes ignore them.
/// - A threat only hurts actors hostile to its current owner.
/// - The threat a defender's running parry session has claimed is left to the parry.
/// - Projectiles are spent on the first actor they strike; melee hitboxes stay
///   live for their duration and can hit several actors once each.
/// - Melee knockback pushes away from the attacker, projectile knockback away
///   from where the projectile is.
pub fn resolve_threat_hits(
    mut started: MessageReader<CollisionStart>,
    mut q_threats: Query<(&Threat, &mut ThreatState, &Transform), With<PooledThreat>>,
    q_layers: Query<&CollisionLayers>,
    q_actors: Query<(&Faction, Option<&ParryMachine>), With<Vitals>>,
    mut damage: MessageWriter<DamageRequest>,
    mut seen: Local<HashSet<(Entity, Entity)>>,
) {
    seen.clear();

    for ev in started.read() {
        let (t1, t2) = targets(ev);

        let b1 = q_threats.contains(t1.collider);
        let b2 = q_threats.contains(t2.collider);
        if !(b1 ^ b2) {
            continue;
        }
        let (threat_side, other_side) = if b1 { (t1, t2) } else { (t2, t1) };

        let Ok((threat, mut state, tf)) = q_threats.get_mut(threat_side.collider) else {
            continue;
        };
        if *state != ThreatState::Live {
            continue;
        }

        if q_layers
            .get(other_side.collider)
            .is_ok_and(|layers| is_in_layer(layers, Layer::World))
        {
            if threat.kind == ThreatKind::Projectile {
                *state = ThreatState::Spent;
            }
            continue;
        }

        let actor = other_side.gameplay_owner();
        let Ok((faction, machine)) = q_actors.get(actor) else {
            continue;
        };
        if !threat.can_damage(*faction) {
            continue;
        }

        let handle = threat.handle(threat_side.collider);
        if machine.is_some_and(|m| m.claims(handle)) {
            continue;
        }

        if !seen.insert((threat_side.collider, actor)) {
            continue;
        }

        damage.write(DamageRequest {
            target: actor,
            hit: Hit {
                amount: threat.damage,
                source: match threat.kind {
                    ThreatKind::Melee => threat.source,
                    ThreatKind::Projectile => tf.translation.truncate(),
                },
                knockback: threat.knockback,
            },
        });

        if threat.kind == ThreatKind::Projectile {
            *state = ThreatState::Spent;
        }
    }
}
