//! Damage model: the single place hp, hit cooldown, knockback and death change.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::faction::Faction;
use crate::common::layers::non_interacting_layers;

use super::components::{DespawnOnDeath, Health, PendingDespawn, Vitals};
use super::messages::{ActorDied, DamageRequest};

/// One incoming hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub amount: i32,
    /// World position the hit came from; knockback pushes away from it.
    pub source: Vec2,
    /// Knockback speed (px/s). Zero disables knockback for this hit.
    pub knockback: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Dead, invulnerable or in hit cooldown: nothing changed.
    Ignored,
    Damaged { knocked_back: bool },
    Killed,
}

/// Apply `hit` to an actor at `position`.
///
/// Either the whole hit lands (hp, cooldown, knockback and possibly death) or
/// nothing changes. Negative amounts are treated as zero; hp never rises here.
pub fn apply_damage(
    health: &mut Health,
    vitals: &mut Vitals,
    velocity: &mut Vec2,
    position: Vec2,
    hit: Hit,
) -> DamageOutcome {
    if vitals.is_dead() || vitals.is_invulnerable() {
        return DamageOutcome::Ignored;
    }

    health.hp = (health.hp - hit.amount.max(0)).clamp(0, health.max_hp);

    let knocked_back = hit.knockback > 0.0 && !vitals.is_knockbacked();
    if knocked_back {
        let away = (position - hit.source).try_normalize().unwrap_or(Vec2::Y);
        *velocity = away * hit.knockback;
        vitals.start_knockback();
    }

    if health.hp == 0 {
        vitals.kill();
        return DamageOutcome::Killed;
    }

    vitals.start_hit_cooldown();
    DamageOutcome::Damaged { knocked_back }
}

/// Resolve every queued `DamageRequest` against its target.
pub fn apply_damage_requests(
    mut requests: MessageReader<DamageRequest>,
    mut died: MessageWriter<ActorDied>,
    mut q: Query<(
        &mut Health,
        &mut Vitals,
        &mut LinearVelocity,
        &Transform,
        &Faction,
        Option<&mut CollisionLayers>,
    )>,
) {
    for req in requests.read() {
        let Ok((mut health, mut vitals, mut vel, tf, faction, layers)) = q.get_mut(req.target)
        else {
            continue;
        };

        let pos = tf.translation.truncate();
        match apply_damage(&mut health, &mut vitals, &mut vel.0, pos, req.hit) {
            DamageOutcome::Ignored => {}
            DamageOutcome::Damaged { knocked_back } => {
                debug!(
                    "{:?} {:?} took {} ({} left, knockback: {knocked_back})",
                    faction, req.target, req.hit.amount, health.hp
                );
            }
            DamageOutcome::Killed => {
                if let Some(mut layers) = layers {
                    *layers = non_interacting_layers(*faction);
                }
                info!("{:?} {:?} died", faction, req.target);
                died.write(ActorDied { entity: req.target, faction: *faction });
            }
        }
    }
}

/// Tick hit cooldowns, knockback recovery and death delays.
pub fn tick_vitals(
    time: Res<Time<Fixed>>,
    mut commands: Commands,
    mut q: Query<(Entity, &mut Vitals, Has<DespawnOnDeath>)>,
) {
    let dt = time.delta();
    for (e, mut vitals, despawn) in &mut q {
        if vitals.tick(dt) && despawn {
            commands.entity(e).insert(PendingDespawn);
        }
    }
}

/// Dying actors stand still once the knockback of the killing blow is over.
pub fn halt_dying_actors(mut q: Query<(&Vitals, &mut LinearVelocity)>) {
    for (vitals, mut vel) in &mut q {
        if vitals.is_dead() && !vitals.is_knockbacked() && vel.0 != Vec2::ZERO {
            vel.0 = Vec2::ZERO;
        }
    }
}

pub fn despawn_pending(mut commands: Commands, q: Query<Entity, With<PendingDespawn>>) {
    for e in &q {
        commands.entity(e).despawn();
    }
}
