//! Spawn consumer: activate threats from the pool.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::live_threat_layers;

use super::components::{PooledThreat, Threat, ThreatKind, ThreatState};
use super::messages::SpawnThreatRequest;
use super::pool::ThreatPool;

pub fn allocate_threats(
    mut pool: ResMut<ThreatPool>,
    mut reader: MessageReader<SpawnThreatRequest>,
    mut q: Query<
        (
            &mut ThreatState,
            &mut Threat,
            &mut Transform,
            &mut LinearVelocity,
            &mut Visibility,
            &mut CollisionLayers,
            &mut Collider,
            &mut Sprite,
        ),
        With<PooledThreat>,
    >,
) {
    for req in reader.read() {
        let Some(e) = pool.pop_free() else {
            warn!("threat pool exhausted, dropping {:?} request", req.kind);
            continue;
        };

        let Ok((mut state, mut threat, mut tf, mut vel, mut vis, mut layers, mut collider, mut sprite)) =
            q.get_mut(e)
        else {
            error!("threat pool held {e:?} without pooled threat components");
            continue;
        };

        threat.activate(req);
        *state = ThreatState::Live;
        tf.translation = req.pos.extend(2.0);
        vel.0 = req.vel;
        *vis = Visibility::Visible;
        *layers = live_threat_layers(req.owner);
        *collider = Collider::circle(req.radius);
        sprite.custom_size = Some(Vec2::splat(req.radius * 2.0));
        sprite.color = match req.kind {
            ThreatKind::Melee => Color::srgba(1.0, 0.6, 0.2, 0.5),
            ThreatKind::Projectile => Color::srgb(1.0, 0.35, 0.3),
        };
    }
}
