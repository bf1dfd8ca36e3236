use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::layers::inactive_threat_layers;
use crate::common::tunables::Tunables;

use super::components::{PooledThreat, Threat, ThreatState};

#[derive(Resource, Debug)]
pub struct ThreatPool {
    free: Vec<Entity>,
    capacity: usize,
}

impl ThreatPool {
    pub fn new(capacity: usize) -> Self {
        Self { free: Vec::with_capacity(capacity), capacity }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.free.len()
    }

    #[inline]
    pub fn pop_free(&mut self) -> Option<Entity> {
        self.free.pop()
    }

    #[inline]
    pub fn push_free(&mut self, e: Entity) {
        self.free.push(e);
    }
}

/// Pre-spawn the whole pool in the inactive state.
///
/// Physics components stay on the entities; inactive threats just filter nothing,
/// so they never generate collision events.
pub fn init_threat_pool(mut commands: Commands, tunables: Res<Tunables>) {
    let capacity = tunables.threat_pool_capacity;
    let mut pool = ThreatPool::new(capacity);

    for _ in 0..capacity {
        let e = commands
            .spawn((
                Name::new("Threat(Pooled)"),
                PooledThreat,
                ThreatState::Inactive,
                Threat::inactive(),
                Sprite {
                    color: Color::srgb(1.0, 0.35, 0.3),
                    custom_size: Some(Vec2::splat(10.0)),
                    ..default()
                },
                Transform::from_xyz(0.0, 0.0, 2.0),
                Visibility::Hidden,
                RigidBody::Dynamic,
                GravityScale(0.0),
                Collider::circle(5.0),
                Sensor,
                inactive_threat_layers(),
                LinearVelocity(Vec2::ZERO),
                CollisionEventsEnabled,
            ))
            .id();
        pool.push_free(e);
    }

    debug!("threat pool ready ({capacity} entries)");
    commands.insert_resource(pool);
}
