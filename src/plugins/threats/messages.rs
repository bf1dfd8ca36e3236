//! Threat spawn requests.
//!
//! Attackers never touch the pool. They write a `SpawnThreatRequest` and the
//! allocator is the only system that pops from the free list.

use bevy::prelude::*;

use crate::common::faction::Faction;

use super::components::ThreatKind;

#[derive(Message, Clone, Copy, Debug)]
pub struct SpawnThreatRequest {
    pub kind: ThreatKind,
    pub owner: Faction,
    pub pos: Vec2,
    /// Where the attacker stood when it attacked. Defaults to `pos`.
    pub source: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: i32,
    pub knockback: f32,
    pub lifetime: f32,
}

impl SpawnThreatRequest {
    /// Stationary hitbox that lasts `duration` seconds.
    pub fn melee(owner: Faction, pos: Vec2, radius: f32, damage: i32, knockback: f32, duration: f32) -> Self {
        Self {
            kind: ThreatKind::Melee,
            owner,
            pos,
            source: pos,
            vel: Vec2::ZERO,
            radius,
            damage,
            knockback,
            lifetime: duration,
        }
    }

    pub fn projectile(owner: Faction, pos: Vec2, vel: Vec2, damage: i32, knockback: f32, lifetime: f32) -> Self {
        Self {
            kind: ThreatKind::Projectile,
            owner,
            pos,
            source: pos,
            vel,
            radius: 5.0,
            damage,
            knockback,
            lifetime,
        }
    }

    pub fn from_source(mut self, source: Vec2) -> Self {
        self.source = source;
        self
    }
}
