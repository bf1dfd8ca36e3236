use bevy::prelude::*;

use crate::common::faction::Faction;

use super::messages::SpawnThreatRequest;

/// Marker for every entity owned by the threat pool.
#[derive(Component, Debug, Clone, Copy)]
pub struct PooledThreat;

/// Pool lifecycle. Only `Live` threats can hit, be tracked or be parried.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreatState {
    #[default]
    Inactive,
    Live,
    /// Marked for return to the pool at the end of the tick.
    Spent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatKind {
    /// Short-lived hitbox in front of an attacker. Never reflected.
    Melee,
    Projectile,
}

/// Weak reference to a threat.
///
/// Pooled entities are reused, so the entity id alone is not enough; the
/// generation is bumped on every activation and a mismatch means "gone".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreatHandle {
    pub entity: Entity,
    pub generation: u32,
}

impl ThreatHandle {
    /// True if `threat` is still the activation this handle was taken from.
    #[inline]
    pub fn refers_to(&self, threat: &Threat, state: ThreatState) -> bool {
        threat.generation == self.generation && state == ThreatState::Live
    }
}

#[derive(Component, Debug, Clone)]
pub struct Threat {
    pub kind: ThreatKind,
    pub damage: i32,
    pub knockback: f32,
    /// Current owner; flips once on reflection.
    pub owner: Faction,
    pub original_owner: Faction,
    pub reflected: bool,
    /// Attacker position at spawn time.
    pub source: Vec2,
    /// Actor this threat is homing on after a reflection.
    pub target: Option<Entity>,
    pub lifetime: Timer,
    pub generation: u32,
}

impl Threat {
    pub fn inactive() -> Self {
        Self {
            kind: ThreatKind::Projectile,
            damage: 0,
            knockback: 0.0,
            owner: Faction::Enemy,
            original_owner: Faction::Enemy,
            reflected: false,
            source: Vec2::ZERO,
            target: None,
            lifetime: Timer::from_seconds(0.0, TimerMode::Once),
            generation: 0,
        }
    }

    /// Re-arm for a new activation. Any handle taken before this call goes stale.
    pub fn activate(&mut self, req: &SpawnThreatRequest) {
        self.kind = req.kind;
        self.damage = req.damage;
        self.knockback = req.knockback;
        self.owner = req.owner;
        self.original_owner = req.owner;
        self.reflected = false;
        self.source = req.source;
        self.target = None;
        self.lifetime = Timer::from_seconds(req.lifetime.max(0.0), TimerMode::Once);
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    pub fn handle(&self, entity: Entity) -> ThreatHandle {
        ThreatHandle { entity, generation: self.generation }
    }

    #[inline]
    pub fn is_reflectable(&self) -> bool {
        self.kind == ThreatKind::Projectile && !self.reflected
    }

    #[inline]
    pub fn can_damage(&self, faction: Faction) -> bool {
        self.owner.is_hostile_to(faction)
    }

    /// Hand the threat to the other side and aim it at `target`.
    /// Returns false if it was already reflected.
    pub fn reflect(&mut self, target: Entity) -> bool {
        if self.reflected {
            return false;
        }
        self.reflected = true;
        self.owner = self.original_owner.opposing();
        self.target = Some(target);
        true
    }
}
