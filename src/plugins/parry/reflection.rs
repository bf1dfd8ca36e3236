//! Reflection: what happens to a threat a successful parry touches.

use bevy::prelude::*;

use crate::common::faction::Faction;
use crate::plugins::threats::Threat;

/// A live actor a reflected threat could be sent at.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub entity: Entity,
    pub position: Vec2,
    pub faction: Faction,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Owner flipped; fly along `direction` (unit vector) at `target`.
    Reflected { target: Entity, direction: Vec2 },
    /// No valid target, or the threat cannot be reflected: remove it.
    Neutralized,
    /// Already reflected earlier; nothing changes.
    AlreadyReflected,
}

/// Resolve a parried threat.
///
/// Projectiles go to the nearest actor on the threat's original side within
/// `range` of the defender (first candidate wins ties). Melee hitboxes and
/// projectiles with nobody in range are neutralized.
pub fn resolve(
    threat: &mut Threat,
    threat_pos: Vec2,
    defender_pos: Vec2,
    range: f32,
    candidates: impl IntoIterator<Item = Candidate>,
) -> Resolution {
    if threat.reflected {
        return Resolution::AlreadyReflected;
    }
    if !threat.is_reflectable() {
        return Resolution::Neutralized;
    }

    let hostile_side = threat.original_owner;
    let mut best: Option<(Candidate, f32)> = None;
    for c in candidates {
        if c.faction != hostile_side {
            continue;
        }
        let d = c.position.distance(defender_pos);
        if d > range {
            continue;
        }
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((c, d));
        }
    }

    let Some((target, _)) = best else {
        return Resolution::Neutralized;
    };

    threat.reflect(target.entity);
    let direction = (target.position - threat_pos)
        .try_normalize()
        .unwrap_or_else(|| (target.position - defender_pos).try_normalize().unwrap_or(Vec2::X));
    Resolution::Reflected { target: target.entity, direction }
}
