//! Per-defender set of hostile threats currently inside the detection zone.

use bevy::prelude::*;

use crate::common::faction::Faction;
use crate::plugins::threats::ThreatHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedThreat {
    pub handle: ThreatHandle,
    /// Fixed-clock time the threat first entered the zone.
    pub first_seen: f32,
}

/// Insertion-ordered so ties on distance resolve to whoever arrived first.
#[derive(Component, Debug, Default, Clone)]
pub struct ThreatTracker {
    tracked: Vec<TrackedThreat>,
}

impl ThreatTracker {
    /// Start tracking a threat. Friendly or already-tracked threats are ignored.
    pub fn on_threat_entered(
        &mut self,
        handle: ThreatHandle,
        owner: Faction,
        defender: Faction,
        now: f32,
    ) -> bool {
        if !owner.is_hostile_to(defender) || self.contains(handle) {
            return false;
        }
        self.tracked.push(TrackedThreat { handle, first_seen: now });
        true
    }

    /// Stop tracking whatever lives on `entity`. Returns true if something was removed.
    pub fn on_threat_exited(&mut self, entity: Entity) -> bool {
        let before = self.tracked.len();
        self.tracked.retain(|t| t.handle.entity != entity);
        self.tracked.len() != before
    }

    #[inline]
    pub fn contains(&self, handle: ThreatHandle) -> bool {
        self.tracked.iter().any(|t| t.handle == handle)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedThreat> {
        self.tracked.iter()
    }

    /// Closest live threat to `origin` and its distance, pruning stale entries on the way.
    pub fn nearest(
        &mut self,
        origin: Vec2,
        mut position_of: impl FnMut(ThreatHandle) -> Option<Vec2>,
    ) -> Option<(TrackedThreat, f32)> {
        let mut best: Option<(TrackedThreat, f32)> = None;
        self.tracked.retain(|t| {
            let Some(pos) = position_of(t.handle) else {
                return false;
            };
            let d = pos.distance(origin);
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((*t, d));
            }
            true
        });
        best
    }

    pub fn clear(&mut self) {
        self.tracked.clear();
    }
}
