use bevy::prelude::*;

use crate::common::faction::Faction;

use super::damage::Hit;

/// Queue a hit against `target`; resolved in `CombatSet::Resolve`.
#[derive(Message, Debug, Clone, Copy)]
pub struct DamageRequest {
    pub target: Entity,
    pub hit: Hit,
}

/// Written exactly once per actor, on the hit that takes hp to zero.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorDied {
    pub entity: Entity,
    pub faction: Faction,
}
