//! Factions: which side an actor or threat belongs to.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Enemy,
}

impl Faction {
    #[inline]
    pub fn opposing(self) -> Self {
        match self {
            Faction::Player => Faction::Enemy,
            Faction::Enemy => Faction::Player,
        }
    }

    #[inline]
    pub fn is_hostile_to(self, other: Faction) -> bool {
        self != other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposing_is_an_involution() {
        for f in [Faction::Player, Faction::Enemy] {
            assert_ne!(f.opposing(), f);
            assert_eq!(f.opposing().opposing(), f);
            assert!(f.is_hostile_to(f.opposing()));
            assert!(!f.is_hostile_to(f));
        }
    }
}
