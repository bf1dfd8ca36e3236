//! Collision layers.

use avian2d::prelude::*;

use crate::common::faction::Faction;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    World,
    Player,
    Enemy,
    PlayerThreat,
    EnemyThreat,
}

impl Layer {
    /// Body layer for an actor of the given faction.
    #[inline]
    pub fn actor(faction: Faction) -> Self {
        match faction {
            Faction::Player => Layer::Player,
            Faction::Enemy => Layer::Enemy,
        }
    }

    /// Layer a threat owned by `faction` lives on.
    #[inline]
    pub fn threat(faction: Faction) -> Self {
        match faction {
            Faction::Player => Layer::PlayerThreat,
            Faction::Enemy => Layer::EnemyThreat,
        }
    }
}

/// Layers for a live actor body.
pub fn actor_layers(faction: Faction) -> CollisionLayers {
    CollisionLayers::new(
        Layer::actor(faction),
        [
            Layer::World,
            Layer::actor(faction.opposing()),
            Layer::threat(faction.opposing()),
        ],
    )
}

/// Layers for an actor that should no longer interact with anything.
///
/// Membership is kept; filters are cleared so no new contacts start.
#[inline]
pub fn non_interacting_layers(faction: Faction) -> CollisionLayers {
    CollisionLayers::new(Layer::actor(faction), [] as [Layer; 0])
}

/// Layers for a live threat owned by `owner`: it hits walls and opposing actors.
pub fn live_threat_layers(owner: Faction) -> CollisionLayers {
    CollisionLayers::new(
        Layer::threat(owner),
        [Layer::World, Layer::actor(owner.opposing())],
    )
}

/// Layers for static level geometry.
pub fn world_layers() -> CollisionLayers {
    CollisionLayers::new(
        Layer::World,
        [Layer::Player, Layer::Enemy, Layer::PlayerThreat, Layer::EnemyThreat],
    )
}

/// Pooled threats collide with nothing.
#[inline]
pub fn inactive_threat_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::EnemyThreat, [] as [Layer; 0])
}

#[inline]
pub fn is_in_layer(layers: &CollisionLayers, layer: Layer) -> bool {
    layers.memberships.has_all(layer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflected_threat_switches_to_player_side_filters() {
        let enemy_shot = live_threat_layers(Faction::Enemy);
        assert!(enemy_shot.filters.has_all(Layer::Player));
        assert!(!enemy_shot.filters.has_all(Layer::Enemy));

        let reflected = live_threat_layers(Faction::Player);
        assert!(is_in_layer(&reflected, Layer::PlayerThreat));
        assert!(reflected.filters.has_all(Layer::Enemy));
        assert!(!reflected.filters.has_all(Layer::Player));
    }

    #[test]
    fn dead_and_pooled_layers_filter_nothing() {
        for layers in [non_interacting_layers(Faction::Enemy), inactive_threat_layers()] {
            assert!(!layers.filters.has_all(Layer::World));
            assert!(!layers.filters.has_all(Layer::Player));
            assert!(!layers.filters.has_all(Layer::Enemy));
        }
    }
}
