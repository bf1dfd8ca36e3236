//! Tunable gameplay constants.
//!
//! Distances are in pixels, durations in seconds. Defaults match the shipped
//! `assets/tunables.ron`; the file only needs to list what it overrides.

use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TunablesError {
    #[error("failed to read tunables file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse tunables: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("invalid tunables: {0}")]
    Invalid(String),
}

#[derive(Resource, Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    pub pixels_per_meter: f32,
    pub threat_pool_capacity: usize,
    pub parry: ParryTunables,
    pub player: PlayerTunables,
    pub enemy: EnemyTunables,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            pixels_per_meter: 20.0,
            threat_pool_capacity: 256,
            parry: ParryTunables::default(),
            player: PlayerTunables::default(),
            enemy: EnemyTunables::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParryTunables {
    pub startup: f32,
    pub active: f32,
    pub success_cooldown: f32,
    pub failure_cooldown: f32,
    pub perfect_window: f32,
    /// Radius of the sensor that feeds the threat tracker.
    pub detection_radius: f32,
    /// Radius of the hit-zone enabled during the Active phase.
    pub hit_zone_radius: f32,
    pub reflection_range: f32,
    pub perfect_reflection_range: f32,
    pub reflected_speed_scale: f32,
}

impl Default for ParryTunables {
    fn default() -> Self {
        Self {
            startup: 0.05,
            active: 0.2,
            success_cooldown: 0.25,
            failure_cooldown: 0.6,
            perfect_window: 0.2,
            detection_radius: 140.0,
            hit_zone_radius: 56.0,
            reflection_range: 420.0,
            perfect_reflection_range: 640.0,
            reflected_speed_scale: 1.5,
        }
    }
}

/// Damage-related settings shared by every actor kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalsTunables {
    pub max_hp: i32,
    pub hit_cooldown: f32,
    pub knockback_recovery: f32,
    pub death_delay: f32,
}

impl Default for VitalsTunables {
    fn default() -> Self {
        Self { max_hp: 3, hit_cooldown: 0.7, knockback_recovery: 0.3, death_delay: 4.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTunables {
    pub vitals: VitalsTunables,
    pub speed: f32,
    pub attack_damage: i32,
    pub attack_reach: f32,
    pub attack_radius: f32,
    pub attack_duration: f32,
    pub attack_knockback: f32,
    pub attack_cooldown: f32,
}

impl Default for PlayerTunables {
    fn default() -> Self {
        Self {
            vitals: VitalsTunables {
                max_hp: 5,
                hit_cooldown: 1.5,
                knockback_recovery: 0.3,
                death_delay: 2.0,
            },
            speed: 260.0,
            attack_damage: 1,
            attack_reach: 36.0,
            attack_radius: 28.0,
            attack_duration: 0.2,
            attack_knockback: 260.0,
            attack_cooldown: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeTunables {
    pub damage: i32,
    pub cooldown: f32,
    pub duration: f32,
    pub range: f32,
    pub radius: f32,
    pub knockback: f32,
}

impl Default for MeleeTunables {
    fn default() -> Self {
        Self { damage: 1, cooldown: 2.0, duration: 0.5, range: 60.0, radius: 20.0, knockback: 300.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedTunables {
    pub damage: i32,
    pub cooldown: f32,
    pub wind_up: f32,
    pub speed: f32,
    pub lifetime: f32,
    pub knockback: f32,
}

impl Default for RangedTunables {
    fn default() -> Self {
        Self { damage: 1, cooldown: 2.0, wind_up: 0.7, speed: 320.0, lifetime: 5.0, knockback: 180.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTunables {
    pub vitals: VitalsTunables,
    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub vision_range: f32,
    /// Melee enemies stop closing in at this distance.
    pub stopping_distance: f32,
    /// Ranged enemies back off when the target is closer than this.
    pub retreat_distance: f32,
    /// Ranged enemies close in until this far inside their vision range.
    pub chase_stop_margin: f32,
    pub lost_player_time: f32,
    pub waypoint_reach: f32,
    pub alert_radius: f32,
    pub melee: MeleeTunables,
    pub ranged: RangedTunables,
}

impl Default for EnemyTunables {
    fn default() -> Self {
        Self {
            vitals: VitalsTunables::default(),
            patrol_speed: 80.0,
            chase_speed: 120.0,
            vision_range: 260.0,
            stopping_distance: 50.0,
            retreat_distance: 100.0,
            chase_stop_margin: 60.0,
            lost_player_time: 2.0,
            waypoint_reach: 8.0,
            alert_radius: 400.0,
            melee: MeleeTunables::default(),
            ranged: RangedTunables::default(),
        }
    }
}

impl Tunables {
    pub fn from_ron(text: &str) -> Result<Self, TunablesError> {
        let tunables: Tunables = ron::from_str(text)?;
        tunables.validate()?;
        Ok(tunables)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TunablesError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron(&text)
    }

    /// Load from `path`, falling back to defaults (with a warning) on any error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(t) => t,
            Err(e) => {
                warn!("using default tunables ({}): {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), TunablesError> {
        let p = &self.parry;
        let durations = [
            ("parry.startup", p.startup),
            ("parry.active", p.active),
            ("parry.success_cooldown", p.success_cooldown),
            ("parry.failure_cooldown", p.failure_cooldown),
            ("parry.perfect_window", p.perfect_window),
            ("player.vitals.hit_cooldown", self.player.vitals.hit_cooldown),
            ("player.vitals.knockback_recovery", self.player.vitals.knockback_recovery),
            ("player.attack_cooldown", self.player.attack_cooldown),
            ("enemy.vitals.hit_cooldown", self.enemy.vitals.hit_cooldown),
            ("enemy.vitals.knockback_recovery", self.enemy.vitals.knockback_recovery),
            ("enemy.lost_player_time", self.enemy.lost_player_time),
            ("enemy.melee.duration", self.enemy.melee.duration),
            ("enemy.ranged.wind_up", self.enemy.ranged.wind_up),
        ];
        if let Some((name, v)) = durations.iter().find(|(_, v)| !(*v >= 0.0)) {
            return Err(TunablesError::Invalid(format!("{name} must be >= 0, got {v}")));
        }

        if p.failure_cooldown <= p.success_cooldown {
            return Err(TunablesError::Invalid(format!(
                "parry.failure_cooldown ({}) must be longer than parry.success_cooldown ({})",
                p.failure_cooldown, p.success_cooldown
            )));
        }
        if p.hit_zone_radius > p.detection_radius {
            return Err(TunablesError::Invalid(format!(
                "parry.hit_zone_radius ({}) must not exceed parry.detection_radius ({})",
                p.hit_zone_radius, p.detection_radius
            )));
        }
        if self.threat_pool_capacity == 0 {
            return Err(TunablesError::Invalid("threat_pool_capacity must be > 0".into()));
        }
        if self.player.vitals.max_hp <= 0 || self.enemy.vitals.max_hp <= 0 {
            return Err(TunablesError::Invalid("max_hp must be > 0".into()));
        }
        Ok(())
    }
}
