//! Scene configuration: JSON file with full defaults, so a partial file
//! only overrides what it names.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadConfig {
    /// Slab half extents (m).
    pub half_extents: [f32; 3],
    /// Slab center height; the drivable top sits at `center_y + half_extents[1]`.
    pub center_y: f32,
}

impl Default for RoadConfig {
    fn default() -> Self {
        Self { half_extents: [7.5, 0.5, 250.0], center_y: -0.5 }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChassisConfig {
    pub half_extents: [f32; 3],
    pub mass: f32,
    /// Spawn height of the chassis center.
    pub start_height: f32,
}

impl Default for ChassisConfig {
    fn default() -> Self {
        Self { half_extents: [1.0, 0.4, 2.0], mass: 20.0, start_height: 0.93 }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelConfig {
    /// Lateral mount offset from the chassis center (m).
    pub track: f32,
    /// Longitudinal mount offset from the chassis center (m).
    pub wheelbase: f32,
    /// Vertical mount offset, negative = below the chassis center (m).
    pub mount_height: f32,
    pub rest_len: f32,
    pub k_spring: f32,
    pub k_damp: f32,
    pub radius: f32,
    pub mu_long: f32,
    pub mu_lat: f32,
    pub ang_damping: f32,
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            track: 1.3,
            wheelbase: 1.4,
            mount_height: -0.4,
            rest_len: 0.3,
            k_spring: 8000.0,
            k_damp: 400.0,
            radius: 0.25,
            mu_long: 0.9,
            mu_lat: 0.9,
            ang_damping: 0.4,
        }
    }
}

#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub gravity: [f32; 3],
    pub road: RoadConfig,
    pub chassis: ChassisConfig,
    pub wheel: WheelConfig,
    /// Drive force a held throttle key applies to each front wheel (N).
    pub max_force: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.82, 0.0],
            road: RoadConfig::default(),
            chassis: ChassisConfig::default(),
            wheel: WheelConfig::default(),
            max_force: 500.0,
        }
    }
}

impl SceneConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading scene config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing scene config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test] fn defaults_round_trip() {
        let cfg = SceneConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SceneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.chassis.mass, cfg.chassis.mass);
        assert_eq!(back.wheel.k_spring, cfg.wheel.k_spring);
    }

    #[test] fn partial_file_keeps_defaults() {
        let cfg: SceneConfig =
            serde_json::from_str(r#"{ "max_force": 750.0, "chassis": { "mass": 30.0 } }"#).unwrap();
        assert_eq!(cfg.max_force, 750.0);
        assert_eq!(cfg.chassis.mass, 30.0);
        // Untouched fields fall back.
        assert_eq!(cfg.chassis.half_extents, [1.0, 0.4, 2.0]);
        assert_eq!(cfg.gravity, [0.0, -9.82, 0.0]);
    }
}
