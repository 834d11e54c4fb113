//! Race tuning: track geometry, obstacles, marble layout, physics and camera.
//!
//! Every field has a default, so a JSON file only needs the values it
//! changes. Vectors are stored as `[x, y, z]` arrays.

use std::f32::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::physics::Vec3;

/// Error loading or validating a [`RaceConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Inclined track plane and its guardrails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    pub width: f32,
    pub length: f32,
    /// Plane rotation about the x axis, in radians (`PI / 2` is flat).
    pub tilt: f32,
    pub rail_offset: f32,
    pub rail_thickness: f32,
    pub rail_height: f32,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            width: 40.0,
            length: 400.0,
            tilt: PI / 2.2,
            rail_offset: 20.0,
            rail_thickness: 5.0,
            rail_height: 500.0,
        }
    }
}

/// Randomly scattered cylindrical pegs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub count: usize,
    pub radius_top: f32,
    pub radius_bottom: f32,
    pub height: f32,
    /// Height of the peg centers.
    pub center_y: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            count: 100,
            radius_top: 1.0,
            radius_bottom: 2.0,
            height: 50.0,
            center_y: 1.0,
        }
    }
}

/// Marble size and starting grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarbleLayoutConfig {
    pub radius: f32,
    /// Lateral distance between neighbouring start slots.
    pub spacing: f32,
    /// Slot index that sits on `x = 0`.
    pub center_slot: f32,
    pub start_y: f32,
    pub start_z: f32,
    pub launch_velocity: [f32; 3],
    /// Label offset above the marble center.
    pub label_height: f32,
}

impl Default for MarbleLayoutConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            spacing: 2.0,
            center_slot: 5.0,
            start_y: 50.0,
            start_z: -200.0,
            launch_velocity: [0.0, 0.0, 5.0],
            label_height: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub gravity: [f32; 3],
    /// Seconds simulated per frame.
    pub time_step: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0, -9.81, 0.0],
            time_step: 1.0 / 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Offset from the lead marble while following.
    pub follow_offset: [f32; 3],
    /// Fraction of the remaining distance covered each frame.
    pub follow_factor: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 10.0, 15.0],
            follow_offset: [0.0, 5.0, -10.0],
            follow_factor: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    pub color: crate::marble::Color,
    pub intensity: f32,
    /// Direction the light shines from; normalized on use.
    pub direction: [f32; 3],
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            color: crate::marble::Color::rgb(255, 255, 255),
            intensity: 1.0,
            direction: [5.0, 5.0, 5.0],
        }
    }
}

/// Complete race configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub track: TrackConfig,
    pub obstacles: ObstacleConfig,
    pub marbles: MarbleLayoutConfig,
    pub physics: PhysicsConfig,
    /// Progress (z) a marble must reach to win.
    pub finish_line_z: f32,
    pub camera: CameraConfig,
    pub light: LightConfig,
    /// Seed for obstacle placement; random when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            track: TrackConfig::default(),
            obstacles: ObstacleConfig::default(),
            marbles: MarbleLayoutConfig::default(),
            physics: PhysicsConfig::default(),
            finish_line_z: 180.0,
            camera: CameraConfig::default(),
            light: LightConfig::default(),
            seed: None,
        }
    }
}

impl RaceConfig {
    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reads a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("physics.time_step", self.physics.time_step),
            ("marbles.radius", self.marbles.radius),
            ("track.width", self.track.width),
            ("track.length", self.track.length),
            ("camera.fov", self.camera.fov),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let factor = self.camera.follow_factor;
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.follow_factor must be in (0, 1], got {factor}"
            )));
        }

        if self.camera.near <= 0.0 || self.camera.far <= self.camera.near {
            return Err(ConfigError::Invalid(
                "camera clip planes must satisfy 0 < near < far".to_string(),
            ));
        }

        Ok(())
    }

    pub fn gravity(&self) -> Vec3 {
        Vec3::from(self.physics.gravity)
    }

    pub fn launch_velocity(&self) -> Vec3 {
        Vec3::from(self.marbles.launch_velocity)
    }

    /// Starting position of the marble in roster slot `index`.
    #[allow(clippy::cast_precision_loss)]
    pub fn start_position(&self, index: usize) -> Vec3 {
        let layout = &self.marbles;
        Vec3::new(
            (index as f32 - layout.center_slot) * layout.spacing,
            layout.start_y,
            layout.start_z,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RaceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.finish_line_z, 180.0);
        assert_eq!(config.obstacles.count, 100);
    }

    #[test]
    fn test_start_slots() {
        let config = RaceConfig::default();
        assert_eq!(config.start_position(0), Vec3::new(-10.0, 50.0, -200.0));
        assert_eq!(config.start_position(5), Vec3::new(0.0, 50.0, -200.0));
        assert_eq!(config.start_position(9), Vec3::new(8.0, 50.0, -200.0));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RaceConfig::from_json(r#"{ "obstacles": { "count": 0 }, "seed": 7 }"#).unwrap();
        assert_eq!(config.obstacles.count, 0);
        assert_eq!(config.obstacles.height, 50.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.track, TrackConfig::default());
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = RaceConfig::default();
        config.finish_line_z = 90.0;
        config.light.color = crate::marble::Color::YELLOW;
        let json = config.to_json().unwrap();
        assert!(json.contains("\"#ffff00\""));
        assert_eq!(RaceConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = RaceConfig::from_json(r#"{ "physics": { "time_step": 0.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("time_step")));

        let err = RaceConfig::from_json(r#"{ "camera": { "follow_factor": 1.5 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RaceConfig::from_json(r#"{ "camera": { "near": 10.0, "far": 5.0 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RaceConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RaceConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
