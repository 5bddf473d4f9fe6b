use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading a tuning file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Every constant the motion model uses.
///
/// Deserializes with defaults, so a tuning file only has to list the values
/// it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionParams {
    /// Target planar speed for straight movement, units/s.
    pub speed: f32,
    /// Target yaw rate while a turn key is held, rad/s.
    pub turn_speed: f32,
    /// Fraction of `speed` used on each axis for diagonal movement.
    pub diagonal_factor: f32,
    /// Downward acceleration while gravity is on, units/s².
    pub gravity: f32,
    /// Lowest altitude the vehicle can reach.
    pub ground_level: f32,
    /// Impact speed above which the vehicle bounces instead of stopping.
    pub bounce_threshold: f32,
    /// Fraction of vertical speed kept (and reflected) on a bounce.
    pub bounce_factor: f32,
    /// Per-frame multiplier on planar velocity while on the ground.
    pub friction: f32,
    /// Height above `ground_level` still counted as touching the ground.
    pub ground_contact_band: f32,
    /// Planar components below this magnitude snap to zero under friction.
    pub stop_threshold: f32,
    /// Wheels only spin above this planar speed.
    pub wheel_spin_min_speed: f32,
    /// Visual gearing from linear speed to wheel spin rate.
    pub gearing_ratio: f32,
    /// Per-frame multiplier on yaw rate while nearly stationary.
    pub angular_damping: f32,
    /// Planar speed (per axis) below which yaw damping applies.
    pub angular_damping_speed: f32,
    /// Yaw rates below this magnitude snap to zero.
    pub angular_stop_threshold: f32,
    /// Longest frame time fed to a single integration step, seconds.
    pub max_dt: f32,
    /// Position the vehicle spawns at and returns to on reset.
    pub spawn_position: Vec3,
}

impl Default for MotionParams {
    fn default() -> Self {
        Self {
            speed: 8.0,
            turn_speed: 3.0,
            diagonal_factor: 0.7,
            gravity: 9.8,
            ground_level: -1.5,
            bounce_threshold: 1.5,
            bounce_factor: 0.6,
            friction: 0.93,
            ground_contact_band: 0.1,
            stop_threshold: 0.05,
            wheel_spin_min_speed: 0.1,
            gearing_ratio: 4.0,
            angular_damping: 0.9,
            angular_damping_speed: 0.1,
            angular_stop_threshold: 0.01,
            max_dt: 0.1,
            spawn_position: Vec3::new(0.0, 2.0, 0.0),
        }
    }
}

impl MotionParams {
    /// Load and validate a JSON tuning file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path.as_ref())?;
        let params: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        params.validate()?;
        tracing::info!(path = %path.as_ref().display(), "loaded motion tuning");
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dt.is_nan() || self.max_dt <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "max_dt",
                reason: "must be positive",
            });
        }
        if !(0.0..=1.0).contains(&self.friction) || self.friction == 0.0 {
            return Err(ConfigError::Invalid {
                field: "friction",
                reason: "must be in (0, 1]",
            });
        }
        if !(0.0..1.0).contains(&self.angular_damping) {
            return Err(ConfigError::Invalid {
                field: "angular_damping",
                reason: "must be in [0, 1)",
            });
        }
        if self.spawn_position.y < self.ground_level {
            return Err(ConfigError::Invalid {
                field: "spawn_position",
                reason: "must not be below ground_level",
            });
        }
        Ok(())
    }
}
