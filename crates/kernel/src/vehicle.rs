use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Number of wheels on the vehicle, in rig order.
pub const WHEEL_COUNT: usize = 4;

/// Logical pose and motion of the vehicle.
///
/// Owned by the simulation; scene nodes only mirror it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Vec3,
    /// Yaw around +Y, radians.
    pub heading: f32,
    pub velocity: Vec3,
    /// Yaw rate, rad/s.
    pub angular_velocity: f32,
    /// Accumulated spin angle of each wheel, radians.
    pub wheel_spin: [f32; WHEEL_COUNT],
}

impl VehicleState {
    /// A motionless vehicle at `position` facing the default heading.
    pub fn at_rest(position: Vec3) -> Self {
        Self {
            position,
            heading: 0.0,
            velocity: Vec3::ZERO,
            angular_velocity: 0.0,
            wheel_spin: [0.0; WHEEL_COUNT],
        }
    }

    /// Velocity on the ground plane as `(x, z)`.
    pub fn planar_velocity(&self) -> Vec2 {
        Vec2::new(self.velocity.x, self.velocity.z)
    }

    pub fn planar_speed(&self) -> f32 {
        self.planar_velocity().length()
    }
}
