use drivescape_common::Color;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Orthographic depth volume a directional light renders its shadow map from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowCamera {
    /// Shadow map width and height in texels.
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    /// Half the width and height of the volume, centred on the light's target.
    pub half_extent: f32,
}

impl Default for ShadowCamera {
    fn default() -> Self {
        Self {
            map_size: 2048,
            near: 0.5,
            far: 100.0,
            half_extent: 30.0,
        }
    }
}

impl ShadowCamera {
    /// World to light clip space for a light at `position` aimed at the
    /// origin. Depth maps to `0..1`.
    pub fn view_projection(&self, position: Vec3) -> Mat4 {
        let up = if position.cross(Vec3::Y).length_squared() < 1e-6 {
            Vec3::Z
        } else {
            Vec3::Y
        };
        let h = self.half_extent;
        Mat4::orthographic_rh(-h, h, -h, h, self.near, self.far)
            * Mat4::look_at_rh(position, Vec3::ZERO, up)
    }
}

/// Light sources. Position and direction come from the owning node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Light {
    /// Uniform light from every direction.
    Ambient { color: Color, intensity: f32 },
    /// Parallel rays travelling from the node position towards the origin.
    Directional {
        color: Color,
        intensity: f32,
        shadow: Option<ShadowCamera>,
    },
    /// Omni light that fades to zero at `range`.
    Point {
        color: Color,
        intensity: f32,
        range: f32,
    },
}

impl Light {
    pub fn intensity(&self) -> f32 {
        match *self {
            Self::Ambient { intensity, .. }
            | Self::Directional { intensity, .. }
            | Self::Point { intensity, .. } => intensity,
        }
    }
}
