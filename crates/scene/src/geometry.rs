use drivescape_common::Color;
use glam::Quat;
use serde::{Deserialize, Serialize};

/// Primitive shapes, centred on the local origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    /// Capped cylinder along local +Y. A zero top radius makes a cone.
    Cylinder {
        radius_top: f32,
        radius_bottom: f32,
        height: f32,
        segments: u32,
    },
    Sphere {
        radius: f32,
        segments: u32,
    },
    /// Flat quad in the XZ plane facing +Y.
    Plane {
        width: f32,
        depth: f32,
    },
    /// Square line grid in the XZ plane.
    Grid {
        size: f32,
        divisions: u32,
        center_color: Color,
        line_color: Color,
    },
}

/// A shape plus a rotation baked into its vertices.
///
/// The bake is separate from the node transform, so a node can spin a wheel
/// about its own X axis while the cylinder itself lies along X.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub shape: Shape,
    pub orientation: Quat,
}

impl Geometry {
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            orientation: Quat::IDENTITY,
        }
    }

    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Self::new(Shape::Box {
            width,
            height,
            depth,
        })
    }

    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        Self::new(Shape::Cylinder {
            radius_top: radius,
            radius_bottom: radius,
            height,
            segments,
        })
    }

    pub fn cone(radius: f32, height: f32, segments: u32) -> Self {
        Self::new(Shape::Cylinder {
            radius_top: 0.0,
            radius_bottom: radius,
            height,
            segments,
        })
    }

    pub fn sphere(radius: f32, segments: u32) -> Self {
        Self::new(Shape::Sphere { radius, segments })
    }

    pub fn baked(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn is_lines(&self) -> bool {
        matches!(self.shape, Shape::Grid { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cone_is_a_pointed_cylinder() {
        let g = Geometry::cone(1.5, 3.0, 8);
        assert!(matches!(
            g.shape,
            Shape::Cylinder { radius_top, radius_bottom, .. } if radius_top == 0.0 && radius_bottom == 1.5
        ));
    }

    #[test]
    fn only_grids_are_lines() {
        assert!(!Geometry::cuboid(1.0, 1.0, 1.0).is_lines());
        let grid = Geometry::new(Shape::Grid {
            size: 10.0,
            divisions: 2,
            center_color: Color::BLACK,
            line_color: Color::WHITE,
        });
        assert!(grid.is_lines());
    }
}
