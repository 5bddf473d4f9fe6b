//! CPU-side mesh generation for the scene's primitive shapes.
//!
//! Triangles wind counter-clockwise when seen from outside, matching the
//! back-face culling of the mesh pipelines.

use bytemuck::{Pod, Zeroable};
use drivescape_common::Color;
use drivescape_scene::{Geometry, Shape};
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::{PI, TAU};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    fn push(&mut self, position: Vec3, normal: Vec3, uv: Vec2) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
            uv: uv.to_array(),
        });
        index
    }

    fn triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend_from_slice(&[a, b, c]);
    }

    fn bake(mut self, orientation: Quat) -> Self {
        if orientation != Quat::IDENTITY {
            for v in &mut self.vertices {
                v.position = (orientation * Vec3::from(v.position)).to_array();
                v.normal = (orientation * Vec3::from(v.normal)).to_array();
            }
        }
        self
    }
}

/// Either a shaded triangle mesh or a set of colored lines.
#[derive(Debug, Clone)]
pub enum ShapeMesh {
    Triangles(MeshData),
    Lines(Vec<LineVertex>),
}

/// Tessellate a geometry descriptor in its local space.
pub fn tessellate(geometry: &Geometry) -> ShapeMesh {
    let mesh = match geometry.shape {
        Shape::Box {
            width,
            height,
            depth,
        } => cuboid(Vec3::new(width, height, depth) * 0.5),
        Shape::Cylinder {
            radius_top,
            radius_bottom,
            height,
            segments,
        } => cylinder(radius_top, radius_bottom, height, segments.max(3)),
        Shape::Sphere { radius, segments } => sphere(radius, segments.max(3)),
        Shape::Plane { width, depth } => plane(width, depth),
        Shape::Grid {
            size,
            divisions,
            center_color,
            line_color,
        } => return ShapeMesh::Lines(grid(size, divisions.max(1), center_color, line_color)),
    };
    ShapeMesh::Triangles(mesh.bake(geometry.orientation))
}

fn cuboid(half: Vec3) -> MeshData {
    // (normal, u, v) with u x v = normal.
    const FACES: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
    ];
    let mut mesh = MeshData::default();
    for (normal, u, v) in FACES {
        let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
        let first = mesh.vertices.len() as u32;
        for (s, t) in corners {
            let position = (normal + u * s + v * t) * half;
            let uv = Vec2::new((s + 1.0) * 0.5, 1.0 - (t + 1.0) * 0.5);
            mesh.push(position, normal, uv);
        }
        mesh.triangle(first, first + 1, first + 2);
        mesh.triangle(first, first + 2, first + 3);
    }
    mesh
}

fn plane(width: f32, depth: f32) -> MeshData {
    let half = Vec3::new(width * 0.5, 0.0, depth * 0.5);
    let mut mesh = MeshData::default();
    for (s, t) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
        let position = Vec3::new(s, 0.0, -t) * half;
        let uv = Vec2::new((s + 1.0) * 0.5, 1.0 - (t + 1.0) * 0.5);
        mesh.push(position, Vec3::Y, uv);
    }
    mesh.triangle(0, 1, 2);
    mesh.triangle(0, 2, 3);
    mesh
}

fn cylinder(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> MeshData {
    let half = height * 0.5;
    let slope = if height > 0.0 {
        (radius_bottom - radius_top) / height
    } else {
        0.0
    };
    let mut mesh = MeshData::default();

    // Side: a top and a bottom vertex per column, seam duplicated for UVs.
    for i in 0..=segments {
        let u = i as f32 / segments as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let normal = Vec3::new(sin, slope, cos).normalize();
        mesh.push(
            Vec3::new(radius_top * sin, half, radius_top * cos),
            normal,
            Vec2::new(u, 0.0),
        );
        mesh.push(
            Vec3::new(radius_bottom * sin, -half, radius_bottom * cos),
            normal,
            Vec2::new(u, 1.0),
        );
    }
    for i in 0..segments {
        let (t0, b0) = (2 * i, 2 * i + 1);
        let (t1, b1) = (t0 + 2, b0 + 2);
        mesh.triangle(b0, b1, t1);
        if radius_top > 0.0 {
            mesh.triangle(b0, t1, t0);
        }
    }

    for (radius, y, normal) in [(radius_top, half, Vec3::Y), (radius_bottom, -half, Vec3::NEG_Y)] {
        if radius <= 0.0 {
            continue;
        }
        let center = mesh.push(Vec3::new(0.0, y, 0.0), normal, Vec2::splat(0.5));
        let ring = mesh.vertices.len() as u32;
        for i in 0..=segments {
            let (sin, cos) = (i as f32 / segments as f32 * TAU).sin_cos();
            mesh.push(
                Vec3::new(radius * sin, y, radius * cos),
                normal,
                Vec2::new(sin * 0.5 + 0.5, cos * 0.5 + 0.5),
            );
        }
        for i in 0..segments {
            let (a, b) = (ring + i, ring + i + 1);
            if normal.y > 0.0 {
                mesh.triangle(center, a, b);
            } else {
                mesh.triangle(center, b, a);
            }
        }
    }
    mesh
}

fn sphere(radius: f32, segments: u32) -> MeshData {
    let rings = segments;
    let mut mesh = MeshData::default();
    for iy in 0..=rings {
        let v = iy as f32 / rings as f32;
        let (sin_phi, cos_phi) = (v * PI).sin_cos();
        for ix in 0..=segments {
            let u = ix as f32 / segments as f32;
            let (sin_theta, cos_theta) = (u * TAU).sin_cos();
            let normal = Vec3::new(sin_phi * sin_theta, cos_phi, sin_phi * cos_theta);
            mesh.push(normal * radius, normal, Vec2::new(u, v));
        }
    }
    let stride = segments + 1;
    for iy in 0..rings {
        for ix in 0..segments {
            let a = iy * stride + ix;
            let b = a + 1;
            let d = a + stride;
            let c = d + 1;
            if iy + 1 < rings {
                mesh.triangle(d, c, b);
            }
            if iy > 0 {
                mesh.triangle(d, b, a);
            }
        }
    }
    mesh
}

/// Square grid of lines in the XZ plane; the two centre lines get their own
/// color.
pub fn grid(size: f32, divisions: u32, center_color: Color, line_color: Color) -> Vec<LineVertex> {
    let half = size * 0.5;
    let step = size / divisions as f32;
    let center = center_color.to_linear();
    let other = line_color.to_linear();
    let mut verts = Vec::with_capacity((divisions as usize + 1) * 4);
    for i in 0..=divisions {
        let k = -half + i as f32 * step;
        let color = if i * 2 == divisions { center } else { other };
        // Line along X, then along Z.
        verts.push(LineVertex {
            position: [-half, 0.0, k],
            color,
        });
        verts.push(LineVertex {
            position: [half, 0.0, k],
            color,
        });
        verts.push(LineVertex {
            position: [k, 0.0, -half],
            color,
        });
        verts.push(LineVertex {
            position: [k, 0.0, half],
            color,
        });
    }
    verts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn triangles(geometry: Geometry) -> MeshData {
        match tessellate(&geometry) {
            ShapeMesh::Triangles(mesh) => mesh,
            ShapeMesh::Lines(_) => panic!("expected triangles"),
        }
    }

    /// Every non-degenerate triangle faces the way its vertex normals point.
    fn assert_outward(mesh: &MeshData) {
        assert_eq!(mesh.indices.len() % 3, 0);
        for tri in mesh.indices.chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let (pa, pb, pc) = (Vec3::from(a.position), Vec3::from(b.position), Vec3::from(c.position));
            let face = (pb - pa).cross(pc - pa);
            if face.length() < 1e-6 {
                continue;
            }
            let normal = Vec3::from(a.normal) + Vec3::from(b.normal) + Vec3::from(c.normal);
            assert!(face.dot(normal) > 0.0, "inward triangle {tri:?}");
        }
    }

    #[test]
    fn box_has_24_vertices_and_winds_outward() {
        let mesh = triangles(Geometry::cuboid(3.0, 1.0, 1.5));
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);
        assert_outward(&mesh);
        let max_x = mesh.vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
        assert_eq!(max_x, 1.5);
    }

    #[test]
    fn cylinder_and_cone_wind_outward() {
        assert_outward(&triangles(Geometry::cylinder(1.2, 4.0, 10)));
        assert_outward(&triangles(Geometry::cone(1.5, 3.0, 8)));
    }

    #[test]
    fn sphere_winds_outward_and_sits_on_radius() {
        let mesh = triangles(Geometry::sphere(2.0, 8));
        assert_outward(&mesh);
        for v in &mesh.vertices {
            assert!((Vec3::from(v.position).length() - 2.0).abs() < 1e-5);
        }
    }

    #[test]
    fn plane_faces_up() {
        let mesh = triangles(Geometry::new(Shape::Plane {
            width: 200.0,
            depth: 200.0,
        }));
        assert_outward(&mesh);
        assert!(mesh.vertices.iter().all(|v| v.normal == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn baked_wheel_lies_along_x() {
        let mesh = triangles(Geometry::cylinder(0.4, 0.3, 16).baked(Quat::from_rotation_z(FRAC_PI_2)));
        assert_outward(&mesh);
        let max_x = mesh.vertices.iter().map(|v| v.position[0].abs()).fold(0.0, f32::max);
        let max_y = mesh.vertices.iter().map(|v| v.position[1].abs()).fold(0.0, f32::max);
        assert!((max_x - 0.15).abs() < 1e-5);
        assert!((max_y - 0.4).abs() < 1e-5);
    }

    #[test]
    fn grid_centre_lines_use_centre_color() {
        let lines = grid(200.0, 50, Color::BLACK, Color::hex(0x333333));
        assert_eq!(lines.len(), 51 * 4);
        let centre: Vec<_> = lines.iter().filter(|v| v.color == Color::BLACK.to_linear()).collect();
        assert_eq!(centre.len(), 4);
        assert!(centre.iter().all(|v| v.position[0] == 0.0 || v.position[2] == 0.0));
    }
}
