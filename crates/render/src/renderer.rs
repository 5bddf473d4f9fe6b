use drivescape_scene::{Light, NodeKind, SceneGraph, Shape};
use glam::{Mat4, Vec3};
use std::fmt::Write;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Point the camera is looking at.
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    /// Width over height.
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 8.0, 15.0),
            target: Vec3::ZERO,
            fov_degrees: 75.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl RenderView {
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene graph and a view, then produces output. It
/// never mutates the scene; the application owns it.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame from the given scene and view.
    fn render(&self, scene: &SceneGraph, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable listing of what would be drawn.
///
/// Used by the headless CLI and for testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn shape_label(shape: &Shape) -> &'static str {
    match shape {
        Shape::Box { .. } => "box",
        Shape::Cylinder { radius_top, .. } if *radius_top == 0.0 => "cone",
        Shape::Cylinder { .. } => "cylinder",
        Shape::Sphere { .. } => "sphere",
        Shape::Plane { .. } => "plane",
        Shape::Grid { .. } => "grid",
    }
}

fn light_label(light: &Light) -> &'static str {
    match light {
        Light::Ambient { .. } => "ambient",
        Light::Directional { .. } => "directional",
        Light::Point { .. } => "point",
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &SceneGraph, view: &RenderView) -> String {
        let meshes = scene.visible_meshes();
        let lights = scene.visible_lights();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene ({} nodes, {} visible meshes, {} lights) ===",
            scene.len(),
            meshes.len(),
            lights.len()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            view.eye.x, view.eye.y, view.eye.z, view.target.x, view.target.y, view.target.z, view.fov_degrees
        );

        for light in &lights {
            let p = light.position;
            let _ = writeln!(
                out,
                "  light {:<11} intensity={:.1} pos=({:.2}, {:.2}, {:.2})",
                light_label(&light.light),
                light.light.intensity(),
                p.x,
                p.y,
                p.z
            );
        }

        // Top-level nodes only: children are summarised by their group.
        for (id, node) in scene.nodes().filter(|(_, n)| n.parent.is_none()) {
            if matches!(node.kind, NodeKind::Light(_)) || !scene.is_visible(id) {
                continue;
            }
            let p = node.transform.position;
            let kind = match &node.kind {
                NodeKind::Mesh { geometry, .. } => shape_label(&geometry.shape),
                _ => "group",
            };
            let _ = writeln!(
                out,
                "  [{:>3}] {:<8} {:<14} pos=({:.2}, {:.2}, {:.2}) children={}",
                id.0,
                kind,
                node.name,
                p.x,
                p.y,
                p.z,
                node.children.len()
            );
        }

        tracing::trace!(bytes = out.len(), "debug listing rendered");
        out
    }
}
