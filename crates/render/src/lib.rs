//! Rendering Adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - Renderers read the scene graph; they never mutate it.
//! - Render output derives only from the scene graph and the view.
//! - Camera controllers own view state only; they never touch the scene.

mod camera;
mod renderer;

pub use camera::{CameraControl, FixedCamera};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    "drivescape-render v0.1.0"
}
