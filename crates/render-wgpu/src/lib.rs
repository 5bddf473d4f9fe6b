//! wgpu render backend for the driving scene.
//!
//! Tessellates the scene graph's primitive shapes, uploads the procedural
//! textures once, and shades with ambient, directional and point lights plus
//! linear fog. The orbit camera implements the renderer-agnostic
//! [`drivescape_render::CameraControl`].
//!
//! # Invariants
//! - Renderer never mutates the scene graph.
//! - Camera motion is not part of the simulation.
//! - A node's geometry is tessellated once and cached by node id.

mod gpu;
pub mod mesh;
mod orbit;
mod shaders;

pub use gpu::WgpuRenderer;
pub use orbit::{CameraError, OrbitCamera, OrbitConfig};
