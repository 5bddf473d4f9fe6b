//! Texture Synthesizer: procedural raster generation for the scene materials.
//!
//! Textures are painted on a CPU [`Canvas`] with source-over compositing and
//! handed to the scene builder as plain RGBA8 buffers.
//!
//! # Invariants
//! - Each texture is independent of the others and can be regenerated alone.
//! - Given the same random source, regeneration produces identical pixels.

mod canvas;
mod synth;

pub use canvas::{Canvas, GradientStop, LineCap};
pub use synth::{GROUND_REPEAT, Texture, TextureSet, TextureSlot, TextureSynth, Wrap};

/// Errors from drawing-surface allocation.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("drawing surface must be non-empty, got {width}x{height}")]
    EmptySurface { width: u32, height: u32 },
    #[error("drawing surface {width}x{height} exceeds addressable memory")]
    TooLarge { width: u32, height: u32 },
    #[error("failed to allocate drawing surface: {0}")]
    Allocation(#[from] std::collections::TryReserveError),
}

pub fn crate_info() -> &'static str {
    "drivescape-textures v0.1.0"
}
