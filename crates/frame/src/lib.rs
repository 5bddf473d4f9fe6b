//! Frame Driver: the per-frame loop body.
//!
//! # Invariants
//! - Every tick runs the full sequence; frames are never skipped.
//! - Elapsed time fed to the simulation never exceeds the clock's limit.
//! - The scene only mirrors the simulation; nothing flows back.

mod clock;
mod driver;

pub use clock::FrameClock;
pub use driver::{FrameDriver, FrameReport};

pub fn crate_info() -> &'static str {
    "drivescape-frame v0.1.0"
}
