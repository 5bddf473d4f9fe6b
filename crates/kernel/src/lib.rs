//! Simulation Kernel: vehicle state, intent resolution, per-frame integration.
//!
//! # Invariants
//! - Integration is pure with respect to its inputs: the same actions and
//!   frame times always produce the same state.
//! - All state mutations flow through explicit operations on [`Simulation`].
//! - Wheel spin is derived from planar speed and elapsed time only.
//! - The vehicle never ends a step below the ground level.

pub mod motion;
pub mod params;
pub mod session;
pub mod vehicle;

pub use motion::{TargetVelocity, integrate, resolve_intent};
pub use params::{ConfigError, MotionParams};
pub use session::{Notice, SimEvent, Simulation};
pub use vehicle::VehicleState;

pub fn crate_info() -> &'static str {
    "drivescape-kernel v0.1.0"
}
