//! Input Mapper: raw key transitions mapped to movement intent and actions.
//!
//! # Invariants
//! - The simulation consumes [`Action`]s, never raw key events.
//! - Press and release are idempotent: a repeated press of a held key, or a
//!   release of a key that is not held, produces no action.

pub mod action;
pub mod intent;
pub mod mapper;

pub use action::{Action, Key};
pub use intent::MovementIntent;
pub use mapper::InputMapper;

pub fn crate_info() -> &'static str {
    "drivescape-input v0.1.0"
}
