//! Developer Tooling: telemetry inspector and on-screen notifications.
//!
//! # Invariants
//! - Tools only read simulation state; they never mutate it.
//! - Expired notifications are never reported as active.

pub mod inspector;
pub mod notifications;

pub use inspector::{Telemetry, TelemetryInspector};
pub use notifications::{NOTIFICATION_LIFETIME, Notifications};

pub fn crate_info() -> &'static str {
    "drivescape-tools v0.1.0"
}
