//! Shared types used across the drivescape crates.

pub mod types;

pub use types::{Color, NodeId, Transform};
