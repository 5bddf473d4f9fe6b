//! Scene description: a node hierarchy of meshes, lights and groups, plus the
//! builders that populate it at startup.
//!
//! Geometry and materials are declarative descriptors; turning them into GPU
//! resources is the renderer's job.
//!
//! # Invariants
//! - Nodes are stored in a BTreeMap keyed by creation order, so traversal is
//!   deterministic.
//! - A node's parent always exists and was created before it.
//! - The vehicle hierarchy mirrors the simulation's vehicle state; it never
//!   feeds back into it.

pub mod builder;
pub mod geometry;
pub mod graph;
pub mod light;
pub mod material;
pub mod rig;

pub use builder::{SceneHandles, build_scene};
pub use geometry::{Geometry, Shape};
pub use graph::{Environment, Fog, LightDraw, MeshDraw, Node, NodeKind, SceneGraph};
pub use light::{Light, ShadowCamera};
pub use material::{Material, Shading};
pub use rig::{FollowLight, VehicleRig};

use drivescape_common::NodeId;

/// Errors from scene construction and mutation.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("parent node {0:?} does not exist")]
    UnknownParent(NodeId),
    #[error("node {0:?} does not exist")]
    UnknownNode(NodeId),
}

pub fn crate_info() -> &'static str {
    "drivescape-scene v0.1.0"
}
