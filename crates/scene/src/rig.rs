use crate::{SceneError, SceneGraph};
use drivescape_common::{NodeId, Transform};
use drivescape_kernel::VehicleState;
use drivescape_kernel::vehicle::WHEEL_COUNT;
use glam::{Quat, Vec3};

/// Stored handles to the vehicle's scene nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VehicleRig {
    pub root: NodeId,
    /// Wheels in the same order as [`VehicleState::wheel_spin`].
    pub wheels: [NodeId; WHEEL_COUNT],
}

impl VehicleRig {
    /// Mirror the vehicle pose onto its nodes: root position and heading,
    /// each wheel's spin about its local X axis.
    pub fn apply(&self, graph: &mut SceneGraph, state: &VehicleState) -> Result<(), SceneError> {
        graph.set_transform(
            self.root,
            Transform::from_position(state.position)
                .with_rotation(Quat::from_rotation_y(state.heading)),
        )?;
        for (&wheel, &spin) in self.wheels.iter().zip(&state.wheel_spin) {
            let node = graph.get_mut(wheel).ok_or(SceneError::UnknownNode(wheel))?;
            node.transform.rotation = Quat::from_rotation_x(spin);
        }
        Ok(())
    }
}

/// A light that hovers above the vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowLight {
    pub node: NodeId,
    pub offset: Vec3,
}

impl FollowLight {
    pub fn track(&self, graph: &mut SceneGraph, target: Vec3) -> Result<(), SceneError> {
        let node = graph
            .get_mut(self.node)
            .ok_or(SceneError::UnknownNode(self.node))?;
        node.transform.position = target + self.offset;
        Ok(())
    }
}
