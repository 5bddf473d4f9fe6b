use crate::{Geometry, Light, Material, SceneError};
use drivescape_common::{Color, NodeId, Transform};
use glam::{Mat4, Vec3};
use std::collections::BTreeMap;

/// Linear distance fog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fog {
    pub color: Color,
    pub near: f32,
    pub far: f32,
}

/// Scene-wide settings not attached to any node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub background: Color,
    pub fog: Option<Fog>,
}

impl Default for Environment {
    fn default() -> Self {
        let sky = Color::hex(0x87ceeb);
        Self {
            background: sky,
            fog: Some(Fog {
                color: sky,
                near: 10.0,
                far: 150.0,
            }),
        }
    }
}

/// What a node contributes to the rendered image.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Transform-only node that groups its children.
    Group,
    Mesh {
        geometry: Geometry,
        material: Material,
    },
    Light(Light),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Transform relative to the parent.
    pub transform: Transform,
    pub kind: NodeKind,
    pub visible: bool,
}

/// A visible mesh with its resolved world matrix.
#[derive(Debug, Clone, Copy)]
pub struct MeshDraw<'a> {
    pub id: NodeId,
    pub world: Mat4,
    pub geometry: &'a Geometry,
    pub material: &'a Material,
}

/// A visible light with its resolved world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightDraw {
    pub id: NodeId,
    pub light: Light,
    pub position: Vec3,
}

/// Node hierarchy owned by the application.
///
/// Ids are handed out sequentially, and a parent must exist before its
/// children, so iterating the map in key order visits parents first.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    next_id: u32,
    environment: Environment,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Add a top-level node.
    pub fn add(&mut self, name: impl Into<String>, kind: NodeKind, transform: Transform) -> NodeId {
        self.insert(None, name.into(), kind, transform)
    }

    /// Add a node under `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        kind: NodeKind,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownParent(parent));
        }
        Ok(self.insert(Some(parent), name.into(), kind, transform))
    }

    fn insert(
        &mut self,
        parent: Option<NodeId>,
        name: String,
        kind: NodeKind,
        transform: Transform,
    ) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.push(id);
        }
        self.nodes.insert(
            id,
            Node {
                name,
                parent,
                children: Vec::new(),
                transform,
                kind,
                visible: true,
            },
        );
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        self.node_mut(id)?.transform = transform;
        Ok(())
    }

    /// Flip a node's own visibility flag. Returns the new value.
    pub fn toggle_visible(&mut self, id: NodeId) -> Result<bool, SceneError> {
        let node = self.node_mut(id)?;
        node.visible = !node.visible;
        tracing::debug!(node = %node.name, visible = node.visible, "visibility toggled");
        Ok(node.visible)
    }

    /// A node is shown only if it and all its ancestors are visible.
    pub fn is_visible(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(&current) {
                Some(node) if node.visible => cursor = node.parent,
                _ => return false,
            }
        }
        true
    }

    /// Compose transforms from the root down to `id`.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(&id)?;
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// Resolve every node's world matrix in one parent-first pass, skipping
    /// hidden subtrees.
    fn visible_world_matrices(&self) -> BTreeMap<NodeId, Mat4> {
        let mut resolved = BTreeMap::new();
        for (id, node) in &self.nodes {
            if !node.visible {
                continue;
            }
            let world = match node.parent {
                None => node.transform.matrix(),
                Some(parent) => match resolved.get(&parent) {
                    Some(parent_world) => *parent_world * node.transform.matrix(),
                    None => continue,
                },
            };
            resolved.insert(*id, world);
        }
        resolved
    }

    /// Visible meshes in creation order.
    pub fn visible_meshes(&self) -> Vec<MeshDraw<'_>> {
        let worlds = self.visible_world_matrices();
        self.nodes
            .iter()
            .filter_map(|(id, node)| match &node.kind {
                NodeKind::Mesh { geometry, material } => worlds.get(id).map(|world| MeshDraw {
                    id: *id,
                    world: *world,
                    geometry,
                    material,
                }),
                _ => None,
            })
            .collect()
    }

    /// Visible lights in creation order.
    pub fn visible_lights(&self) -> Vec<LightDraw> {
        let worlds = self.visible_world_matrices();
        self.nodes
            .iter()
            .filter_map(|(id, node)| match node.kind {
                NodeKind::Light(light) => worlds.get(id).map(|world| LightDraw {
                    id: *id,
                    light,
                    position: world.w_axis.truncate(),
                }),
                _ => None,
            })
            .collect()
    }
}
