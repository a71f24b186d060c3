use glam::{Mat4, Vec3};
use slotmap::SlotMap;

use crate::errors::{Result, TrellisError};
use crate::math;
use crate::resources::Mesh;
use crate::scene::{Camera, Node, NodeKey, NodeKind};

/// Arena that owns every node of one or more scene trees.
///
/// Nodes refer to each other by [`NodeKey`]; the graph is the single owner
/// of all of them, so parent links can never keep a subtree alive and a
/// cycle can only come from [`Self::add`], which rejects it.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, Node>,
}

impl SceneGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Node creation
    // ========================================================================

    fn insert(&mut self, node: Node) -> NodeKey {
        self.nodes.insert(node)
    }

    pub fn create_scene(&mut self) -> NodeKey {
        self.insert(Node::new(NodeKind::Scene))
    }

    pub fn create_group(&mut self) -> NodeKey {
        self.insert(Node::new(NodeKind::Group))
    }

    pub fn create_camera(&mut self, camera: Camera) -> NodeKey {
        self.insert(Node::new(NodeKind::Camera(camera)))
    }

    pub fn create_mesh(&mut self, mesh: Mesh) -> NodeKey {
        self.insert(Node::new(NodeKind::Mesh(Box::new(mesh))))
    }

    // ========================================================================
    // Access
    // ========================================================================

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn node(&self, key: NodeKey) -> Result<&Node> {
        self.nodes.get(key).ok_or(TrellisError::NodeNotFound(key))
    }

    pub fn node_mut(&mut self, key: NodeKey) -> Result<&mut Node> {
        self.nodes.get_mut(key).ok_or(TrellisError::NodeNotFound(key))
    }

    pub fn camera(&self, key: NodeKey) -> Result<&Camera> {
        let node = self.node(key)?;
        node.camera()
            .ok_or_else(|| TrellisError::Type(format!("expected a Camera node, found {}", node.kind.label())))
    }

    pub fn mesh(&self, key: NodeKey) -> Result<&Mesh> {
        let node = self.node(key)?;
        node.mesh()
            .ok_or_else(|| TrellisError::Type(format!("expected a Mesh node, found {}", node.kind.label())))
    }

    pub fn mesh_mut(&mut self, key: NodeKey) -> Result<&mut Mesh> {
        let node = self.node_mut(key)?;
        let label = node.kind.label();
        node.mesh_mut()
            .ok_or_else(|| TrellisError::Type(format!("expected a Mesh node, found {label}")))
    }

    // ========================================================================
    // Hierarchy
    // ========================================================================

    /// Attaches `child` as the last child of `parent`.
    ///
    /// Fails without touching either node when `child` already has a
    /// parent, is a Scene root, or is `parent` itself or one of its
    /// ancestors.
    pub fn add(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        self.node(parent)?;
        let child_node = self.node(child)?;

        if child_node.is_scene() {
            return Err(TrellisError::Hierarchy(
                "the root node cannot have a parent".to_string(),
            ));
        }
        if let Some(current) = child_node.parent {
            return Err(TrellisError::Hierarchy(format!(
                "cannot add a child of another node ({child:?} already belongs to {current:?})"
            )));
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(TrellisError::Hierarchy(format!(
                "adding {child:?} under {parent:?} would create a cycle"
            )));
        }

        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Detaches `child` from `parent`. The child stays in the graph as a
    /// root of its own subtree.
    pub fn remove(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let position = self
            .node(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or_else(|| TrellisError::Hierarchy(format!("{child:?} is not a child of {parent:?}")))?;

        self.nodes[parent].children.remove(position);
        if let Some(node) = self.nodes.get_mut(child) {
            node.parent = None;
        }
        Ok(())
    }

    /// Detaches `key` and drops it together with its whole subtree,
    /// releasing any GPU objects the removed meshes own.
    pub fn destroy(&mut self, key: NodeKey) -> Result<()> {
        if let Some(parent) = self.node(key)?.parent {
            self.remove(parent, key)?;
        }
        for node in self.descendant_list(key)? {
            self.nodes.remove(node);
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, candidate: NodeKey, mut key: NodeKey) -> bool {
        loop {
            if key == candidate {
                return true;
            }
            match self.nodes.get(key).and_then(|n| n.parent) {
                Some(parent) => key = parent,
                None => return false,
            }
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// `parent.world_matrix * local`, recomposed along the ancestor chain.
    pub fn world_matrix(&self, key: NodeKey) -> Result<Mat4> {
        let node = self.node(key)?;
        let mut world = node.transform;
        let mut next = node.parent;
        while let Some(parent) = next {
            let parent_node = self.node(parent)?;
            world = parent_node.transform * world;
            next = parent_node.parent;
        }
        Ok(world)
    }

    pub fn world_position(&self, key: NodeKey) -> Result<Vec3> {
        self.world_matrix(key).map(|m| math::translation_of(&m))
    }

    /// Preorder flattening: `key` first, then each child's full subtree in
    /// child order.
    pub fn descendant_list(&self, key: NodeKey) -> Result<Vec<NodeKey>> {
        self.node(key)?;
        let mut out = Vec::new();
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(node) = self.nodes.get(current) {
                stack.extend(node.children.iter().rev());
            }
        }
        Ok(out)
    }

    /// Recomputes a camera's view matrix from its current world matrix.
    pub fn refresh_view_matrix(&mut self, camera: NodeKey) -> Result<()> {
        let world = self.world_matrix(camera)?;
        let node = self.node_mut(camera)?;
        match &mut node.kind {
            NodeKind::Camera(camera) => {
                camera.update_view_matrix(world);
                Ok(())
            }
            other => Err(TrellisError::Type(format!(
                "expected a Camera node, found {}",
                other.label()
            ))),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &Node)> {
        self.nodes.iter()
    }
}
