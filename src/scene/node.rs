use glam::{Mat4, Vec3};

use crate::math;
use crate::resources::Mesh;
use crate::scene::{Camera, NodeKey};

/// Coordinate space a transformation is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    /// Relative to the node's own axes: `local = local * m`.
    #[default]
    Local,
    /// Relative to the parent's axes: `local = m * local`.
    Parent,
}

/// What a node is, beyond its place in the hierarchy.
#[derive(Debug)]
pub enum NodeKind {
    /// A root. Never accepts a parent.
    Scene,
    /// A plain interior node used to transform its children together.
    Group,
    Camera(Camera),
    Mesh(Box<Mesh>),
}

impl NodeKind {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Scene => "Scene",
            Self::Group => "Group",
            Self::Camera(_) => "Camera",
            Self::Mesh(_) => "Mesh",
        }
    }
}

/// A scene node.
///
/// # Hierarchy
///
/// `parent` and `children` are only ever changed through
/// [`SceneGraph::add`](crate::scene::SceneGraph::add) and
/// [`SceneGraph::remove`](crate::scene::SceneGraph::remove), which keep both
/// sides consistent. The parent link is a back-reference used for world
/// matrix composition; the graph owns every node.
///
/// # Transform
///
/// `transform` is the local matrix relative to the parent. The world
/// matrix is never cached: it is recomposed from the ancestor chain on
/// every query so it always reflects the current tree.
///
/// # Kind
///
/// The kind is fixed at creation. Only the component inside it can be
/// edited, through [`Node::mesh_mut`]; a node that is already attached can
/// never turn into a Scene root.
///
/// Nodes are only created through the graph, so neither the kind nor a
/// whole node can be swapped in behind its back:
///
/// ```compile_fail
/// use trellis::scene::{NodeKind, SceneGraph};
///
/// let mut graph = SceneGraph::new();
/// let group = graph.create_group();
/// graph.node_mut(group).unwrap().kind = NodeKind::Scene;
/// ```
///
/// ```compile_fail
/// use trellis::scene::{Node, NodeKind};
///
/// let node = Node::new(NodeKind::Scene);
/// ```
#[derive(Debug)]
pub struct Node {
    pub name: String,
    pub(crate) parent: Option<NodeKey>,
    pub(crate) children: Vec<NodeKey>,
    pub transform: Mat4,
    pub(crate) kind: NodeKind,
}

impl Node {
    #[must_use]
    pub(crate) fn new(kind: NodeKind) -> Self {
        Self {
            name: kind.label().to_string(),
            parent: None,
            children: Vec::new(),
            transform: Mat4::IDENTITY,
            kind,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeKey> {
        self.parent
    }

    /// Children in insertion order.
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeKey] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    #[inline]
    #[must_use]
    pub fn is_scene(&self) -> bool {
        matches!(self.kind, NodeKind::Scene)
    }

    #[must_use]
    pub fn camera(&self) -> Option<&Camera> {
        match &self.kind {
            NodeKind::Camera(camera) => Some(camera),
            _ => None,
        }
    }

    #[must_use]
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    // === Local transform operations ===

    pub fn apply_matrix(&mut self, m: Mat4, space: Space) {
        self.transform = match space {
            Space::Local => self.transform * m,
            Space::Parent => m * self.transform,
        };
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32, space: Space) {
        self.apply_matrix(math::translation(x, y, z), space);
    }

    pub fn rotate_x(&mut self, angle: f32, space: Space) {
        self.apply_matrix(math::rotation_x(angle), space);
    }

    pub fn rotate_y(&mut self, angle: f32, space: Space) {
        self.apply_matrix(math::rotation_y(angle), space);
    }

    pub fn rotate_z(&mut self, angle: f32, space: Space) {
        self.apply_matrix(math::rotation_z(angle), space);
    }

    pub fn scale_uniform(&mut self, s: f32, space: Space) {
        self.apply_matrix(math::scale(s, s, s), space);
    }

    /// Position relative to the parent.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        math::translation_of(&self.transform)
    }

    /// Overwrites the local translation only; rotation and scale are kept.
    #[inline]
    pub fn set_position(&mut self, position: Vec3) {
        math::set_translation(&mut self.transform, position);
    }
}
