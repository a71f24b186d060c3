//! Scene graph
//!
//! - [`Node`]: local transform plus hierarchy links and a kind tag
//! - [`SceneGraph`]: arena owning every node, enforces hierarchy rules
//! - [`Camera`]: perspective projection plus the derived view matrix
//! - [`CameraRig`]: first-person style movement rig

pub mod camera;
pub mod graph;
pub mod node;
pub mod rig;

pub use camera::{Camera, Perspective};
pub use graph::SceneGraph;
pub use node::{Node, NodeKind, Space};
pub use rig::{CameraRig, RigControls};

use slotmap::new_key_type;

new_key_type! {
    /// Stable handle to a node stored in a [`SceneGraph`].
    pub struct NodeKey;
}
