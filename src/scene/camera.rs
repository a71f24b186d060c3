use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::math;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Perspective {
    /// Vertical field of view, in degrees.
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Perspective {
    fn default() -> Self {
        Self {
            fov_degrees: 60.0,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Camera component, stored inside a [`NodeKind::Camera`](crate::scene::NodeKind::Camera) node.
///
/// The projection is fixed at construction. The view matrix is derived
/// from the owning node's world transform and only changes when
/// [`SceneGraph::refresh_view_matrix`](crate::scene::SceneGraph::refresh_view_matrix)
/// runs, which the renderer does once per frame.
#[derive(Debug, Clone)]
pub struct Camera {
    params: Perspective,
    projection_matrix: Mat4,
    view_matrix: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Perspective::default())
    }
}

impl Camera {
    #[must_use]
    pub fn new(params: Perspective) -> Self {
        Self {
            params,
            projection_matrix: math::perspective(
                params.fov_degrees,
                params.aspect,
                params.near,
                params.far,
            ),
            view_matrix: Mat4::IDENTITY,
        }
    }

    #[inline]
    #[must_use]
    pub fn params(&self) -> &Perspective {
        &self.params
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    /// Sets the view matrix to the inverse of the camera's world matrix.
    pub fn update_view_matrix(&mut self, world_matrix: Mat4) {
        self.view_matrix = world_matrix.inverse();
    }
}
