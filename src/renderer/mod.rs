//! Per-frame scene traversal.
//!
//! The renderer owns no resources of its own. It sets up global device
//! state once, then each [`Renderer::render`] call clears the targets,
//! takes one snapshot of the camera and draws every visible mesh below the
//! scene root in preorder.

pub mod settings;

pub use settings::RendererSettings;

use crate::errors::{Result, TrellisError};
use crate::gpu::{BlendFactor, Capability, ClearMask, Gpu};
use crate::scene::{NodeKey, NodeKind, SceneGraph};

#[derive(Debug)]
pub struct Renderer {
    gpu: Gpu,
    settings: RendererSettings,
}

impl Renderer {
    pub fn new(gpu: &Gpu, settings: RendererSettings) -> Self {
        let info = gpu.info();
        log::info!(
            "Renderer on {} / {} (version {}, GLSL {})",
            info.vendor,
            info.renderer,
            info.version,
            info.shading_language
        );

        if settings.depth_test {
            gpu.enable(Capability::DepthTest);
        }
        if settings.antialias {
            gpu.enable(Capability::Multisample);
        }
        gpu.clear_color(settings.clear_color);
        if settings.blending {
            gpu.enable(Capability::Blend);
            gpu.blend_func(BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
        }

        Self {
            gpu: gpu.clone(),
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Draws the tree rooted at `scene` as seen from `camera`.
    ///
    /// `scene` must be a Scene node and `camera` a Camera node; otherwise a
    /// [`TrellisError::Type`] is returned before any device call is made.
    /// The camera does not have to be part of the scene tree.
    pub fn render(&self, graph: &mut SceneGraph, scene: NodeKey, camera: NodeKey) -> Result<()> {
        let scene_kind = &graph.node(scene)?.kind;
        if !matches!(scene_kind, NodeKind::Scene) {
            return Err(TrellisError::Type(format!(
                "the scene to render must be a Scene node, found {}",
                scene_kind.label()
            )));
        }
        graph.camera(camera)?;

        self.gpu.clear(ClearMask::COLOR | ClearMask::DEPTH);

        graph.refresh_view_matrix(camera)?;
        let camera = graph.camera(camera)?;
        let (view, projection) = (camera.view_matrix(), camera.projection_matrix());

        let mut drawn = 0usize;
        for key in graph.descendant_list(scene)? {
            let visible = graph.node(key)?.mesh().is_some_and(|mesh| mesh.visible);
            if !visible {
                continue;
            }
            let model = graph.world_matrix(key)?;
            graph.mesh_mut(key)?.render(model, view, projection)?;
            drawn += 1;
        }

        log::trace!("Frame drew {drawn} meshes");
        Ok(())
    }
}
