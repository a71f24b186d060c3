//! Renderer Settings
//!
//! Process-wide fixed-function state the [`Renderer`](super::Renderer)
//! establishes once at construction.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use trellis::renderer::RendererSettings;
//!
//! // Defaults: opaque black background, depth test, MSAA and alpha blending on
//! let settings = RendererSettings::default();
//!
//! // Partial JSON configs fill the rest from the defaults
//! let settings: RendererSettings =
//!     serde_json::from_str(r#"{ "clear_color": [0.1, 0.1, 0.1, 1.0] }"#)?;
//! ```

use serde::{Deserialize, Serialize};

/// Fixed-function configuration applied when the renderer is created.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// RGBA colour the colour buffer is cleared to each frame.
    pub clear_color: [f32; 4],
    pub depth_test: bool,
    /// Multisample antialiasing.
    pub antialias: bool,
    /// Source-alpha / one-minus-source-alpha blending.
    pub blending: bool,
}

impl Default for RendererSettings {
    #[inline]
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            depth_test: true,
            antialias: true,
            blending: true,
        }
    }
}

impl RendererSettings {
    /// Opaque clear colour from RGB.
    #[must_use]
    pub fn with_clear_rgb(mut self, r: f32, g: f32, b: f32) -> Self {
        self.clear_color = [r, g, b, 1.0];
        self
    }
}
