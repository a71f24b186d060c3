#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod errors;
pub mod gpu;
pub mod helpers;
pub mod math;
pub mod renderer;
pub mod resources;
pub mod scene;

pub use errors::{Result, TrellisError};
pub use gpu::{DrawStyle, Gpu, GraphicsDevice, HeadlessDevice};
pub use helpers::{AxesOptions, GridOptions, axes_helper, grid_helper};
pub use renderer::{Renderer, RendererSettings};
pub use resources::{
    Attribute, AttributeData, AttributeType, Geometry, LineType, Material, MaterialKind, Mesh,
    Property, Texture, TextureData, TextureSettings, UniformValue,
};
pub use scene::{Camera, CameraRig, Node, NodeKey, NodeKind, Perspective, RigControls, SceneGraph, Space};
