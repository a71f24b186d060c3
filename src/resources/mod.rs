//! GPU-backed resources: vertex attributes, geometries, uniforms,
//! materials, textures and meshes.
//!
//! Every type here that owns a device object receives the [`Gpu`](crate::gpu::Gpu)
//! handle at construction and releases the object when dropped.

pub mod attribute;
pub mod geometry;
pub mod material;
pub mod mesh;
pub mod primitives;
pub mod texture;
pub mod uniform;

pub use attribute::{Attribute, AttributeData, AttributeType};
pub use geometry::{Geometry, GeometryShape, POSITION_ATTRIBUTE};
pub use material::{LineType, Material, MaterialKind, Property, RenderSettings, SettingKey};
pub use mesh::Mesh;
pub use primitives::{COLOR_ATTRIBUTE, UV_ATTRIBUTE};
pub use texture::{Texture, TextureData, TextureSettings};
pub use uniform::{SamplerBinding, Uniform, UniformValue};
