//! Graphics device boundary.
//!
//! The engine never talks to a driver directly. Everything it needs from the
//! GPU (objects, attribute and uniform lookup, fixed-function state, draw
//! calls) goes through the object-safe [`GraphicsDevice`]
//! trait, reached through an explicit [`Gpu`] handle that every allocating
//! component receives at construction.
//!
//! The device is single-threaded by contract: all calls happen on the thread
//! that owns the context, in program order. Implementations keep their state
//! behind interior mutability so every method takes `&self`, which lets
//! resources hold a clone of the handle and release their objects on drop.
//!
//! [`HeadlessDevice`] is the reference implementation shipped with the crate.

mod headless;
mod program;

pub use headless::{GpuCommand, HeadlessDevice, LiveObjects};
pub use program::ShaderProgram;

use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Shared handle to the graphics context.
pub type Gpu = Rc<dyn GraphicsDevice>;

// ============================================================================
// Object handles
// ============================================================================

macro_rules! gpu_handle {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
            pub struct $name(pub u32);
        )*
    };
}

gpu_handle! {
    /// A vertex buffer object.
    BufferId;
    /// A compiled (or failed) shader object.
    ShaderId;
    /// A linked shader program.
    ProgramId;
    /// A vertex array object: the recorded attribute-to-slot binding set.
    VertexArrayId;
    /// A 2D texture object.
    TextureId;
    /// Location of a uniform variable inside a linked program.
    UniformLocation;
}

// ============================================================================
// State vocabulary
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vertex => f.write_str("vertex"),
            Self::Fragment => f.write_str("fragment"),
        }
    }
}

/// Primitive topology used to interpret vertex data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawStyle {
    Points,
    /// Separate segments between each pair of vertices.
    Lines,
    /// Connected line through all vertices, first to last.
    LineStrip,
    /// Like `LineStrip`, also connecting the last vertex to the first.
    LineLoop,
    #[default]
    Triangles,
}

/// Fixed-function switches toggled with `enable` / `disable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    Blend,
    CullFace,
    Multisample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Fill,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Int,
    Float,
}

/// How a bound buffer is streamed into one shader input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexLayout {
    /// Components per vertex (1..=4).
    pub components: u8,
    pub scalar: ScalarType,
    pub normalized: bool,
    /// Byte stride between vertices; `0` means tightly packed.
    pub stride: u32,
    pub offset: u32,
}

impl VertexLayout {
    /// Tightly packed, unnormalized layout.
    #[must_use]
    pub const fn packed(components: u8, scalar: ScalarType) -> Self {
        Self {
            components,
            scalar,
            normalized: false,
            stride: 0,
            offset: 0,
        }
    }
}

/// A uniform value at the driver boundary. Matrices are column-major.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformUpload {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    Mat4([f32; 16]),
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ClearMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapLinear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureWrap {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

/// Sampling parameters applied to the currently bound 2D texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerParams {
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
    pub wrap: TextureWrap,
    pub border_color: [f32; 4],
}

/// Driver identification strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub vendor: String,
    pub renderer: String,
    pub version: String,
    pub shading_language: String,
}

// ============================================================================
// GraphicsDevice
// ============================================================================

/// Primitive operations the engine consumes from the graphics driver.
///
/// Lookups that can legitimately miss (`attribute_location`,
/// `uniform_location`) return `None` instead of erroring; it is up to the
/// caller to decide whether a miss is fatal.
pub trait GraphicsDevice: fmt::Debug {
    fn info(&self) -> DeviceInfo;

    // --- Buffers ---
    fn create_buffer(&self) -> Result<BufferId, String>;
    fn delete_buffer(&self, buffer: BufferId);
    fn bind_array_buffer(&self, buffer: Option<BufferId>);
    /// Uploads `data` into the currently bound array buffer.
    fn array_buffer_data(&self, data: &[u8]);

    // --- Shaders & programs ---
    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, String>;
    /// Compiles `source`; on failure returns the driver diagnostic.
    fn compile_shader(&self, shader: ShaderId, source: &str) -> Result<(), String>;
    fn delete_shader(&self, shader: ShaderId);
    fn create_program(&self) -> Result<ProgramId, String>;
    fn attach_shader(&self, program: ProgramId, shader: ShaderId);
    fn detach_shader(&self, program: ProgramId, shader: ShaderId);
    /// Links `program`; on failure returns the driver diagnostic.
    fn link_program(&self, program: ProgramId) -> Result<(), String>;
    fn delete_program(&self, program: ProgramId);
    fn use_program(&self, program: Option<ProgramId>);
    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    /// Sets a uniform of the program currently in use.
    fn set_uniform(&self, location: UniformLocation, value: UniformUpload);

    // --- Vertex arrays ---
    fn create_vertex_array(&self) -> Result<VertexArrayId, String>;
    fn delete_vertex_array(&self, vertex_array: VertexArrayId);
    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>);
    /// Records how the bound array buffer feeds `location` into the bound
    /// vertex array.
    fn vertex_attrib_pointer(&self, location: u32, layout: VertexLayout);
    fn enable_vertex_attrib_array(&self, location: u32);

    // --- Textures ---
    fn create_texture(&self) -> Result<TextureId, String>;
    fn delete_texture(&self, texture: TextureId);
    fn active_texture(&self, unit: u32);
    fn bind_texture_2d(&self, texture: Option<TextureId>);
    /// Uploads RGBA8 pixels into the bound 2D texture.
    fn tex_image_2d_rgba(&self, width: u32, height: u32, pixels: &[u8]);
    fn generate_mipmap(&self);
    fn tex_parameters(&self, params: SamplerParams);

    // --- Fixed-function state ---
    fn enable(&self, capability: Capability);
    fn disable(&self, capability: Capability);
    fn blend_func(&self, src: BlendFactor, dst: BlendFactor);
    fn polygon_mode(&self, mode: PolygonMode);
    fn point_size(&self, size: f32);
    fn clear_color(&self, rgba: [f32; 4]);
    fn clear(&self, mask: ClearMask);

    // --- Drawing ---
    fn draw_arrays(&self, style: DrawStyle, first: u32, count: u32);
}
