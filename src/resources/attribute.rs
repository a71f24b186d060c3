use std::fmt;
use std::str::FromStr;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::errors::{Result, TrellisError};
use crate::gpu::{BufferId, Gpu, ScalarType, ShaderProgram, VertexArrayId, VertexLayout};
use crate::math;

/// Semantic type tag of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeType {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl AttributeType {
    /// Components per vertex.
    #[must_use]
    pub const fn components(self) -> u8 {
        match self {
            Self::Int | Self::Float => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 => 4,
        }
    }

    #[must_use]
    pub const fn scalar(self) -> ScalarType {
        match self {
            Self::Int => ScalarType::Int,
            _ => ScalarType::Float,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AttributeType {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "vec2" => Ok(Self::Vec2),
            "vec3" => Ok(Self::Vec3),
            "vec4" => Ok(Self::Vec4),
            other => Err(TrellisError::config(format!("unsupported attribute type `{other}`"))),
        }
    }
}

/// Per-vertex values, one variant per [`AttributeType`].
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    /// Uploaded as 32-bit integers with an integer vertex layout; every
    /// other variant is 32-bit float.
    Int(Vec<i32>),
    Float(Vec<f32>),
    Vec2(Vec<Vec2>),
    Vec3(Vec<Vec3>),
    Vec4(Vec<Vec4>),
}

impl AttributeData {
    /// Regroups a flat scalar array into vertices of `ty`.
    ///
    /// The length must be a multiple of the component count.
    pub fn from_flat(ty: AttributeType, values: &[f32]) -> Result<Self> {
        let n = ty.components() as usize;
        if !values.len().is_multiple_of(n) {
            return Err(TrellisError::config(format!(
                "{} values cannot be split into {ty} vertices",
                values.len()
            )));
        }

        Ok(match ty {
            AttributeType::Int => Self::Int(values.iter().map(|v| *v as i32).collect()),
            AttributeType::Float => Self::Float(values.to_vec()),
            AttributeType::Vec2 => Self::Vec2(values.chunks_exact(2).map(Vec2::from_slice).collect()),
            AttributeType::Vec3 => Self::Vec3(values.chunks_exact(3).map(Vec3::from_slice).collect()),
            AttributeType::Vec4 => Self::Vec4(values.chunks_exact(4).map(Vec4::from_slice).collect()),
        })
    }

    #[must_use]
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Self::Int(_) => AttributeType::Int,
            Self::Float(_) => AttributeType::Float,
            Self::Vec2(_) => AttributeType::Vec2,
            Self::Vec3(_) => AttributeType::Vec3,
            Self::Vec4(_) => AttributeType::Vec4,
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Vec2(v) => v.len(),
            Self::Vec3(v) => v.len(),
            Self::Vec4(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Tightly packed bytes as they are sent to the vertex buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Int(v) => bytemuck::cast_slice(v),
            Self::Float(v) => bytemuck::cast_slice(v),
            Self::Vec2(v) => bytemuck::cast_slice(v),
            Self::Vec3(v) => bytemuck::cast_slice(v),
            Self::Vec4(v) => bytemuck::cast_slice(v),
        }
    }

    /// Appends `other`'s vertices. Both sides must have the same type.
    pub fn extend_from(&mut self, other: &Self) -> Result<()> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.extend_from_slice(b),
            (Self::Float(a), Self::Float(b)) => a.extend_from_slice(b),
            (Self::Vec2(a), Self::Vec2(b)) => a.extend_from_slice(b),
            (Self::Vec3(a), Self::Vec3(b)) => a.extend_from_slice(b),
            (Self::Vec4(a), Self::Vec4(b)) => a.extend_from_slice(b),
            (a, b) => {
                return Err(TrellisError::config(format!(
                    "cannot append {} data to a {} attribute",
                    b.attribute_type(),
                    a.attribute_type()
                )));
            }
        }
        Ok(())
    }

    /// Transforms every point as `(m * (p, 1)).xyz`. Only `vec3` data holds
    /// points.
    pub fn transform_points(&mut self, m: &Mat4) -> Result<()> {
        match self {
            Self::Vec3(points) => {
                for p in points.iter_mut() {
                    *p = math::transform_point(m, *p);
                }
                Ok(())
            }
            other => Err(TrellisError::config(format!(
                "cannot apply a matrix to a {} attribute",
                other.attribute_type()
            ))),
        }
    }
}

impl From<Vec<i32>> for AttributeData {
    fn from(v: Vec<i32>) -> Self {
        Self::Int(v)
    }
}

impl From<Vec<f32>> for AttributeData {
    fn from(v: Vec<f32>) -> Self {
        Self::Float(v)
    }
}

impl From<Vec<Vec2>> for AttributeData {
    fn from(v: Vec<Vec2>) -> Self {
        Self::Vec2(v)
    }
}

impl From<Vec<Vec3>> for AttributeData {
    fn from(v: Vec<Vec3>) -> Self {
        Self::Vec3(v)
    }
}

impl From<Vec<Vec4>> for AttributeData {
    fn from(v: Vec<Vec4>) -> Self {
        Self::Vec4(v)
    }
}

/// A vertex buffer plus the CPU copy of its contents.
///
/// Owns its buffer object exclusively; the buffer is deleted on drop.
#[derive(Debug)]
pub struct Attribute {
    gpu: Gpu,
    buffer: BufferId,
    data: AttributeData,
}

impl Attribute {
    /// Allocates a buffer and uploads `data` into it.
    pub fn new(gpu: &Gpu, data: AttributeData) -> Result<Self> {
        let buffer = gpu.create_buffer().map_err(TrellisError::Device)?;
        let attribute = Self {
            gpu: gpu.clone(),
            buffer,
            data,
        };
        attribute.upload_data();
        Ok(attribute)
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &AttributeData {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn attribute_type(&self) -> AttributeType {
        self.data.attribute_type()
    }

    #[inline]
    #[must_use]
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.data.len()
    }

    /// Replaces the contents and re-uploads. The type is fixed at creation.
    pub fn set_data(&mut self, data: AttributeData) -> Result<()> {
        if data.attribute_type() != self.attribute_type() {
            return Err(TrellisError::config(format!(
                "attribute is {}, got {} data",
                self.attribute_type(),
                data.attribute_type()
            )));
        }
        self.data = data;
        self.upload_data();
        Ok(())
    }

    /// Edits the CPU copy in place, then re-uploads it.
    pub(crate) fn modify<R>(&mut self, f: impl FnOnce(&mut AttributeData) -> Result<R>) -> Result<R> {
        let result = f(&mut self.data)?;
        self.upload_data();
        Ok(result)
    }

    pub fn upload_data(&self) {
        self.gpu.bind_array_buffer(Some(self.buffer));
        self.gpu.array_buffer_data(self.data.as_bytes());
    }

    /// Feeds this buffer into the shader input `name` of `program`,
    /// recording the association in `vertex_array`.
    ///
    /// Returns `false` without touching any state when the program does not
    /// declare the input.
    pub fn associate_variable(&self, program: &ShaderProgram, name: &str, vertex_array: VertexArrayId) -> bool {
        let Some(location) = program.attribute_location(name) else {
            log::trace!("Program {:?} has no input `{name}`, attribute skipped", program.id());
            return false;
        };

        let ty = self.attribute_type();
        self.gpu.bind_array_buffer(Some(self.buffer));
        self.gpu.bind_vertex_array(Some(vertex_array));
        self.gpu
            .vertex_attrib_pointer(location, VertexLayout::packed(ty.components(), ty.scalar()));
        self.gpu.enable_vertex_attrib_array(location);
        true
    }
}

impl Drop for Attribute {
    fn drop(&mut self) {
        self.gpu.delete_buffer(self.buffer);
    }
}
