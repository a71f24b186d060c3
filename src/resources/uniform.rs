use std::rc::Rc;

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::errors::{Result, TrellisError};
use crate::gpu::{Gpu, ShaderProgram, UniformLocation, UniformUpload};
use crate::resources::texture::Texture;

/// A texture sampled through a texture unit.
#[derive(Debug, Clone)]
pub struct SamplerBinding {
    pub texture: Rc<Texture>,
    pub unit: u32,
}

impl PartialEq for SamplerBinding {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.texture, &other.texture) && self.unit == other.unit
    }
}

/// Typed value of a shader uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Bool(bool),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    Sampler2D(SamplerBinding),
}

impl UniformValue {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Bool(_) => "bool",
            Self::Float(_) => "float",
            Self::Vec2(_) => "vec2",
            Self::Vec3(_) => "vec3",
            Self::Vec4(_) => "vec4",
            Self::Mat4(_) => "mat4",
            Self::Sampler2D(_) => "sampler2D",
        }
    }

    fn same_type(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_value! {
    i32 => Int,
    bool => Bool,
    f32 => Float,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    Mat4 => Mat4,
    SamplerBinding => Sampler2D,
}

/// A value bound to one uniform variable of a program.
///
/// The location is resolved once, at creation. Setting a value only
/// updates the CPU copy; nothing reaches the device until
/// [`Self::upload_data`], so repeated writes between draws cost a single
/// upload of the last value.
#[derive(Debug, Clone)]
pub struct Uniform {
    value: UniformValue,
    location: UniformLocation,
}

impl Uniform {
    /// Resolves `name` in `program`. A program that does not declare the
    /// variable is a configuration error.
    pub fn locate(program: &ShaderProgram, name: &str, value: UniformValue) -> Result<Self> {
        let location = program
            .uniform_location(name)
            .ok_or_else(|| TrellisError::config(format!("no uniform variable found with name `{name}`")))?;
        Ok(Self { value, location })
    }

    #[inline]
    #[must_use]
    pub fn value(&self) -> &UniformValue {
        &self.value
    }

    #[inline]
    #[must_use]
    pub fn location(&self) -> UniformLocation {
        self.location
    }

    /// Replaces the value. The type is fixed at creation.
    pub fn set(&mut self, value: UniformValue) -> Result<()> {
        if !self.value.same_type(&value) {
            return Err(TrellisError::config(format!(
                "uniform is {}, cannot assign a {}",
                self.value.type_name(),
                value.type_name()
            )));
        }
        self.value = value;
        Ok(())
    }

    /// Writes the value into the program currently in use.
    ///
    /// Samplers also bind their texture to their unit.
    pub fn upload_data(&self, gpu: &Gpu) {
        let upload = match &self.value {
            UniformValue::Int(v) => UniformUpload::Int(*v),
            UniformValue::Bool(v) => UniformUpload::Int(i32::from(*v)),
            UniformValue::Float(v) => UniformUpload::Float(*v),
            UniformValue::Vec2(v) => UniformUpload::Vec2(v.to_array()),
            UniformValue::Vec3(v) => UniformUpload::Vec3(v.to_array()),
            UniformValue::Vec4(v) => UniformUpload::Vec4(v.to_array()),
            UniformValue::Mat4(m) => UniformUpload::Mat4(m.to_cols_array()),
            UniformValue::Sampler2D(binding) => {
                gpu.active_texture(binding.unit);
                gpu.bind_texture_2d(Some(binding.texture.id()));
                UniformUpload::Int(binding.unit as i32)
            }
        };
        gpu.set_uniform(self.location, upload);
    }
}
