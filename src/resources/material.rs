use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use glam::{Mat4, Vec2, Vec3};

use crate::errors::{Result, TrellisError};
use crate::gpu::{Capability, DrawStyle, Gpu, PolygonMode, ShaderProgram};
use crate::resources::texture::Texture;
use crate::resources::uniform::{SamplerBinding, Uniform, UniformValue};

pub const MODEL_MATRIX: &str = "modelMatrix";
pub const VIEW_MATRIX: &str = "viewMatrix";
pub const PROJECTION_MATRIX: &str = "projectionMatrix";

/// Texture unit the texture material samples from.
pub const TEXTURE_UNIT: u32 = 1;

// ============================================================================
// Built-in shaders
// ============================================================================

const BASIC_VERTEX: &str = r"
uniform mat4 projectionMatrix;
uniform mat4 viewMatrix;
uniform mat4 modelMatrix;

in vec3 vertexPosition;
in vec3 vertexColor;

out vec3 color;

void main() {
    gl_Position = projectionMatrix * viewMatrix * modelMatrix * vec4(vertexPosition, 1.0);
    color = vertexColor;
}
";

const BASIC_FRAGMENT: &str = r"
uniform vec3 baseColor;
uniform bool useVertexColors;

in vec3 color;

out vec4 fragColor;

void main() {
    vec4 tempColor = vec4(baseColor, 1.0);
    if (useVertexColors) tempColor *= vec4(color, 1.0);
    fragColor = tempColor;
}
";

const TEXTURE_VERTEX: &str = r"
uniform mat4 projectionMatrix;
uniform mat4 viewMatrix;
uniform mat4 modelMatrix;
uniform vec2 repeatUV;
uniform vec2 offsetUV;

in vec3 vertexPosition;
in vec2 vertexUV;

out vec2 UV;

void main() {
    gl_Position = projectionMatrix * viewMatrix * modelMatrix * vec4(vertexPosition, 1.0);
    UV = vertexUV * repeatUV + offsetUV;
}
";

const TEXTURE_FRAGMENT: &str = r"
uniform vec3 baseColor;
uniform sampler2D textureSampler;

in vec2 UV;

out vec4 fragColor;

void main() {
    vec4 color = vec4(baseColor, 1.0) * texture(textureSampler, UV);
    if (color.a < 0.1)
        discard;
    fragColor = color;
}
";

// ============================================================================
// Settings
// ============================================================================

/// How a line material connects its vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineType {
    /// Through all vertices, first to last.
    #[default]
    Connected,
    /// Like `Connected`, closing back to the first vertex.
    Loop,
    /// Separate segments between each pair of vertices.
    Segments,
}

impl LineType {
    #[must_use]
    pub const fn draw_style(self) -> DrawStyle {
        match self {
            Self::Connected => DrawStyle::LineStrip,
            Self::Loop => DrawStyle::LineLoop,
            Self::Segments => DrawStyle::Lines,
        }
    }
}

impl FromStr for LineType {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "connected" => Ok(Self::Connected),
            "loop" => Ok(Self::Loop),
            "segments" => Ok(Self::Segments),
            other => Err(TrellisError::config(format!(
                "unknown line type `{other}`, expected connected | loop | segments"
            ))),
        }
    }
}

/// Names of the render settings a material may recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    DrawStyle,
    DoubleSide,
    Wireframe,
    LineType,
    PointSize,
    RoundedPoints,
}

impl SettingKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DrawStyle => "drawStyle",
            Self::DoubleSide => "doubleSide",
            Self::Wireframe => "wireframe",
            Self::LineType => "lineType",
            Self::PointSize => "pointSize",
            Self::RoundedPoints => "roundedPoints",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = TrellisError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "drawStyle" => Ok(Self::DrawStyle),
            "doubleSide" => Ok(Self::DoubleSide),
            "wireframe" => Ok(Self::Wireframe),
            "lineType" => Ok(Self::LineType),
            "pointSize" => Ok(Self::PointSize),
            "roundedPoints" => Ok(Self::RoundedPoints),
            other => Err(TrellisError::config(format!("unknown render setting `{other}`"))),
        }
    }
}

/// Fixed-function state a material applies before each draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSettings {
    pub draw_style: DrawStyle,
    pub double_side: bool,
    pub wireframe: bool,
    pub line_type: LineType,
    /// Point size in pixels.
    pub point_size: f32,
    /// Recorded for point materials; core-profile points are always square,
    /// so the device is never told.
    pub rounded_points: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            draw_style: DrawStyle::Triangles,
            double_side: false,
            wireframe: false,
            line_type: LineType::Connected,
            point_size: 8.0,
            rounded_points: true,
        }
    }
}

/// The closed set of material variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterialKind {
    /// User-supplied shaders. Only `drawStyle` is recognised.
    Custom,
    Point,
    Line,
    Surface,
    Texture,
}

impl MaterialKind {
    /// Render settings this kind accepts through `set_properties`.
    #[must_use]
    pub const fn settings(self) -> &'static [SettingKey] {
        match self {
            Self::Custom => &[SettingKey::DrawStyle],
            Self::Point => &[SettingKey::DrawStyle, SettingKey::PointSize, SettingKey::RoundedPoints],
            Self::Line => &[SettingKey::DrawStyle, SettingKey::LineType],
            Self::Surface | Self::Texture => {
                &[SettingKey::DrawStyle, SettingKey::DoubleSide, SettingKey::Wireframe]
            }
        }
    }

    fn default_settings(self) -> RenderSettings {
        let base = RenderSettings::default();
        match self {
            Self::Custom | Self::Surface => base,
            Self::Point => RenderSettings {
                draw_style: DrawStyle::Points,
                ..base
            },
            Self::Line => RenderSettings {
                draw_style: DrawStyle::LineStrip,
                ..base
            },
            Self::Texture => RenderSettings {
                double_side: true,
                ..base
            },
        }
    }
}

/// A value passed to [`Material::set_properties`]: either a uniform value
/// or a render setting.
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Value(UniformValue),
    DrawStyle(DrawStyle),
    LineType(LineType),
}

macro_rules! impl_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Property {
                fn from(value: $ty) -> Self {
                    Self::Value(value.into())
                }
            }
        )*
    };
}

impl_from_value!(UniformValue, i32, bool, f32, Vec2, Vec3, glam::Vec4, Mat4, SamplerBinding);

impl From<DrawStyle> for Property {
    fn from(value: DrawStyle) -> Self {
        Self::DrawStyle(value)
    }
}

impl From<LineType> for Property {
    fn from(value: LineType) -> Self {
        Self::LineType(value)
    }
}

#[derive(Debug)]
enum SettingUpdate {
    DrawStyle(DrawStyle),
    DoubleSide(bool),
    Wireframe(bool),
    LineType(LineType),
    PointSize(f32),
    RoundedPoints(bool),
}

impl SettingUpdate {
    fn parse(key: SettingKey, property: &Property) -> Result<Self> {
        let update = match (key, property) {
            (SettingKey::DrawStyle, Property::DrawStyle(style)) => Self::DrawStyle(*style),
            (SettingKey::DoubleSide, Property::Value(UniformValue::Bool(v))) => Self::DoubleSide(*v),
            (SettingKey::Wireframe, Property::Value(UniformValue::Bool(v))) => Self::Wireframe(*v),
            (SettingKey::LineType, Property::LineType(line)) => Self::LineType(*line),
            (SettingKey::PointSize, Property::Value(UniformValue::Float(v))) => Self::PointSize(*v),
            (SettingKey::PointSize, Property::Value(UniformValue::Int(v))) => Self::PointSize(*v as f32),
            (SettingKey::RoundedPoints, Property::Value(UniformValue::Bool(v))) => Self::RoundedPoints(*v),
            (key, property) => {
                return Err(TrellisError::config(format!(
                    "setting `{key}` cannot take {property:?}"
                )));
            }
        };
        Ok(update)
    }

    fn apply(self, settings: &mut RenderSettings) {
        match self {
            Self::DrawStyle(style) => settings.draw_style = style,
            Self::DoubleSide(v) => settings.double_side = v,
            Self::Wireframe(v) => settings.wireframe = v,
            Self::LineType(line) => settings.line_type = line,
            Self::PointSize(size) => settings.point_size = size,
            Self::RoundedPoints(v) => settings.rounded_points = v,
        }
    }
}

enum Assignment {
    Uniform(usize, UniformValue),
    Setting(SettingUpdate),
}

// ============================================================================
// Material
// ============================================================================

/// A linked program, its uniforms and its render settings.
#[derive(Debug)]
pub struct Material {
    gpu: Gpu,
    program: ShaderProgram,
    kind: MaterialKind,
    uniforms: Vec<(String, Uniform)>,
    settings: RenderSettings,
}

impl Material {
    /// Builds a material from user shaders.
    ///
    /// Both sources get the GLSL version directive prepended, and must
    /// declare the `modelMatrix`, `viewMatrix` and `projectionMatrix`
    /// `mat4` uniforms that every mesh draw supplies.
    pub fn new(gpu: &Gpu, vertex_source: &str, fragment_source: &str) -> Result<Self> {
        Self::with_kind(gpu, vertex_source, fragment_source, MaterialKind::Custom)
    }

    fn with_kind(gpu: &Gpu, vertex_source: &str, fragment_source: &str, kind: MaterialKind) -> Result<Self> {
        let program = ShaderProgram::new(gpu, vertex_source, fragment_source)?;
        let mut material = Self {
            gpu: gpu.clone(),
            program,
            kind,
            uniforms: Vec::new(),
            settings: kind.default_settings(),
        };
        for name in [MODEL_MATRIX, VIEW_MATRIX, PROJECTION_MATRIX] {
            material.set_uniform(name, Mat4::IDENTITY)?;
        }
        Ok(material)
    }

    fn basic<'a>(
        gpu: &Gpu,
        kind: MaterialKind,
        properties: impl IntoIterator<Item = (&'a str, Property)>,
    ) -> Result<Self> {
        let mut material = Self::with_kind(gpu, BASIC_VERTEX, BASIC_FRAGMENT, kind)?;
        material.set_uniform("baseColor", Vec3::ONE)?;
        material.set_uniform("useVertexColors", false)?;
        material.set_properties(properties)?;
        Ok(material)
    }

    /// Vertices drawn as square points, `pointSize` pixels wide.
    pub fn point<'a>(gpu: &Gpu, properties: impl IntoIterator<Item = (&'a str, Property)>) -> Result<Self> {
        Self::basic(gpu, MaterialKind::Point, properties)
    }

    /// Vertices joined by lines according to `lineType`.
    pub fn line<'a>(gpu: &Gpu, properties: impl IntoIterator<Item = (&'a str, Property)>) -> Result<Self> {
        Self::basic(gpu, MaterialKind::Line, properties)
    }

    /// Filled triangles, optionally double sided or in wireframe.
    pub fn surface<'a>(gpu: &Gpu, properties: impl IntoIterator<Item = (&'a str, Property)>) -> Result<Self> {
        Self::basic(gpu, MaterialKind::Surface, properties)
    }

    /// Triangles sampling `texture` through `vertexUV`, tinted by
    /// `baseColor`, with `repeatUV` / `offsetUV` applied to the coordinates.
    pub fn texture<'a>(
        gpu: &Gpu,
        texture: Rc<Texture>,
        properties: impl IntoIterator<Item = (&'a str, Property)>,
    ) -> Result<Self> {
        let mut material = Self::with_kind(gpu, TEXTURE_VERTEX, TEXTURE_FRAGMENT, MaterialKind::Texture)?;
        material.set_uniform("baseColor", Vec3::ONE)?;
        material.set_uniform(
            "textureSampler",
            SamplerBinding {
                texture,
                unit: TEXTURE_UNIT,
            },
        )?;
        material.set_uniform("repeatUV", Vec2::ONE)?;
        material.set_uniform("offsetUV", Vec2::ZERO)?;
        material.set_properties(properties)?;
        Ok(material)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn program(&self) -> &ShaderProgram {
        &self.program
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    #[must_use]
    pub fn uniform(&self, name: &str) -> Option<&UniformValue> {
        self.uniform_index(name).map(|i| self.uniforms[i].1.value())
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.iter().map(|(n, _)| n.as_str())
    }

    fn uniform_index(&self, name: &str) -> Option<usize> {
        self.uniforms.iter().position(|(n, _)| n == name)
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Creates the uniform `name`, resolving its location now, or replaces
    /// the value of an existing one of the same type.
    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        let value = value.into();
        if let Some(index) = self.uniform_index(name) {
            return self.uniforms[index].1.set(value);
        }
        let uniform = Uniform::locate(&self.program, name, value)?;
        self.uniforms.push((name.to_string(), uniform));
        Ok(())
    }

    /// Sets several uniforms and render settings by name.
    ///
    /// Uniform names take precedence over setting names. Every entry is
    /// checked before any is applied, so an unknown name or a mistyped
    /// value leaves the material untouched.
    pub fn set_properties<'a>(&mut self, properties: impl IntoIterator<Item = (&'a str, Property)>) -> Result<()> {
        let mut assignments = Vec::new();
        for (name, property) in properties {
            if let Some(index) = self.uniform_index(name) {
                let value = match property {
                    Property::Value(value) => value,
                    other => {
                        return Err(TrellisError::config(format!(
                            "uniform `{name}` needs a value, got {other:?}"
                        )));
                    }
                };
                let current = self.uniforms[index].1.value();
                if std::mem::discriminant(current) != std::mem::discriminant(&value) {
                    return Err(TrellisError::config(format!(
                        "uniform `{name}` is {}, cannot assign a {}",
                        current.type_name(),
                        value.type_name()
                    )));
                }
                assignments.push(Assignment::Uniform(index, value));
                continue;
            }

            let key = name
                .parse::<SettingKey>()
                .ok()
                .filter(|key| self.kind.settings().contains(key))
                .ok_or_else(|| TrellisError::config(format!("material has no property named `{name}`")))?;
            assignments.push(Assignment::Setting(SettingUpdate::parse(key, &property)?));
        }

        for assignment in assignments {
            match assignment {
                Assignment::Uniform(index, value) => self.uniforms[index].1.set(value)?,
                Assignment::Setting(update) => update.apply(&mut self.settings),
            }
        }
        Ok(())
    }

    // ========================================================================
    // Draw-time
    // ========================================================================

    pub(crate) fn set_matrices(&mut self, model: Mat4, view: Mat4, projection: Mat4) -> Result<()> {
        self.set_uniform(MODEL_MATRIX, model)?;
        self.set_uniform(VIEW_MATRIX, view)?;
        self.set_uniform(PROJECTION_MATRIX, projection)
    }

    /// Uploads every uniform into the program, which must be in use.
    pub fn upload_data(&self) {
        for (_, uniform) in &self.uniforms {
            uniform.upload_data(&self.gpu);
        }
    }

    /// Applies this kind's fixed-function state. Runs once per draw.
    pub fn update_render_settings(&mut self) {
        match self.kind {
            MaterialKind::Custom => {}
            MaterialKind::Point => self.gpu.point_size(self.settings.point_size),
            MaterialKind::Line => self.settings.draw_style = self.settings.line_type.draw_style(),
            MaterialKind::Surface | MaterialKind::Texture => {
                if self.settings.double_side {
                    self.gpu.disable(Capability::CullFace);
                } else {
                    self.gpu.enable(Capability::CullFace);
                }
                self.gpu.polygon_mode(if self.settings.wireframe {
                    PolygonMode::Line
                } else {
                    PolygonMode::Fill
                });
            }
        }
    }
}
