//! Headless reference device.
//!
//! Implements [`GraphicsDevice`] entirely on the CPU. It behaves like a
//! strict core-profile driver: it compiles GLSL text far enough to learn
//! each shader's `in` / `out` / `uniform` interface and links programs
//! against that interface, but never rasterises anything. Every call is appended to a command log so tests and
//! tools can inspect exactly which side effects a frame produced.
//!
//! Misuse that a real driver would flag with an error code (uploading a
//! `vec2` into a `mat4` uniform, drawing with no program bound, ...) is
//! collected in [`HeadlessDevice::errors`] instead of aborting.

use std::cell::RefCell;
use std::collections::BTreeMap;

use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    BlendFactor, BufferId, Capability, ClearMask, DeviceInfo, DrawStyle, GraphicsDevice,
    PolygonMode, ProgramId, SamplerParams, ShaderId, ShaderStage, TextureId, UniformLocation,
    UniformUpload, VertexArrayId, VertexLayout,
};

/// One recorded device call.
#[derive(Debug, Clone, PartialEq)]
pub enum GpuCommand {
    CreateBuffer(BufferId),
    DeleteBuffer(BufferId),
    BindArrayBuffer(Option<BufferId>),
    BufferData { buffer: BufferId, bytes: usize },

    CreateShader(ShaderId, ShaderStage),
    CompileShader { shader: ShaderId, success: bool },
    DeleteShader(ShaderId),
    CreateProgram(ProgramId),
    AttachShader { program: ProgramId, shader: ShaderId },
    DetachShader { program: ProgramId, shader: ShaderId },
    LinkProgram { program: ProgramId, success: bool },
    DeleteProgram(ProgramId),
    UseProgram(Option<ProgramId>),
    SetUniform {
        program: ProgramId,
        location: UniformLocation,
        value: UniformUpload,
    },

    CreateVertexArray(VertexArrayId),
    DeleteVertexArray(VertexArrayId),
    BindVertexArray(Option<VertexArrayId>),
    VertexAttribPointer {
        vertex_array: VertexArrayId,
        buffer: BufferId,
        location: u32,
        layout: VertexLayout,
    },
    EnableVertexAttribArray { vertex_array: VertexArrayId, location: u32 },

    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    ActiveTexture(u32),
    BindTexture2d { unit: u32, texture: Option<TextureId> },
    TexImage2d { texture: TextureId, width: u32, height: u32 },
    GenerateMipmap(TextureId),
    TexParameters(SamplerParams),

    Enable(Capability),
    Disable(Capability),
    BlendFunc(BlendFactor, BlendFactor),
    PolygonMode(PolygonMode),
    PointSize(f32),
    ClearColor([f32; 4]),
    Clear(ClearMask),

    DrawArrays {
        program: ProgramId,
        vertex_array: VertexArrayId,
        style: DrawStyle,
        first: u32,
        count: u32,
    },
}

/// Number of objects currently alive on the device, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiveObjects {
    pub buffers: usize,
    pub shaders: usize,
    pub programs: usize,
    pub vertex_arrays: usize,
    pub textures: usize,
}

impl LiveObjects {
    #[must_use]
    pub fn total(&self) -> usize {
        self.buffers + self.shaders + self.programs + self.vertex_arrays + self.textures
    }
}

// ============================================================================
// Shader interface
// ============================================================================

/// Global declarations of one shader stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ShaderInterface {
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// `(glsl type, name)` in declaration order.
    pub uniforms: Vec<(String, String)>,
}

const INTERPOLATION_QUALIFIERS: &[&str] = &[
    "flat", "smooth", "noperspective", "centroid", "lowp", "mediump", "highp",
];

/// Extracts the top-level `in` / `out` / `uniform` declarations of a
/// GLSL source. Declarations inside function bodies are ignored.
pub(crate) fn parse_interface(source: &str) -> ShaderInterface {
    let mut interface = ShaderInterface::default();
    let mut depth = 0usize;

    for raw in source.lines() {
        let line = raw.split("//").next().unwrap_or_default().trim();

        if depth == 0 {
            let mut decl = line;
            if decl.starts_with("layout")
                && let Some(end) = decl.find(')')
            {
                decl = decl[end + 1..].trim_start();
            }

            let tokens: Vec<&str> = decl
                .split_whitespace()
                .filter(|t| !INTERPOLATION_QUALIFIERS.contains(t))
                .collect();

            if tokens.len() >= 3 {
                let ty = tokens[1];
                let name = tokens[2]
                    .trim_end_matches(';')
                    .split('[')
                    .next()
                    .unwrap_or_default()
                    .to_string();
                match tokens[0] {
                    "in" => interface.inputs.push(name),
                    "out" => interface.outputs.push(name),
                    "uniform" => interface.uniforms.push((ty.to_string(), name)),
                    _ => {}
                }
            }
        }

        for c in line.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    interface
}

fn compile_source(source: &str) -> Result<ShaderInterface, String> {
    if !source.trim_start().starts_with("#version") {
        return Err("0:1(1): error: missing #version directive".to_string());
    }

    for (index, line) in source.lines().enumerate() {
        if let Some(message) = line.trim().strip_prefix("#error") {
            return Err(format!("0:{}(1): error: {}", index + 1, message.trim()));
        }
    }

    let has_main = source
        .lines()
        .any(|line| line.split_whitespace().collect::<Vec<_>>().starts_with(&["void", "main()"])
            || line.contains("void main("));
    if !has_main {
        return Err("0:1(1): error: no function with name 'main'".to_string());
    }

    Ok(parse_interface(source))
}

/// Whether an upload of this kind may be written to a uniform declared with
/// `glsl_type`.
fn upload_matches(glsl_type: &str, value: &UniformUpload) -> bool {
    matches!(
        (glsl_type, value),
        ("int" | "bool" | "sampler2D", UniformUpload::Int(_))
            | ("float", UniformUpload::Float(_))
            | ("vec2", UniformUpload::Vec2(_))
            | ("vec3", UniformUpload::Vec3(_))
            | ("vec4", UniformUpload::Vec4(_))
            | ("mat4", UniformUpload::Mat4(_))
    )
}

// ============================================================================
// Device state
// ============================================================================

#[derive(Debug)]
struct ShaderRecord {
    stage: ShaderStage,
    interface: Option<ShaderInterface>,
}

#[derive(Debug, Default)]
struct ProgramRecord {
    attached: Vec<ShaderId>,
    /// Attribute names indexed by location.
    attributes: Vec<String>,
    /// `(glsl type, name)` indexed by location.
    uniforms: Vec<(String, String)>,
    linked: bool,
    values: FxHashMap<UniformLocation, UniformUpload>,
}

#[derive(Debug, Clone, Copy)]
struct AttributeBinding {
    buffer: BufferId,
    layout: VertexLayout,
    enabled: bool,
}

#[derive(Debug, Default)]
struct TextureRecord {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
    mipmapped: bool,
    params: Option<SamplerParams>,
}

#[derive(Debug)]
struct DeviceState {
    next_id: u32,

    buffers: FxHashMap<BufferId, Vec<u8>>,
    shaders: FxHashMap<ShaderId, ShaderRecord>,
    programs: FxHashMap<ProgramId, ProgramRecord>,
    vertex_arrays: FxHashMap<VertexArrayId, BTreeMap<u32, AttributeBinding>>,
    textures: FxHashMap<TextureId, TextureRecord>,

    bound_buffer: Option<BufferId>,
    bound_vertex_array: Option<VertexArrayId>,
    current_program: Option<ProgramId>,
    active_unit: u32,
    texture_units: FxHashMap<u32, TextureId>,

    capabilities: FxHashSet<Capability>,
    blend: Option<(BlendFactor, BlendFactor)>,
    polygon_mode: PolygonMode,
    point_size: f32,
    clear_color: [f32; 4],

    commands: Vec<GpuCommand>,
    errors: Vec<String>,
}

impl DeviceState {
    fn new() -> Self {
        Self {
            next_id: 1,
            buffers: FxHashMap::default(),
            shaders: FxHashMap::default(),
            programs: FxHashMap::default(),
            vertex_arrays: FxHashMap::default(),
            textures: FxHashMap::default(),
            bound_buffer: None,
            bound_vertex_array: None,
            current_program: None,
            active_unit: 0,
            texture_units: FxHashMap::default(),
            capabilities: FxHashSet::default(),
            blend: None,
            polygon_mode: PolygonMode::Fill,
            point_size: 1.0,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            commands: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn error(&mut self, message: String) {
        log::trace!("headless device error: {message}");
        self.errors.push(message);
    }

    fn bound_texture(&self) -> Option<TextureId> {
        self.texture_units.get(&self.active_unit).copied()
    }

    fn link(&mut self, program: ProgramId) -> Result<(), String> {
        let Some(record) = self.programs.get(&program) else {
            return Err(format!("error: {program:?} is not a program object"));
        };

        let mut vertex = None;
        let mut fragment = None;
        for shader in &record.attached {
            let shader_record = self
                .shaders
                .get(shader)
                .ok_or_else(|| format!("error: attached {shader:?} no longer exists"))?;
            let interface = shader_record
                .interface
                .as_ref()
                .ok_or_else(|| format!("error: {shader:?} has not been successfully compiled"))?;
            match shader_record.stage {
                ShaderStage::Vertex => vertex = Some(interface),
                ShaderStage::Fragment => fragment = Some(interface),
            }
        }

        let vertex = vertex.ok_or("error: no vertex shader attached")?;
        let fragment = fragment.ok_or("error: no fragment shader attached")?;

        if let Some(missing) = fragment.inputs.iter().find(|input| !vertex.outputs.contains(input)) {
            return Err(format!(
                "error: fragment shader input `{missing}` has no matching output in the vertex shader"
            ));
        }

        let attributes = vertex.inputs.clone();
        let mut uniforms: Vec<(String, String)> = Vec::new();
        for (ty, name) in vertex.uniforms.iter().chain(&fragment.uniforms) {
            match uniforms.iter().find(|(_, existing)| existing == name) {
                Some((existing_ty, _)) if existing_ty != ty => {
                    return Err(format!(
                        "error: uniform `{name}` declared as both {existing_ty} and {ty}"
                    ));
                }
                Some(_) => {}
                None => uniforms.push((ty.clone(), name.clone())),
            }
        }

        if let Some(record) = self.programs.get_mut(&program) {
            record.attributes = attributes;
            record.uniforms = uniforms;
            record.linked = true;
            record.values.clear();
        }
        Ok(())
    }
}

// ============================================================================
// HeadlessDevice
// ============================================================================

/// A [`GraphicsDevice`] that records instead of rendering.
#[derive(Debug)]
pub struct HeadlessDevice {
    state: RefCell<DeviceState>,
}

impl Default for HeadlessDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDevice {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RefCell::new(DeviceState::new()),
        }
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Every call recorded since creation or the last [`Self::take_commands`].
    #[must_use]
    pub fn commands(&self) -> Vec<GpuCommand> {
        self.state.borrow().commands.clone()
    }

    /// Drains the command log.
    pub fn take_commands(&self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.state.borrow_mut().commands)
    }

    /// Driver-level misuse observed so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.state.borrow().errors.clone()
    }

    #[must_use]
    pub fn live_objects(&self) -> LiveObjects {
        let state = self.state.borrow();
        LiveObjects {
            buffers: state.buffers.len(),
            shaders: state.shaders.len(),
            programs: state.programs.len(),
            vertex_arrays: state.vertex_arrays.len(),
            textures: state.textures.len(),
        }
    }

    /// Contents of a buffer, reinterpreted as native-endian `f32`s.
    #[must_use]
    pub fn buffer_f32(&self, buffer: BufferId) -> Option<Vec<f32>> {
        self.state.borrow().buffers.get(&buffer).map(|bytes| {
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        })
    }

    /// Raw contents of a buffer.
    #[must_use]
    pub fn buffer_bytes(&self, buffer: BufferId) -> Option<Vec<u8>> {
        self.state.borrow().buffers.get(&buffer).cloned()
    }

    /// Last value written to the named uniform of `program`.
    #[must_use]
    pub fn uniform_value(&self, program: ProgramId, name: &str) -> Option<UniformUpload> {
        let state = self.state.borrow();
        let record = state.programs.get(&program)?;
        let index = record.uniforms.iter().position(|(_, n)| n == name)?;
        record.values.get(&UniformLocation(index as u32)).copied()
    }

    /// `(location, buffer, layout)` for every enabled attribute of a vertex
    /// array, ordered by location.
    #[must_use]
    pub fn vertex_array_bindings(&self, vertex_array: VertexArrayId) -> Vec<(u32, BufferId, VertexLayout)> {
        self.state
            .borrow()
            .vertex_arrays
            .get(&vertex_array)
            .map(|bindings| {
                bindings
                    .iter()
                    .filter(|(_, b)| b.enabled)
                    .map(|(location, b)| (*location, b.buffer, b.layout))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `(width, height, pixels, mipmapped)` of a texture.
    #[must_use]
    pub fn texture_image(&self, texture: TextureId) -> Option<(u32, u32, Vec<u8>, bool)> {
        self.state
            .borrow()
            .textures
            .get(&texture)
            .map(|t| (t.width, t.height, t.pixels.clone(), t.mipmapped))
    }

    #[must_use]
    pub fn texture_params(&self, texture: TextureId) -> Option<SamplerParams> {
        self.state.borrow().textures.get(&texture).and_then(|t| t.params)
    }

    /// Texture bound to a texture unit.
    #[must_use]
    pub fn texture_on_unit(&self, unit: u32) -> Option<TextureId> {
        self.state.borrow().texture_units.get(&unit).copied()
    }

    #[must_use]
    pub fn is_enabled(&self, capability: Capability) -> bool {
        self.state.borrow().capabilities.contains(&capability)
    }

    #[must_use]
    pub fn blend_factors(&self) -> Option<(BlendFactor, BlendFactor)> {
        self.state.borrow().blend
    }

    #[must_use]
    pub fn current_polygon_mode(&self) -> PolygonMode {
        self.state.borrow().polygon_mode
    }

    #[must_use]
    pub fn current_point_size(&self) -> f32 {
        self.state.borrow().point_size
    }

    #[must_use]
    pub fn current_clear_color(&self) -> [f32; 4] {
        self.state.borrow().clear_color
    }

    #[must_use]
    pub fn current_program(&self) -> Option<ProgramId> {
        self.state.borrow().current_program
    }

    #[must_use]
    pub fn bound_vertex_array(&self) -> Option<VertexArrayId> {
        self.state.borrow().bound_vertex_array
    }

    /// All recorded draw calls, in order.
    #[must_use]
    pub fn draw_calls(&self) -> Vec<GpuCommand> {
        self.state
            .borrow()
            .commands
            .iter()
            .filter(|c| matches!(c, GpuCommand::DrawArrays { .. }))
            .cloned()
            .collect()
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn info(&self) -> DeviceInfo {
        DeviceInfo {
            vendor: "Trellis".to_string(),
            renderer: "Headless reference device".to_string(),
            version: "3.3 (headless)".to_string(),
            shading_language: "3.30".to_string(),
        }
    }

    // --- Buffers ---

    fn create_buffer(&self) -> Result<BufferId, String> {
        let mut state = self.state.borrow_mut();
        let id = BufferId(state.allocate());
        state.buffers.insert(id, Vec::new());
        state.commands.push(GpuCommand::CreateBuffer(id));
        Ok(id)
    }

    fn delete_buffer(&self, buffer: BufferId) {
        let mut state = self.state.borrow_mut();
        if state.buffers.remove(&buffer).is_none() {
            state.error(format!("delete of unknown {buffer:?}"));
        }
        if state.bound_buffer == Some(buffer) {
            state.bound_buffer = None;
        }
        state.commands.push(GpuCommand::DeleteBuffer(buffer));
    }

    fn bind_array_buffer(&self, buffer: Option<BufferId>) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = buffer
            && !state.buffers.contains_key(&id)
        {
            state.error(format!("bind of unknown {id:?}"));
        }
        state.bound_buffer = buffer;
        state.commands.push(GpuCommand::BindArrayBuffer(buffer));
    }

    fn array_buffer_data(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer else {
            state.error("buffer data upload with no array buffer bound".to_string());
            return;
        };
        if let Some(storage) = state.buffers.get_mut(&buffer) {
            storage.clear();
            storage.extend_from_slice(data);
        }
        state.commands.push(GpuCommand::BufferData {
            buffer,
            bytes: data.len(),
        });
    }

    // --- Shaders & programs ---

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderId, String> {
        let mut state = self.state.borrow_mut();
        let id = ShaderId(state.allocate());
        state.shaders.insert(id, ShaderRecord { stage, interface: None });
        state.commands.push(GpuCommand::CreateShader(id, stage));
        Ok(id)
    }

    fn compile_shader(&self, shader: ShaderId, source: &str) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let result = compile_source(source);
        match state.shaders.get_mut(&shader) {
            Some(record) => record.interface = result.as_ref().ok().cloned(),
            None => return Err(format!("error: {shader:?} is not a shader object")),
        }
        state.commands.push(GpuCommand::CompileShader {
            shader,
            success: result.is_ok(),
        });
        result.map(|_| ())
    }

    fn delete_shader(&self, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if state.shaders.remove(&shader).is_none() {
            state.error(format!("delete of unknown {shader:?}"));
        }
        state.commands.push(GpuCommand::DeleteShader(shader));
    }

    fn create_program(&self) -> Result<ProgramId, String> {
        let mut state = self.state.borrow_mut();
        let id = ProgramId(state.allocate());
        state.programs.insert(id, ProgramRecord::default());
        state.commands.push(GpuCommand::CreateProgram(id));
        Ok(id)
    }

    fn attach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        match state.programs.get_mut(&program) {
            Some(record) => record.attached.push(shader),
            None => state.error(format!("attach to unknown {program:?}")),
        }
        state.commands.push(GpuCommand::AttachShader { program, shader });
    }

    fn detach_shader(&self, program: ProgramId, shader: ShaderId) {
        let mut state = self.state.borrow_mut();
        if let Some(record) = state.programs.get_mut(&program) {
            record.attached.retain(|s| *s != shader);
        }
        state.commands.push(GpuCommand::DetachShader { program, shader });
    }

    fn link_program(&self, program: ProgramId) -> Result<(), String> {
        let mut state = self.state.borrow_mut();
        let result = state.link(program);
        state.commands.push(GpuCommand::LinkProgram {
            program,
            success: result.is_ok(),
        });
        result
    }

    fn delete_program(&self, program: ProgramId) {
        let mut state = self.state.borrow_mut();
        if state.programs.remove(&program).is_none() {
            state.error(format!("delete of unknown {program:?}"));
        }
        if state.current_program == Some(program) {
            state.current_program = None;
        }
        state.commands.push(GpuCommand::DeleteProgram(program));
    }

    fn use_program(&self, program: Option<ProgramId>) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = program
            && !state.programs.get(&id).is_some_and(|p| p.linked)
        {
            state.error(format!("use of unlinked {id:?}"));
        }
        state.current_program = program;
        state.commands.push(GpuCommand::UseProgram(program));
    }

    fn attribute_location(&self, program: ProgramId, name: &str) -> Option<u32> {
        let state = self.state.borrow();
        let record = state.programs.get(&program)?;
        record
            .attributes
            .iter()
            .position(|attribute| attribute == name)
            .map(|index| index as u32)
    }

    fn uniform_location(&self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        let state = self.state.borrow();
        let record = state.programs.get(&program)?;
        record
            .uniforms
            .iter()
            .position(|(_, uniform)| uniform == name)
            .map(|index| UniformLocation(index as u32))
    }

    fn set_uniform(&self, location: UniformLocation, value: UniformUpload) {
        let mut state = self.state.borrow_mut();
        let Some(program) = state.current_program else {
            state.error(format!("uniform upload to {location:?} with no program in use"));
            return;
        };

        let declared = state
            .programs
            .get(&program)
            .and_then(|record| record.uniforms.get(location.0 as usize))
            .map(|(ty, name)| (ty.clone(), name.clone()));

        match declared {
            Some((ty, _)) if upload_matches(&ty, &value) => {
                if let Some(record) = state.programs.get_mut(&program) {
                    record.values.insert(location, value);
                }
            }
            Some((ty, name)) => {
                state.error(format!("uniform `{name}` is {ty}, cannot upload {value:?}"));
            }
            None => state.error(format!("{location:?} is not active in {program:?}")),
        }

        state.commands.push(GpuCommand::SetUniform {
            program,
            location,
            value,
        });
    }

    // --- Vertex arrays ---

    fn create_vertex_array(&self) -> Result<VertexArrayId, String> {
        let mut state = self.state.borrow_mut();
        let id = VertexArrayId(state.allocate());
        state.vertex_arrays.insert(id, BTreeMap::new());
        state.commands.push(GpuCommand::CreateVertexArray(id));
        Ok(id)
    }

    fn delete_vertex_array(&self, vertex_array: VertexArrayId) {
        let mut state = self.state.borrow_mut();
        if state.vertex_arrays.remove(&vertex_array).is_none() {
            state.error(format!("delete of unknown {vertex_array:?}"));
        }
        if state.bound_vertex_array == Some(vertex_array) {
            state.bound_vertex_array = None;
        }
        state.commands.push(GpuCommand::DeleteVertexArray(vertex_array));
    }

    fn bind_vertex_array(&self, vertex_array: Option<VertexArrayId>) {
        let mut state = self.state.borrow_mut();
        if let Some(id) = vertex_array
            && !state.vertex_arrays.contains_key(&id)
        {
            state.error(format!("bind of unknown {id:?}"));
        }
        state.bound_vertex_array = vertex_array;
        state.commands.push(GpuCommand::BindVertexArray(vertex_array));
    }

    fn vertex_attrib_pointer(&self, location: u32, layout: VertexLayout) {
        let mut state = self.state.borrow_mut();
        let (Some(vertex_array), Some(buffer)) = (state.bound_vertex_array, state.bound_buffer) else {
            state.error("vertex attribute pointer needs a bound vertex array and array buffer".to_string());
            return;
        };
        if let Some(bindings) = state.vertex_arrays.get_mut(&vertex_array) {
            let enabled = bindings.get(&location).is_some_and(|b| b.enabled);
            bindings.insert(location, AttributeBinding { buffer, layout, enabled });
        }
        state.commands.push(GpuCommand::VertexAttribPointer {
            vertex_array,
            buffer,
            location,
            layout,
        });
    }

    fn enable_vertex_attrib_array(&self, location: u32) {
        let mut state = self.state.borrow_mut();
        let Some(vertex_array) = state.bound_vertex_array else {
            state.error("enabling a vertex attribute with no vertex array bound".to_string());
            return;
        };
        let configured = state
            .vertex_arrays
            .get_mut(&vertex_array)
            .and_then(|bindings| bindings.get_mut(&location))
            .map(|binding| binding.enabled = true)
            .is_some();
        if !configured {
            state.error(format!("attribute {location} enabled before its pointer was set"));
        }
        state.commands.push(GpuCommand::EnableVertexAttribArray { vertex_array, location });
    }

    // --- Textures ---

    fn create_texture(&self) -> Result<TextureId, String> {
        let mut state = self.state.borrow_mut();
        let id = TextureId(state.allocate());
        state.textures.insert(id, TextureRecord::default());
        state.commands.push(GpuCommand::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&self, texture: TextureId) {
        let mut state = self.state.borrow_mut();
        if state.textures.remove(&texture).is_none() {
            state.error(format!("delete of unknown {texture:?}"));
        }
        state.texture_units.retain(|_, bound| *bound != texture);
        state.commands.push(GpuCommand::DeleteTexture(texture));
    }

    fn active_texture(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        state.active_unit = unit;
        state.commands.push(GpuCommand::ActiveTexture(unit));
    }

    fn bind_texture_2d(&self, texture: Option<TextureId>) {
        let mut state = self.state.borrow_mut();
        let unit = state.active_unit;
        match texture {
            Some(id) if !state.textures.contains_key(&id) => {
                state.error(format!("bind of unknown {id:?}"));
            }
            Some(id) => {
                state.texture_units.insert(unit, id);
            }
            None => {
                state.texture_units.remove(&unit);
            }
        }
        state.commands.push(GpuCommand::BindTexture2d { unit, texture });
    }

    fn tex_image_2d_rgba(&self, width: u32, height: u32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(texture) = state.bound_texture() else {
            state.error("texture upload with no texture bound".to_string());
            return;
        };
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            state.error(format!("{texture:?}: pixel data does not match {width}x{height} RGBA"));
            return;
        }
        if let Some(record) = state.textures.get_mut(&texture) {
            record.width = width;
            record.height = height;
            record.pixels = pixels.to_vec();
            record.mipmapped = false;
        }
        state.commands.push(GpuCommand::TexImage2d { texture, width, height });
    }

    fn generate_mipmap(&self) {
        let mut state = self.state.borrow_mut();
        let Some(texture) = state.bound_texture() else {
            state.error("mipmap generation with no texture bound".to_string());
            return;
        };
        if let Some(record) = state.textures.get_mut(&texture) {
            record.mipmapped = true;
        }
        state.commands.push(GpuCommand::GenerateMipmap(texture));
    }

    fn tex_parameters(&self, params: SamplerParams) {
        let mut state = self.state.borrow_mut();
        let Some(texture) = state.bound_texture() else {
            state.error("texture parameters with no texture bound".to_string());
            return;
        };
        if let Some(record) = state.textures.get_mut(&texture) {
            record.params = Some(params);
        }
        state.commands.push(GpuCommand::TexParameters(params));
    }

    // --- Fixed-function state ---

    fn enable(&self, capability: Capability) {
        let mut state = self.state.borrow_mut();
        state.capabilities.insert(capability);
        state.commands.push(GpuCommand::Enable(capability));
    }

    fn disable(&self, capability: Capability) {
        let mut state = self.state.borrow_mut();
        state.capabilities.remove(&capability);
        state.commands.push(GpuCommand::Disable(capability));
    }

    fn blend_func(&self, src: BlendFactor, dst: BlendFactor) {
        let mut state = self.state.borrow_mut();
        state.blend = Some((src, dst));
        state.commands.push(GpuCommand::BlendFunc(src, dst));
    }

    fn polygon_mode(&self, mode: PolygonMode) {
        let mut state = self.state.borrow_mut();
        state.polygon_mode = mode;
        state.commands.push(GpuCommand::PolygonMode(mode));
    }

    fn point_size(&self, size: f32) {
        let mut state = self.state.borrow_mut();
        state.point_size = size;
        state.commands.push(GpuCommand::PointSize(size));
    }

    fn clear_color(&self, rgba: [f32; 4]) {
        let mut state = self.state.borrow_mut();
        state.clear_color = rgba;
        state.commands.push(GpuCommand::ClearColor(rgba));
    }

    fn clear(&self, mask: ClearMask) {
        self.state.borrow_mut().commands.push(GpuCommand::Clear(mask));
    }

    // --- Drawing ---

    fn draw_arrays(&self, style: DrawStyle, first: u32, count: u32) {
        let mut state = self.state.borrow_mut();
        let (Some(program), Some(vertex_array)) = (state.current_program, state.bound_vertex_array) else {
            state.error("draw call needs a program in use and a vertex array bound".to_string());
            return;
        };
        state.commands.push(GpuCommand::DrawArrays {
            program,
            vertex_array,
            style,
            first,
            count,
        });
    }
}
