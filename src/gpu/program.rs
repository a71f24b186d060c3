use super::{Gpu, ProgramId, ShaderId, ShaderStage, UniformLocation};
use crate::errors::{Result, TrellisError};

/// Version directive prepended to every shader source.
pub const GLSL_VERSION: &str = "#version 330";

/// Deletes a shader object when it goes out of scope, so a failure at any
/// point of program construction never leaks the shaders created so far.
struct ShaderGuard<'a> {
    gpu: &'a Gpu,
    id: ShaderId,
}

impl Drop for ShaderGuard<'_> {
    fn drop(&mut self) {
        self.gpu.delete_shader(self.id);
    }
}

fn compile<'a>(gpu: &'a Gpu, stage: ShaderStage, source: &str) -> Result<ShaderGuard<'a>> {
    let id = gpu.create_shader(stage).map_err(TrellisError::Device)?;
    let shader = ShaderGuard { gpu, id };

    let source = format!("{GLSL_VERSION}\n{source}");
    gpu.compile_shader(shader.id, &source)
        .map_err(|log| TrellisError::Compile { stage, log })?;

    Ok(shader)
}

/// A linked vertex + fragment program.
///
/// The program object belongs exclusively to this value and is deleted
/// when it is dropped.
#[derive(Debug)]
pub struct ShaderProgram {
    gpu: Gpu,
    id: ProgramId,
}

impl ShaderProgram {
    /// Compiles both stages and links them.
    ///
    /// On a compile or link failure every shader and program object created
    /// along the way is released before the error is returned.
    pub fn new(gpu: &Gpu, vertex_source: &str, fragment_source: &str) -> Result<Self> {
        let vertex = compile(gpu, ShaderStage::Vertex, vertex_source)?;
        let fragment = compile(gpu, ShaderStage::Fragment, fragment_source)?;

        let id = gpu.create_program().map_err(TrellisError::Device)?;
        gpu.attach_shader(id, vertex.id);
        gpu.attach_shader(id, fragment.id);

        let linked = gpu.link_program(id);

        // The linked program keeps its own copy of the executable code.
        gpu.detach_shader(id, vertex.id);
        gpu.detach_shader(id, fragment.id);

        if let Err(log) = linked {
            gpu.delete_program(id);
            return Err(TrellisError::Link(log));
        }

        log::debug!("Linked shader program {id:?}");
        Ok(Self { gpu: gpu.clone(), id })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> ProgramId {
        self.id
    }

    /// Makes this the active program.
    pub fn bind(&self) {
        self.gpu.use_program(Some(self.id));
    }

    #[must_use]
    pub fn attribute_location(&self, name: &str) -> Option<u32> {
        self.gpu.attribute_location(self.id, name)
    }

    #[must_use]
    pub fn uniform_location(&self, name: &str) -> Option<UniformLocation> {
        self.gpu.uniform_location(self.id, name)
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        self.gpu.delete_program(self.id);
    }
}
