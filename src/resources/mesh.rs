use glam::Mat4;

use crate::errors::{Result, TrellisError};
use crate::gpu::{Gpu, VertexArrayId};
use crate::resources::geometry::Geometry;
use crate::resources::material::Material;

/// A drawable pairing of one geometry and one material.
///
/// The vertex array recording which buffer feeds which program input is
/// built once, here, from the attributes the geometry holds at
/// construction. Attributes added to the geometry later are not bound;
/// updating the data of an existing attribute is fine since the buffer
/// object stays the same.
#[derive(Debug)]
pub struct Mesh {
    gpu: Gpu,
    geometry: Geometry,
    material: Material,
    vertex_array: VertexArrayId,
    bound_attributes: Vec<String>,
    /// Checked by the renderer; hidden meshes are skipped entirely.
    pub visible: bool,
}

impl Mesh {
    pub fn new(gpu: &Gpu, geometry: Geometry, material: Material) -> Result<Self> {
        let vertex_array = gpu.create_vertex_array().map_err(TrellisError::Device)?;
        gpu.bind_vertex_array(Some(vertex_array));

        let bound_attributes: Vec<String> = geometry
            .attributes()
            .filter(|(name, attribute)| attribute.associate_variable(material.program(), name, vertex_array))
            .map(|(name, _)| name.to_string())
            .collect();

        gpu.bind_vertex_array(None);

        log::debug!(
            "Built vertex array {vertex_array:?} binding [{}] to program {:?}",
            bound_attributes.join(", "),
            material.program().id()
        );

        Ok(Self {
            gpu: gpu.clone(),
            geometry,
            material,
            vertex_array,
            bound_attributes,
            visible: true,
        })
    }

    #[inline]
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[inline]
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        &mut self.geometry
    }

    #[inline]
    #[must_use]
    pub fn material(&self) -> &Material {
        &self.material
    }

    #[inline]
    pub fn material_mut(&mut self) -> &mut Material {
        &mut self.material
    }

    #[inline]
    #[must_use]
    pub fn vertex_array(&self) -> VertexArrayId {
        self.vertex_array
    }

    /// Geometry attributes the program actually consumes.
    #[must_use]
    pub fn bound_attributes(&self) -> &[String] {
        &self.bound_attributes
    }

    /// Draws the mesh with `model` as its world matrix.
    pub fn render(&mut self, model: Mat4, view: Mat4, projection: Mat4) -> Result<()> {
        self.material.program().bind();
        self.gpu.bind_vertex_array(Some(self.vertex_array));

        self.material.set_matrices(model, view, projection)?;
        self.material.upload_data();
        self.material.update_render_settings();

        self.gpu.draw_arrays(
            self.material.settings().draw_style,
            0,
            self.geometry.vertex_count() as u32,
        );

        self.gpu.bind_vertex_array(None);
        Ok(())
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        self.gpu.delete_vertex_array(self.vertex_array);
    }
}
