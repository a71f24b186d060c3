use glam::Mat4;

use crate::errors::{Result, TrellisError};
use crate::gpu::Gpu;
use crate::resources::attribute::{Attribute, AttributeData, AttributeType};

/// Attribute name that [`Geometry::apply_matrix`] transforms by default.
pub const POSITION_ATTRIBUTE: &str = "vertexPosition";

/// Which builder produced a geometry. Some edits only make sense for a
/// particular shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeometryShape {
    #[default]
    Custom,
    Rectangle,
    Box,
}

/// Named vertex attributes sharing one vertex count.
///
/// Attributes are kept in insertion order. The vertex count is read from the
/// first attribute; attributes of different lengths are not rejected, so a
/// geometry built that way draws with whatever the first one says.
#[derive(Debug)]
pub struct Geometry {
    gpu: Gpu,
    attributes: Vec<(String, Attribute)>,
    pub(crate) shape: GeometryShape,
}

impl Geometry {
    #[must_use]
    pub fn new(gpu: &Gpu) -> Self {
        Self {
            gpu: gpu.clone(),
            attributes: Vec::new(),
            shape: GeometryShape::Custom,
        }
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> GeometryShape {
        self.shape
    }

    // ========================================================================
    // Attribute access
    // ========================================================================

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    fn attribute_mut(&mut self, name: &str) -> Option<&mut Attribute> {
        self.attributes.iter_mut().find(|(n, _)| n == name).map(|(_, a)| a)
    }

    /// `(name, attribute)` pairs in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &Attribute)> {
        self.attributes.iter().map(|(n, a)| (n.as_str(), a))
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(n, _)| n.as_str())
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Creates the attribute `name` with `data`, or replaces the data of an
    /// existing attribute of the same type.
    pub fn set_attribute(&mut self, name: &str, data: impl Into<AttributeData>) -> Result<()> {
        let data = data.into();
        if let Some(attribute) = self.attribute_mut(name) {
            return attribute.set_data(data);
        }
        let attribute = Attribute::new(&self.gpu, data)?;
        self.attributes.push((name.to_string(), attribute));
        Ok(())
    }

    /// Flat-array variant of [`Self::set_attribute`] taking a type tag.
    ///
    /// The tag is required for a new name and ignored for an existing one,
    /// whose type never changes.
    pub fn set_attribute_from_slice(&mut self, name: &str, values: &[f32], type_tag: Option<&str>) -> Result<()> {
        let ty = match (self.attribute(name), type_tag) {
            (Some(existing), _) => existing.attribute_type(),
            (None, Some(tag)) => tag.parse::<AttributeType>()?,
            (None, None) => {
                return Err(TrellisError::config(format!(
                    "new attribute `{name}` needs a data type"
                )));
            }
        };
        self.set_attribute(name, AttributeData::from_flat(ty, values)?)
    }

    // ========================================================================
    // Vertex count
    // ========================================================================

    /// Vertex count of the first attribute, `0` if there is none.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.attributes.first().map_or(0, |(_, a)| a.vertex_count())
    }

    /// Vertex count of the named attribute, or of the first one when `name`
    /// is `None`.
    pub fn count_vertices(&self, name: Option<&str>) -> Result<usize> {
        match name {
            None => Ok(self.vertex_count()),
            Some(name) => self
                .attribute(name)
                .map(Attribute::vertex_count)
                .ok_or_else(|| TrellisError::config(format!("no attribute named `{name}`"))),
        }
    }

    // ========================================================================
    // Bulk edits
    // ========================================================================

    /// Transforms the `vertexPosition` attribute by `m`.
    pub fn apply_matrix(&mut self, m: &Mat4) -> Result<()> {
        self.apply_matrix_to(m, POSITION_ATTRIBUTE)
    }

    /// Transforms every point of the named `vec3` attribute by `m` and
    /// re-uploads it.
    pub fn apply_matrix_to(&mut self, m: &Mat4, name: &str) -> Result<()> {
        let attribute = self
            .attribute_mut(name)
            .ok_or_else(|| TrellisError::config(format!("cannot apply matrix to unknown attribute `{name}`")))?;
        attribute.modify(|data| data.transform_points(m))
    }

    /// Appends the vertices of `other` to this geometry.
    ///
    /// Both geometries must have exactly the same attribute names with the
    /// same types. Nothing is modified when they do not.
    pub fn merge(&mut self, other: &Geometry) -> Result<()> {
        if self.attributes.len() != other.attributes.len() {
            return Err(TrellisError::config(
                "merged geometries must share the same attribute names",
            ));
        }
        for (name, attribute) in &self.attributes {
            let theirs = other.attribute(name).ok_or_else(|| {
                TrellisError::config(format!("merged geometry has no attribute `{name}`"))
            })?;
            if theirs.attribute_type() != attribute.attribute_type() {
                return Err(TrellisError::config(format!(
                    "attribute `{name}` is {} here but {} in the merged geometry",
                    attribute.attribute_type(),
                    theirs.attribute_type()
                )));
            }
        }

        for (name, attribute) in &mut self.attributes {
            if let Some(theirs) = other.attribute(name) {
                attribute.modify(|data| data.extend_from(theirs.data()))?;
            }
        }
        self.shape = GeometryShape::Custom;
        Ok(())
    }
}
