//! Rectangle and box geometries.

use glam::{Vec2, Vec3};

use crate::errors::{Result, TrellisError};
use crate::gpu::Gpu;
use crate::resources::geometry::{Geometry, GeometryShape, POSITION_ATTRIBUTE};

pub const COLOR_ATTRIBUTE: &str = "vertexColor";
pub const UV_ATTRIBUTE: &str = "vertexUV";

/// Corner indices of the two triangles of each box face, in face order
/// right, left, top, bottom, front, back.
const BOX_FACES: [[usize; 6]; 6] = [
    [5, 1, 3, 5, 3, 7],
    [0, 4, 6, 0, 6, 2],
    [6, 7, 3, 6, 3, 2],
    [0, 1, 5, 0, 5, 4],
    [4, 5, 7, 4, 7, 6],
    [1, 0, 2, 1, 2, 3],
];

const FACE_COLORS: [Vec3; 6] = [
    Vec3::new(1.0, 0.0, 0.0),
    Vec3::new(1.0, 1.0, 0.0),
    Vec3::new(0.0, 1.0, 0.0),
    Vec3::new(0.0, 1.0, 1.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, 1.0),
];

/// UVs of one quad split as `(0, 1, 3), (0, 3, 2)`.
const QUAD_UVS: [Vec2; 6] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

fn box_corners(width: f32, height: f32, depth: f32) -> [Vec3; 8] {
    let (w, h, d) = (width / 2.0, height / 2.0, depth / 2.0);
    [
        Vec3::new(-w, -h, -d),
        Vec3::new(w, -h, -d),
        Vec3::new(-w, h, -d),
        Vec3::new(w, h, -d),
        Vec3::new(-w, -h, d),
        Vec3::new(w, -h, d),
        Vec3::new(-w, h, d),
        Vec3::new(w, h, d),
    ]
}

fn expand_corners(corners: &[Vec3]) -> Vec<Vec3> {
    BOX_FACES.iter().flatten().map(|&i| corners[i]).collect()
}

impl Geometry {
    /// Two triangles centred on the origin in the XY plane.
    pub fn rectangle(gpu: &Gpu, width: f32, height: f32) -> Result<Self> {
        let (w, h) = (width / 2.0, height / 2.0);
        let p = [
            Vec3::new(-w, -h, 0.0),
            Vec3::new(w, -h, 0.0),
            Vec3::new(-w, h, 0.0),
            Vec3::new(w, h, 0.0),
        ];
        let c = [Vec3::ONE, Vec3::X, Vec3::Y, Vec3::Z];
        let order = [0, 1, 3, 0, 3, 2];

        let mut geometry = Geometry::new(gpu);
        geometry.set_attribute(POSITION_ATTRIBUTE, order.map(|i| p[i]).to_vec())?;
        geometry.set_attribute(COLOR_ATTRIBUTE, order.map(|i| c[i]).to_vec())?;
        geometry.set_attribute(UV_ATTRIBUTE, QUAD_UVS.to_vec())?;
        geometry.shape = GeometryShape::Rectangle;
        Ok(geometry)
    }

    /// Axis-aligned box centred on the origin: 36 vertices, one colour per
    /// face.
    pub fn cuboid(gpu: &Gpu, width: f32, height: f32, depth: f32) -> Result<Self> {
        let positions = expand_corners(&box_corners(width, height, depth));
        let colors: Vec<Vec3> = FACE_COLORS.iter().flat_map(|c| [*c; 6]).collect();
        let uvs: Vec<Vec2> = QUAD_UVS.repeat(6);

        let mut geometry = Geometry::new(gpu);
        geometry.set_attribute(POSITION_ATTRIBUTE, positions)?;
        geometry.set_attribute(COLOR_ATTRIBUTE, colors)?;
        geometry.set_attribute(UV_ATTRIBUTE, uvs)?;
        geometry.shape = GeometryShape::Box;
        Ok(geometry)
    }

    /// Moves the 8 corners of a box geometry.
    pub fn change_position(&mut self, corners: &[Vec3]) -> Result<()> {
        self.set_box_corners(POSITION_ATTRIBUTE, corners)
    }

    /// Recolours a box geometry per corner.
    pub fn change_color(&mut self, colors: &[Vec3]) -> Result<()> {
        self.set_box_corners(COLOR_ATTRIBUTE, colors)
    }

    fn set_box_corners(&mut self, name: &str, corners: &[Vec3]) -> Result<()> {
        if self.shape != GeometryShape::Box {
            return Err(TrellisError::Type(format!(
                "per-corner edits need a box geometry, this one is {:?}",
                self.shape
            )));
        }
        if corners.len() != 8 {
            return Err(TrellisError::Type(format!(
                "box geometry requires 8 corner values, got {}",
                corners.len()
            )));
        }
        self.set_attribute(name, expand_corners(corners))
    }
}
