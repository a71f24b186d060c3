//! Debug visualisation builders.

use glam::Vec3;

use crate::errors::Result;
use crate::gpu::Gpu;
use crate::resources::{COLOR_ATTRIBUTE, Geometry, LineType, Material, Mesh, POSITION_ATTRIBUTE};
use crate::scene::{NodeKey, SceneGraph, Space};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxesOptions {
    pub length: f32,
    pub thickness: f32,
    /// Colours of the X, Y and Z axes.
    pub colors: [Vec3; 3],
}

impl Default for AxesOptions {
    fn default() -> Self {
        Self {
            length: 1.0,
            thickness: 0.1,
            colors: [Vec3::X, Vec3::Y, Vec3::Z],
        }
    }
}

/// Three long thin boxes along the positive axes, under one group node.
///
/// Returns the group; attach it wherever the axes should appear.
pub fn axes_helper(graph: &mut SceneGraph, gpu: &Gpu, options: &AxesOptions) -> Result<NodeKey> {
    let AxesOptions { length, thickness, colors } = *options;
    let offset = length / 2.0 + thickness / 2.0;

    let group = graph.create_group();
    graph.node_mut(group)?.name = "AxesHelper".to_string();

    let axes = [
        (Vec3::new(length, thickness, thickness), Vec3::new(offset, 0.0, 0.0)),
        (Vec3::new(thickness, length, thickness), Vec3::new(0.0, offset, 0.0)),
        (Vec3::new(thickness, thickness, length), Vec3::new(0.0, 0.0, offset)),
    ];

    for ((size, position), color) in axes.into_iter().zip(colors) {
        let geometry = Geometry::cuboid(gpu, size.x, size.y, size.z)?;
        let material = Material::surface(gpu, [("baseColor", color.into())])?;
        let axis = graph.create_mesh(Mesh::new(gpu, geometry, material)?);
        graph
            .node_mut(axis)?
            .translate(position.x, position.y, position.z, Space::Local);
        graph.add(group, axis)?;
    }

    Ok(group)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOptions {
    pub size: f32,
    pub divisions: u32,
    pub minor_color: Vec3,
    /// Colour of the two lines through the origin.
    pub major_color: Vec3,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            size: 10.0,
            divisions: 10,
            minor_color: Vec3::ZERO,
            major_color: Vec3::splat(0.5),
        }
    }
}

/// A square grid of line segments in the XY plane, centred on the origin.
pub fn grid_helper(graph: &mut SceneGraph, gpu: &Gpu, options: &GridOptions) -> Result<NodeKey> {
    let half = options.size / 2.0;
    let step = options.size / options.divisions.max(1) as f32;
    let ticks: Vec<f32> = (0..=options.divisions).map(|n| -half + n as f32 * step).collect();

    let mut positions = Vec::with_capacity(ticks.len() * 4);
    let mut colors = Vec::with_capacity(ticks.len() * 4);
    let color_of = |t: f32| {
        if t.abs() < f32::EPSILON {
            options.major_color
        } else {
            options.minor_color
        }
    };

    for &x in &ticks {
        positions.extend([Vec3::new(x, -half, 0.0), Vec3::new(x, half, 0.0)]);
        colors.extend([color_of(x); 2]);
    }
    for &y in &ticks {
        positions.extend([Vec3::new(-half, y, 0.0), Vec3::new(half, y, 0.0)]);
        colors.extend([color_of(y); 2]);
    }

    let mut geometry = Geometry::new(gpu);
    geometry.set_attribute(POSITION_ATTRIBUTE, positions)?;
    geometry.set_attribute(COLOR_ATTRIBUTE, colors)?;

    let material = Material::line(
        gpu,
        [("useVertexColors", true.into()), ("lineType", LineType::Segments.into())],
    )?;

    let grid = graph.create_mesh(Mesh::new(gpu, geometry, material)?);
    graph.node_mut(grid)?.name = "GridHelper".to_string();
    Ok(grid)
}
