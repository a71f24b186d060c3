//! Headless demo.
//!
//! Builds a small scene (a spinning colour box, a checkered quad, axes and a
//! floor grid), flies a camera rig through it for a number of frames and
//! reports what the device saw.
//!
//! ```text
//! RUST_LOG=debug cargo run -p headless_demo -- [config.json]
//! ```

use std::rc::Rc;

use anyhow::Context;
use glam::Vec3;
use image::{DynamicImage, Rgba, RgbaImage};
use serde::Deserialize;

use trellis::gpu::{GpuCommand, HeadlessDevice};
use trellis::{
    AxesOptions, Camera, CameraRig, Geometry, GridOptions, Gpu, Material, Mesh, Perspective, Renderer,
    RendererSettings, RigControls, SceneGraph, Space, Texture, TextureData, TextureSettings,
    axes_helper, grid_helper,
};

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DemoConfig {
    renderer: RendererSettings,
    camera: Perspective,
    texture: TextureSettings,
    frames: u32,
    frame_seconds: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            renderer: RendererSettings::default().with_clear_rgb(0.5, 0.5, 0.5),
            camera: Perspective {
                aspect: 16.0 / 9.0,
                ..Perspective::default()
            },
            texture: TextureSettings::default(),
            frames: 120,
            frame_seconds: 1.0 / 60.0,
        }
    }
}

fn load_config() -> anyhow::Result<DemoConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(DemoConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {path}"))
}

fn checker(size: u32, cells: u32) -> DynamicImage {
    let cell = (size / cells).max(1);
    DynamicImage::ImageRgba8(RgbaImage::from_fn(size, size, |x, y| {
        if (x / cell + y / cell) % 2 == 0 {
            Rgba([230, 230, 230, 255])
        } else {
            Rgba([40, 90, 160, 255])
        }
    }))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = load_config()?;

    let device = Rc::new(HeadlessDevice::new());
    let gpu: Gpu = device.clone();
    let renderer = Renderer::new(&gpu, config.renderer);

    let mut graph = SceneGraph::new();
    let scene = graph.create_scene();

    let camera = graph.create_camera(Camera::new(config.camera));
    let rig = CameraRig::new(&mut graph, camera)?;
    graph
        .node_mut(rig.base())?
        .translate(0.0, 1.0, 6.0, Space::Local);
    graph.add(scene, rig.base())?;

    let cube = graph.create_mesh(Mesh::new(
        &gpu,
        Geometry::cuboid(&gpu, 1.0, 1.0, 1.0)?,
        Material::surface(&gpu, [("useVertexColors", true.into())])?,
    )?);
    graph.add(scene, cube)?;

    let texture = Rc::new(Texture::new(
        &gpu,
        &TextureData::from_image(&checker(64, 8)),
        config.texture,
    )?);
    let quad = graph.create_mesh(Mesh::new(
        &gpu,
        Geometry::rectangle(&gpu, 2.0, 2.0)?,
        Material::texture(&gpu, texture, [("repeatUV", glam::Vec2::splat(2.0).into())])?,
    )?);
    graph.node_mut(quad)?.translate(-2.0, 0.0, 0.0, Space::Local);
    graph.add(scene, quad)?;

    let axes = axes_helper(&mut graph, &gpu, &AxesOptions::default())?;
    graph.add(scene, axes)?;
    let grid = grid_helper(&mut graph, &gpu, &GridOptions::default())?;
    graph.node_mut(grid)?.rotate_x(-std::f32::consts::FRAC_PI_2, Space::Local);
    graph.add(scene, grid)?;

    let controls = RigControls {
        move_backward: true,
        turn_left: true,
        ..RigControls::default()
    };

    for _ in 0..config.frames {
        graph
            .node_mut(cube)?
            .rotate_y(0.5 * config.frame_seconds, Space::Local);
        rig.update(&mut graph, &controls, config.frame_seconds)?;
        renderer.render(&mut graph, scene, camera)?;
    }

    let draws = device.draw_calls();
    let vertices: u32 = draws
        .iter()
        .map(|command| match command {
            GpuCommand::DrawArrays { count, .. } => *count,
            _ => 0,
        })
        .sum();
    let eye: Vec3 = graph.world_position(camera)?;

    log::info!(
        "Rendered {} frames: {} draw calls, {} vertices submitted",
        config.frames,
        draws.len(),
        vertices
    );
    log::info!("Camera ended at ({:.2}, {:.2}, {:.2})", eye.x, eye.y, eye.z);
    log::info!("Live device objects: {:?}", device.live_objects());

    for error in device.errors() {
        log::warn!("Device error: {error}");
    }

    Ok(())
}
