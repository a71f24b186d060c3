use crate::errors::Result;
use crate::scene::{NodeKey, SceneGraph, Space};

/// Movement requests for one frame. Filling these in from keyboard or
/// gamepad state is up to the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RigControls {
    pub move_forward: bool,
    pub move_backward: bool,
    pub move_left: bool,
    pub move_right: bool,
    pub move_up: bool,
    pub move_down: bool,
    pub turn_left: bool,
    pub turn_right: bool,
    pub look_up: bool,
    pub look_down: bool,
}

/// A movable base (Group node) carrying a camera that can look up and down.
///
/// The base translates and yaws; pitch is applied to the camera child only,
/// so moving forward always stays level.
#[derive(Debug, Clone)]
pub struct CameraRig {
    base: NodeKey,
    camera: NodeKey,
    pub units_per_second: f32,
    pub degrees_per_second: f32,
    /// Swaps the meaning of `look_up` and `look_down`.
    pub inverted: bool,
}

impl CameraRig {
    /// Creates the base group and attaches `camera` to it.
    pub fn new(graph: &mut SceneGraph, camera: NodeKey) -> Result<Self> {
        graph.camera(camera)?;
        let base = graph.create_group();
        graph.node_mut(base)?.name = "CameraRig".to_string();
        graph.add(base, camera)?;

        Ok(Self {
            base,
            camera,
            units_per_second: 1.5,
            degrees_per_second: 60.0,
            inverted: true,
        })
    }

    /// The group node to attach to a scene and to position.
    #[inline]
    #[must_use]
    pub fn base(&self) -> NodeKey {
        self.base
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> NodeKey {
        self.camera
    }

    pub fn update(&self, graph: &mut SceneGraph, controls: &RigControls, delta_seconds: f32) -> Result<()> {
        let step = self.units_per_second * delta_seconds;
        let turn = self.degrees_per_second.to_radians() * delta_seconds;

        let base = graph.node_mut(self.base)?;
        if controls.move_forward {
            base.translate(0.0, 0.0, -step, Space::Local);
        }
        if controls.move_backward {
            base.translate(0.0, 0.0, step, Space::Local);
        }
        if controls.move_left {
            base.translate(-step, 0.0, 0.0, Space::Local);
        }
        if controls.move_right {
            base.translate(step, 0.0, 0.0, Space::Local);
        }
        if controls.move_up {
            base.translate(0.0, step, 0.0, Space::Local);
        }
        if controls.move_down {
            base.translate(0.0, -step, 0.0, Space::Local);
        }
        if controls.turn_right {
            base.rotate_y(-turn, Space::Local);
        }
        if controls.turn_left {
            base.rotate_y(turn, Space::Local);
        }

        let (look_up, look_down) = if self.inverted {
            (controls.look_down, controls.look_up)
        } else {
            (controls.look_up, controls.look_down)
        };
        let camera = graph.node_mut(self.camera)?;
        if look_up {
            camera.rotate_x(turn, Space::Local);
        }
        if look_down {
            camera.rotate_x(-turn, Space::Local);
        }
        Ok(())
    }
}
