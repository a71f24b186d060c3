//! Scene Graph Tests
//!
//! Tests for:
//! - add / remove hierarchy rules (double parenting, root parenting, cycles)
//! - world matrix composition and world position
//! - preorder descendant list
//! - local transform operations in local and parent space
//! - camera view matrix refresh and the camera rig
//! - destroy releasing mesh GPU objects

use std::f32::consts::FRAC_PI_4;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use trellis::gpu::{Gpu, HeadlessDevice};
use trellis::math;
use trellis::resources::{Geometry, Material, Mesh};
use trellis::scene::{Camera, CameraRig, NodeKey, NodeKind, Perspective, RigControls, SceneGraph, Space};
use trellis::TrellisError;

const EPSILON: f32 = 1e-5;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn approx_mat4(a: &Mat4, b: &Mat4) -> bool {
    a.abs_diff_eq(*b, EPSILON)
}

fn device() -> (Rc<HeadlessDevice>, Gpu) {
    let _ = env_logger::builder().is_test(true).try_init();
    let device = Rc::new(HeadlessDevice::new());
    let gpu: Gpu = device.clone();
    (device, gpu)
}

fn box_mesh(gpu: &Gpu) -> Mesh {
    let geometry = Geometry::cuboid(gpu, 1.0, 1.0, 1.0).unwrap();
    let material = Material::surface(gpu, []).unwrap();
    Mesh::new(gpu, geometry, material).unwrap()
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn add_links_both_sides() {
    let mut graph = SceneGraph::new();
    let scene = graph.create_scene();
    let group = graph.create_group();

    graph.add(scene, group).unwrap();

    assert_eq!(graph.node(group).unwrap().parent(), Some(scene));
    assert_eq!(graph.node(scene).unwrap().children(), &[group]);
}

#[test]
fn add_already_parented_child_fails_and_keeps_link() {
    let mut graph = SceneGraph::new();
    let first = graph.create_group();
    let second = graph.create_group();
    let child = graph.create_group();
    graph.add(first, child).unwrap();

    let result = graph.add(second, child);

    assert!(matches!(result, Err(TrellisError::Hierarchy(_))));
    assert_eq!(graph.node(child).unwrap().parent(), Some(first));
    assert_eq!(graph.node(first).unwrap().children(), &[child]);
    assert!(graph.node(second).unwrap().children().is_empty());
}

#[test]
fn adding_same_child_twice_fails() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_group();
    let child = graph.create_group();
    graph.add(parent, child).unwrap();

    assert!(matches!(graph.add(parent, child), Err(TrellisError::Hierarchy(_))));
    assert_eq!(graph.node(parent).unwrap().children().len(), 1);
}

#[test]
fn scene_root_cannot_have_parent() {
    let mut graph = SceneGraph::new();
    let group = graph.create_group();
    let scene = graph.create_scene();

    assert!(matches!(graph.add(group, scene), Err(TrellisError::Hierarchy(_))));
    assert_eq!(graph.node(scene).unwrap().parent(), None);
}

#[test]
fn cycles_are_rejected() {
    let mut graph = SceneGraph::new();
    let a = graph.create_group();
    let b = graph.create_group();
    let c = graph.create_group();
    graph.add(a, b).unwrap();
    graph.add(b, c).unwrap();

    assert!(matches!(graph.add(c, a), Err(TrellisError::Hierarchy(_))));
    assert!(matches!(graph.add(a, a), Err(TrellisError::Hierarchy(_))));
}

#[test]
fn remove_detaches_child() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_group();
    let child = graph.create_group();
    graph.add(parent, child).unwrap();

    graph.remove(parent, child).unwrap();

    assert_eq!(graph.node(child).unwrap().parent(), None);
    assert!(graph.node(parent).unwrap().children().is_empty());
    // Detached nodes can be attached elsewhere.
    let other = graph.create_group();
    graph.add(other, child).unwrap();
}

#[test]
fn remove_non_child_fails() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_group();
    let stranger = graph.create_group();
    assert!(matches!(graph.remove(parent, stranger), Err(TrellisError::Hierarchy(_))));
}

#[test]
fn stale_key_reports_node_not_found() {
    let mut graph = SceneGraph::new();
    let node = graph.create_group();
    graph.destroy(node).unwrap();
    assert!(matches!(graph.world_matrix(node), Err(TrellisError::NodeNotFound(_))));
}

// ============================================================================
// World transforms
// ============================================================================

#[test]
fn world_matrix_is_parent_world_times_local() {
    let mut graph = SceneGraph::new();
    let scene = graph.create_scene();
    let parent = graph.create_group();
    let child = graph.create_group();
    graph.add(scene, parent).unwrap();
    graph.add(parent, child).unwrap();

    graph.node_mut(scene).unwrap().translate(0.0, 1.0, 0.0, Space::Local);
    graph.node_mut(parent).unwrap().rotate_z(0.4, Space::Local);
    graph.node_mut(parent).unwrap().translate(2.0, 0.0, 0.0, Space::Local);
    graph.node_mut(child).unwrap().scale_uniform(3.0, Space::Local);
    graph.node_mut(child).unwrap().translate(0.0, 0.0, -1.0, Space::Local);

    let local = graph.node(child).unwrap().transform;
    let expected = graph.world_matrix(parent).unwrap() * local;
    assert!(approx_mat4(&graph.world_matrix(child).unwrap(), &expected));
}

#[test]
fn world_matrix_tracks_tree_changes() {
    let mut graph = SceneGraph::new();
    let parent = graph.create_group();
    let child = graph.create_group();
    graph.node_mut(parent).unwrap().translate(5.0, 0.0, 0.0, Space::Local);

    assert!(approx_vec3(graph.world_position(child).unwrap(), Vec3::ZERO));
    graph.add(parent, child).unwrap();
    assert!(approx_vec3(graph.world_position(child).unwrap(), Vec3::new(5.0, 0.0, 0.0)));
    graph.remove(parent, child).unwrap();
    assert!(approx_vec3(graph.world_position(child).unwrap(), Vec3::ZERO));
}

#[test]
fn rotated_box_scenario() {
    let (_device, gpu) = device();
    let mut graph = SceneGraph::new();
    let scene = graph.create_scene();
    let mesh = graph.create_mesh(box_mesh(&gpu));
    graph.add(scene, mesh).unwrap();

    let node = graph.node_mut(mesh).unwrap();
    node.rotate_y(FRAC_PI_4, Space::Local);
    node.set_position(Vec3::new(0.0, 0.5, 0.0));

    assert!(approx_vec3(graph.world_position(mesh).unwrap(), Vec3::new(0.0, 0.5, 0.0)));
    let expected = math::translation(0.0, 0.5, 0.0) * math::rotation_y(FRAC_PI_4);
    assert!(approx_mat4(&graph.world_matrix(mesh).unwrap(), &expected));
}

// ============================================================================
// Local transform operations
// ============================================================================

fn detached_group(graph: &mut SceneGraph) -> NodeKey {
    graph.create_group()
}

#[test]
fn inverse_translation_restores_transform() {
    let mut graph = SceneGraph::new();
    for space in [Space::Local, Space::Parent] {
        let key = detached_group(&mut graph);
        let node = graph.node_mut(key).unwrap();
        node.rotate_x(0.25, Space::Local);
        node.translate(1.0, 2.0, 3.0, Space::Parent);
        let before = node.transform;

        node.translate(0.5, -4.0, 8.0, space);
        node.translate(-0.5, 4.0, -8.0, space);

        assert!(approx_mat4(&node.transform, &before));
    }
}

#[test]
fn inverse_translation_is_exact_for_dyadic_offsets() {
    let mut graph = SceneGraph::new();
    for space in [Space::Local, Space::Parent] {
        let key = detached_group(&mut graph);
        let node = graph.node_mut(key).unwrap();
        node.translate(1.0, 2.0, 3.0, Space::Local);
        let before = node.transform;

        node.translate(0.5, -4.0, 8.0, space);
        node.translate(-0.5, 4.0, -8.0, space);

        assert_eq!(node.transform, before);
    }
}

#[test]
fn local_and_parent_space_differ_under_rotation() {
    let mut graph = SceneGraph::new();
    let local = detached_group(&mut graph);
    let parent = detached_group(&mut graph);

    let node = graph.node_mut(local).unwrap();
    node.rotate_y(std::f32::consts::FRAC_PI_2, Space::Local);
    node.translate(0.0, 0.0, -1.0, Space::Local);

    let node = graph.node_mut(parent).unwrap();
    node.rotate_y(std::f32::consts::FRAC_PI_2, Space::Local);
    node.translate(0.0, 0.0, -1.0, Space::Parent);

    assert!(approx_vec3(graph.node(local).unwrap().position(), Vec3::new(-1.0, 0.0, 0.0)));
    assert!(approx_vec3(graph.node(parent).unwrap().position(), Vec3::new(0.0, 0.0, -1.0)));
}

#[test]
fn apply_matrix_order() {
    let m = math::scale(2.0, 2.0, 2.0);
    let t = math::translation(1.0, 0.0, 0.0);
    let mut graph = SceneGraph::new();

    let key = detached_group(&mut graph);
    let local = graph.node_mut(key).unwrap();
    local.transform = t;
    local.apply_matrix(m, Space::Local);
    assert!(approx_mat4(&local.transform, &(t * m)));

    let key = detached_group(&mut graph);
    let parent = graph.node_mut(key).unwrap();
    parent.transform = t;
    parent.apply_matrix(m, Space::Parent);
    assert!(approx_mat4(&parent.transform, &(m * t)));
}

#[test]
fn set_position_only_touches_translation() {
    let mut graph = SceneGraph::new();
    let key = detached_group(&mut graph);
    let node = graph.node_mut(key).unwrap();
    node.rotate_z(0.8, Space::Local);
    node.scale_uniform(2.0, Space::Local);
    let before = node.transform;

    node.set_position(Vec3::new(7.0, 8.0, 9.0));

    assert_eq!(node.position(), Vec3::new(7.0, 8.0, 9.0));
    assert_eq!(node.transform.x_axis, before.x_axis);
    assert_eq!(node.transform.z_axis, before.z_axis);
}

// ============================================================================
// Node kind
// ============================================================================

#[test]
fn attached_node_keeps_its_kind() {
    let mut graph = SceneGraph::new();
    let scene = graph.create_scene();
    let group = graph.create_group();
    graph.add(scene, group).unwrap();

    let node = graph.node_mut(group).unwrap();
    node.translate(1.0, 0.0, 0.0, Space::Local);
    node.name = "renamed".to_string();

    let node = graph.node(group).unwrap();
    assert!(matches!(node.kind(), NodeKind::Group));
    assert!(!node.is_scene());
    assert_eq!(node.parent(), Some(scene));
    assert_eq!(graph.node(scene).unwrap().kind().label(), "Scene");
}

#[test]
fn scene_nodes_never_gain_a_parent() {
    let mut graph = SceneGraph::new();
    let outer = graph.create_scene();
    let inner = graph.create_scene();

    let err = graph.add(outer, inner).unwrap_err();

    assert!(matches!(err, TrellisError::Hierarchy(_)));
    assert!(graph
        .iter()
        .filter(|(_, node)| node.is_scene())
        .all(|(_, node)| node.parent().is_none()));
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn descendant_list_is_preorder() {
    let mut graph = SceneGraph::new();
    let root = graph.create_scene();
    let a = graph.create_group();
    let a1 = graph.create_group();
    let a2 = graph.create_group();
    let b = graph.create_group();
    let b1 = graph.create_group();
    graph.add(root, a).unwrap();
    graph.add(a, a1).unwrap();
    graph.add(a, a2).unwrap();
    graph.add(root, b).unwrap();
    graph.add(b, b1).unwrap();

    assert_eq!(graph.descendant_list(root).unwrap(), vec![root, a, a1, a2, b, b1]);
    assert_eq!(graph.descendant_list(b).unwrap(), vec![b, b1]);
}

// ============================================================================
// Camera
// ============================================================================

#[test]
fn view_matrix_inverts_world_matrix() {
    let mut graph = SceneGraph::new();
    let rig = graph.create_group();
    let camera = graph.create_camera(Camera::new(Perspective::default()));
    graph.add(rig, camera).unwrap();

    graph.node_mut(rig).unwrap().translate(1.0, 2.0, 3.0, Space::Local);
    graph.node_mut(rig).unwrap().rotate_y(0.6, Space::Local);
    graph.node_mut(camera).unwrap().rotate_x(-0.3, Space::Local);
    graph.node_mut(camera).unwrap().translate(0.0, 0.0, 4.0, Space::Local);

    graph.refresh_view_matrix(camera).unwrap();

    let view = graph.camera(camera).unwrap().view_matrix();
    let world = graph.world_matrix(camera).unwrap();
    assert!(approx_mat4(&(view * world), &Mat4::IDENTITY));
}

#[test]
fn view_matrix_only_changes_on_refresh() {
    let mut graph = SceneGraph::new();
    let camera = graph.create_camera(Camera::default());
    graph.node_mut(camera).unwrap().translate(0.0, 0.0, 5.0, Space::Local);

    assert_eq!(graph.camera(camera).unwrap().view_matrix(), Mat4::IDENTITY);
    graph.refresh_view_matrix(camera).unwrap();
    assert!(approx_mat4(
        &graph.camera(camera).unwrap().view_matrix(),
        &math::translation(0.0, 0.0, -5.0)
    ));
}

#[test]
fn camera_projection_uses_parameters() {
    let params = Perspective {
        fov_degrees: 45.0,
        aspect: 2.0,
        near: 0.5,
        far: 100.0,
    };
    let camera = Camera::new(params);
    assert!(approx_mat4(
        &camera.projection_matrix(),
        &math::perspective(45.0, 2.0, 0.5, 100.0)
    ));
}

#[test]
fn perspective_defaults_from_partial_json() {
    let params: Perspective = serde_json::from_str(r#"{ "aspect": 1.5 }"#).unwrap();
    assert_eq!(params.aspect, 1.5);
    assert_eq!(params.fov_degrees, 60.0);
    assert_eq!(params.far, 1000.0);
}

#[test]
fn refresh_view_matrix_rejects_non_camera() {
    let mut graph = SceneGraph::new();
    let group = graph.create_group();
    assert!(matches!(graph.refresh_view_matrix(group), Err(TrellisError::Type(_))));
}

// ============================================================================
// Camera rig
// ============================================================================

#[test]
fn rig_moves_base_and_pitches_camera() {
    let mut graph = SceneGraph::new();
    let camera = graph.create_camera(Camera::default());
    let mut rig = CameraRig::new(&mut graph, camera).unwrap();
    rig.inverted = false;

    let forward = RigControls {
        move_forward: true,
        ..Default::default()
    };
    rig.update(&mut graph, &forward, 2.0).unwrap();
    assert!(approx_vec3(graph.node(rig.base()).unwrap().position(), Vec3::new(0.0, 0.0, -3.0)));

    let look_up = RigControls {
        look_up: true,
        ..Default::default()
    };
    rig.update(&mut graph, &look_up, 0.5).unwrap();
    let expected = math::rotation_x(30f32.to_radians());
    assert!(approx_mat4(&graph.node(camera).unwrap().transform, &expected));
    // Pitch never tilts the base.
    assert!(approx_mat4(
        &graph.node(rig.base()).unwrap().transform,
        &math::translation(0.0, 0.0, -3.0)
    ));
}

#[test]
fn inverted_rig_swaps_look_direction() {
    let mut graph = SceneGraph::new();
    let camera = graph.create_camera(Camera::default());
    let rig = CameraRig::new(&mut graph, camera).unwrap();
    assert!(rig.inverted);

    let look_up = RigControls {
        look_up: true,
        ..Default::default()
    };
    rig.update(&mut graph, &look_up, 1.0).unwrap();
    let expected = math::rotation_x(-60f32.to_radians());
    assert!(approx_mat4(&graph.node(camera).unwrap().transform, &expected));
}

#[test]
fn rig_requires_camera_node() {
    let mut graph = SceneGraph::new();
    let group = graph.create_group();
    assert!(matches!(CameraRig::new(&mut graph, group), Err(TrellisError::Type(_))));
}

// ============================================================================
// Lifetime
// ============================================================================

#[test]
fn destroy_drops_subtree_and_gpu_objects() {
    let (device, gpu) = device();
    let mut graph = SceneGraph::new();
    let scene = graph.create_scene();
    let group = graph.create_group();
    let mesh = graph.create_mesh(box_mesh(&gpu));
    graph.add(scene, group).unwrap();
    graph.add(group, mesh).unwrap();
    assert!(device.live_objects().total() > 0);

    graph.destroy(group).unwrap();

    assert!(!graph.contains(group));
    assert!(!graph.contains(mesh));
    assert!(graph.node(scene).unwrap().children().is_empty());
    assert_eq!(device.live_objects().total(), 0);
    assert!(device.errors().is_empty());
}
