//! Geometry & Attribute Tests
//!
//! Tests for:
//! - set_attribute create-or-update semantics and buffer uploads
//! - type tags: parsing, missing tags, unsupported tags
//! - vertex counting
//! - merge, apply_matrix
//! - rectangle / box builders and per-corner box edits
//! - buffer release on drop

use std::rc::Rc;

use glam::{Vec2, Vec3};
use trellis::gpu::{Gpu, HeadlessDevice, ScalarType};
use trellis::math;
use trellis::resources::{AttributeData, AttributeType, Geometry, GeometryShape};
use trellis::TrellisError;

const EPSILON: f32 = 1e-5;

fn approx_vec3(a: Vec3, b: Vec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn device() -> (Rc<HeadlessDevice>, Gpu) {
    let _ = env_logger::builder().is_test(true).try_init();
    let device = Rc::new(HeadlessDevice::new());
    let gpu: Gpu = device.clone();
    (device, gpu)
}

fn positions(geometry: &Geometry) -> Vec<Vec3> {
    match geometry.attribute("vertexPosition").unwrap().data() {
        AttributeData::Vec3(points) => points.clone(),
        other => panic!("unexpected data {other:?}"),
    }
}

fn triangle(gpu: &Gpu, offset: f32) -> Geometry {
    let mut geometry = Geometry::new(gpu);
    geometry
        .set_attribute(
            "vertexPosition",
            vec![
                Vec3::new(offset, 0.0, 0.0),
                Vec3::new(offset + 1.0, 0.0, 0.0),
                Vec3::new(offset, 1.0, 0.0),
            ],
        )
        .unwrap();
    geometry
        .set_attribute("vertexColor", vec![Vec3::X, Vec3::Y, Vec3::Z])
        .unwrap();
    geometry
}

// ============================================================================
// Attribute types
// ============================================================================

#[test]
fn attribute_type_tags() {
    assert_eq!("vec3".parse::<AttributeType>().unwrap(), AttributeType::Vec3);
    assert_eq!(AttributeType::Int.components(), 1);
    assert_eq!(AttributeType::Float.components(), 1);
    assert_eq!(AttributeType::Vec2.components(), 2);
    assert_eq!(AttributeType::Vec4.components(), 4);
    assert!(matches!(
        "mat3".parse::<AttributeType>(),
        Err(TrellisError::Configuration(_))
    ));
}

#[test]
fn from_flat_groups_components() {
    let data = AttributeData::from_flat(AttributeType::Vec2, &[1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(data, AttributeData::Vec2(vec![Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)]));
    assert!(AttributeData::from_flat(AttributeType::Vec3, &[1.0, 2.0]).is_err());
}

// ============================================================================
// set_attribute
// ============================================================================

#[test]
fn set_attribute_uploads_f32_data() {
    let (device, gpu) = device();
    let mut geometry = Geometry::new(&gpu);
    geometry
        .set_attribute("vertexPosition", vec![Vec3::new(1.0, 2.0, 3.0), Vec3::new(4.0, 5.0, 6.0)])
        .unwrap();

    let buffer = geometry.attribute("vertexPosition").unwrap().buffer();
    assert_eq!(
        device.buffer_f32(buffer).unwrap(),
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]
    );
}

#[test]
fn set_attribute_updates_existing_buffer() {
    let (device, gpu) = device();
    let mut geometry = Geometry::new(&gpu);
    geometry.set_attribute("weight", vec![1.0_f32, 2.0]).unwrap();
    let buffer = geometry.attribute("weight").unwrap().buffer();

    geometry.set_attribute("weight", vec![7.0_f32, 8.0, 9.0]).unwrap();

    assert_eq!(geometry.attribute("weight").unwrap().buffer(), buffer);
    assert_eq!(device.buffer_f32(buffer).unwrap(), vec![7.0, 8.0, 9.0]);
    assert_eq!(device.live_objects().buffers, 1);
}

#[test]
fn set_attribute_keeps_type_of_existing_name() {
    let (_device, gpu) = device();
    let mut geometry = Geometry::new(&gpu);
    geometry.set_attribute("vertexUV", vec![Vec2::ZERO]).unwrap();

    let result = geometry.set_attribute("vertexUV", vec![Vec3::ZERO]);
    assert!(matches!(result, Err(TrellisError::Configuration(_))));
    assert_eq!(geometry.attribute("vertexUV").unwrap().attribute_type(), AttributeType::Vec2);
}

#[test]
fn slice_api_requires_type_for_new_names() {
    let (_device, gpu) = device();
    let mut geometry = Geometry::new(&gpu);

    let missing = geometry.set_attribute_from_slice("vertexPosition", &[0.0, 0.0, 0.0], None);
    assert!(matches!(missing, Err(TrellisError::Configuration(_))));

    let unsupported = geometry.set_attribute_from_slice("vertexPosition", &[0.0; 9], Some("mat3"));
    assert!(matches!(unsupported, Err(TrellisError::Configuration(_))));
    assert!(!geometry.has_attribute("vertexPosition"));

    geometry
        .set_attribute_from_slice("vertexPosition", &[0.0; 9], Some("vec3"))
        .unwrap();
    assert_eq!(geometry.vertex_count(), 3);

    // Existing names reuse their type; the tag is not needed.
    geometry
        .set_attribute_from_slice("vertexPosition", &[1.0; 6], None)
        .unwrap();
    assert_eq!(geometry.vertex_count(), 2);
}

#[test]
fn int_attributes_upload_as_i32() {
    let (device, gpu) = device();
    let mut geometry = Geometry::new(&gpu);
    geometry.set_attribute("boneIndex", vec![3_i32, -1]).unwrap();

    let attribute = geometry.attribute("boneIndex").unwrap();
    assert_eq!(attribute.attribute_type().scalar(), ScalarType::Int);
    let bytes = device.buffer_bytes(attribute.buffer()).unwrap();
    let values: Vec<i32> = bytes
        .chunks_exact(4)
        .map(|c| i32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(values, vec![3, -1]);
}

// ============================================================================
// Vertex count
// ============================================================================

#[test]
fn vertex_count_follows_first_attribute() {
    let (_device, gpu) = device();
    let mut geometry = Geometry::new(&gpu);
    assert_eq!(geometry.vertex_count(), 0);

    geometry.set_attribute("a", vec![1.0_f32, 2.0, 3.0]).unwrap();
    geometry.set_attribute("b", vec![Vec2::ZERO; 5]).unwrap();

    assert_eq!(geometry.vertex_count(), 3);
    assert_eq!(geometry.count_vertices(None).unwrap(), 3);
    assert_eq!(geometry.count_vertices(Some("b")).unwrap(), 5);
    assert!(matches!(
        geometry.count_vertices(Some("c")),
        Err(TrellisError::Configuration(_))
    ));
}

// ============================================================================
// Merge / apply_matrix
// ============================================================================

#[test]
fn merge_concatenates_in_order() {
    let (device, gpu) = device();
    let mut first = triangle(&gpu, 0.0);
    let second = triangle(&gpu, 10.0);

    first.merge(&second).unwrap();

    assert_eq!(first.vertex_count(), 6);
    let merged = positions(&first);
    assert_eq!(&merged[..3], &positions(&triangle(&gpu, 0.0))[..]);
    assert_eq!(&merged[3..], &positions(&second)[..]);
    let buffer = first.attribute("vertexColor").unwrap().buffer();
    assert_eq!(device.buffer_f32(buffer).unwrap().len(), 18);
}

#[test]
fn merge_rejects_different_attribute_sets() {
    let (_device, gpu) = device();
    let mut first = triangle(&gpu, 0.0);
    let mut second = Geometry::new(&gpu);
    second.set_attribute("vertexPosition", vec![Vec3::ZERO]).unwrap();
    second.set_attribute("vertexUV", vec![Vec3::ZERO]).unwrap();

    assert!(matches!(first.merge(&second), Err(TrellisError::Configuration(_))));
    assert_eq!(first.vertex_count(), 3);
    assert_eq!(first.count_vertices(Some("vertexColor")).unwrap(), 3);
}

#[test]
fn apply_matrix_transforms_positions() {
    let (device, gpu) = device();
    let mut geometry = triangle(&gpu, 0.0);

    geometry.apply_matrix(&math::translation(0.0, 0.0, 2.0)).unwrap();

    let moved = positions(&geometry);
    assert!(approx_vec3(moved[0], Vec3::new(0.0, 0.0, 2.0)));
    assert!(approx_vec3(moved[1], Vec3::new(1.0, 0.0, 2.0)));
    let buffer = geometry.attribute("vertexPosition").unwrap().buffer();
    assert_eq!(device.buffer_f32(buffer).unwrap()[2], 2.0);
}

#[test]
fn apply_matrix_to_unknown_attribute_fails() {
    let (_device, gpu) = device();
    let mut geometry = triangle(&gpu, 0.0);
    let result = geometry.apply_matrix_to(&math::identity(), "vertexNormal");
    assert!(matches!(result, Err(TrellisError::Configuration(_))));
}

// ============================================================================
// Builders
// ============================================================================

#[test]
fn rectangle_has_six_vertices_in_xy_plane() {
    let (_device, gpu) = device();
    let geometry = Geometry::rectangle(&gpu, 2.0, 4.0).unwrap();

    assert_eq!(geometry.shape(), GeometryShape::Rectangle);
    assert_eq!(geometry.vertex_count(), 6);
    assert_eq!(
        geometry.attribute_names().collect::<Vec<_>>(),
        vec!["vertexPosition", "vertexColor", "vertexUV"]
    );
    for p in positions(&geometry) {
        assert_eq!(p.z, 0.0);
        assert_eq!(p.x.abs(), 1.0);
        assert_eq!(p.y.abs(), 2.0);
    }
}

#[test]
fn cuboid_has_thirty_six_vertices_on_eight_corners() {
    let (_device, gpu) = device();
    let geometry = Geometry::cuboid(&gpu, 2.0, 2.0, 2.0).unwrap();

    assert_eq!(geometry.shape(), GeometryShape::Box);
    assert_eq!(geometry.vertex_count(), 36);
    let mut corners = positions(&geometry);
    corners.sort_by(|a, b| a.to_array().partial_cmp(&b.to_array()).unwrap());
    corners.dedup();
    assert_eq!(corners.len(), 8);
    assert!(corners.iter().all(|c| c.abs() == Vec3::ONE));
}

#[test]
fn change_position_expands_corners() {
    let (_device, gpu) = device();
    let mut geometry = Geometry::cuboid(&gpu, 1.0, 1.0, 1.0).unwrap();
    let corners: Vec<Vec3> = (0..8).map(|i| Vec3::splat(i as f32)).collect();

    geometry.change_position(&corners).unwrap();

    let expanded = positions(&geometry);
    assert_eq!(expanded.len(), 36);
    // Right face starts with corners 5, 1, 3.
    assert_eq!(&expanded[..3], &[corners[5], corners[1], corners[3]]);
}

#[test]
fn change_color_needs_eight_values() {
    let (_device, gpu) = device();
    let mut geometry = Geometry::cuboid(&gpu, 1.0, 1.0, 1.0).unwrap();
    let result = geometry.change_color(&[Vec3::ONE; 6]);
    assert!(matches!(result, Err(TrellisError::Type(_))));
}

#[test]
fn change_position_needs_box_geometry() {
    let (_device, gpu) = device();
    let mut geometry = Geometry::rectangle(&gpu, 1.0, 1.0).unwrap();
    let result = geometry.change_position(&[Vec3::ZERO; 8]);
    assert!(matches!(result, Err(TrellisError::Type(_))));
}

// ============================================================================
// Lifetime
// ============================================================================

#[test]
fn dropping_geometry_releases_buffers() {
    let (device, gpu) = device();
    {
        let geometry = Geometry::cuboid(&gpu, 1.0, 1.0, 1.0).unwrap();
        assert_eq!(device.live_objects().buffers, geometry.attribute_names().count());
    }
    assert_eq!(device.live_objects().buffers, 0);
    assert!(device.errors().is_empty());
}
