//! Transform math.
//!
//! Stateless constructors for 4x4 homogeneous matrices. Every function
//! returns a fresh [`Mat4`] value; there is no shared matrix state to alias.
//!
//! Matrices are column-major (glam convention), so the translation of an
//! affine transform lives in `w_axis`, i.e. rows 0..2 of column 3 in the usual
//! mathematical notation.

use glam::{Mat4, Vec3, Vec4};

/// The 4x4 identity matrix.
#[inline]
#[must_use]
pub fn identity() -> Mat4 {
    Mat4::IDENTITY
}

/// Translation along `(x, y, z)`.
#[must_use]
pub fn translation(x: f32, y: f32, z: f32) -> Mat4 {
    Mat4::from_cols(
        Vec4::X,
        Vec4::Y,
        Vec4::Z,
        Vec4::new(x, y, z, 1.0),
    )
}

/// Right-handed rotation about the x-axis by `angle` radians.
#[must_use]
pub fn rotation_x(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    Mat4::from_cols(
        Vec4::X,
        Vec4::new(0.0, c, s, 0.0),
        Vec4::new(0.0, -s, c, 0.0),
        Vec4::W,
    )
}

/// Right-handed rotation about the y-axis by `angle` radians.
#[must_use]
pub fn rotation_y(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    Mat4::from_cols(
        Vec4::new(c, 0.0, -s, 0.0),
        Vec4::Y,
        Vec4::new(s, 0.0, c, 0.0),
        Vec4::W,
    )
}

/// Right-handed rotation about the z-axis by `angle` radians.
#[must_use]
pub fn rotation_z(angle: f32) -> Mat4 {
    let (s, c) = angle.sin_cos();
    Mat4::from_cols(
        Vec4::new(c, s, 0.0, 0.0),
        Vec4::new(-s, c, 0.0, 0.0),
        Vec4::Z,
        Vec4::W,
    )
}

/// Non-uniform scale by `r`, `s`, `t` along x, y, z.
#[must_use]
pub fn scale(r: f32, s: f32, t: f32) -> Mat4 {
    Mat4::from_cols(
        Vec4::new(r, 0.0, 0.0, 0.0),
        Vec4::new(0.0, s, 0.0, 0.0),
        Vec4::new(0.0, 0.0, t, 0.0),
        Vec4::W,
    )
}

/// OpenGL-style perspective projection.
///
/// `fov_degrees` is the vertical field of view. Depth is mapped to the
/// `[-1, 1]` clip range:
///
/// ```text
/// d = 1 / tan(fov / 2)
/// b = (near + far) / (near - far)
/// c = 2 * near * far / (near - far)
///
/// | d/aspect 0  0  0 |
/// | 0        d  0  0 |
/// | 0        0  b  c |
/// | 0        0 -1  0 |
/// ```
#[must_use]
pub fn perspective(fov_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let d = 1.0 / (fov_degrees.to_radians() / 2.0).tan();
    let b = (near + far) / (near - far);
    let c = 2.0 * near * far / (near - far);
    Mat4::from_cols(
        Vec4::new(d / aspect, 0.0, 0.0, 0.0),
        Vec4::new(0.0, d, 0.0, 0.0),
        Vec4::new(0.0, 0.0, b, -1.0),
        Vec4::new(0.0, 0.0, c, 0.0),
    )
}

/// Reads the translation column of `m`.
#[inline]
#[must_use]
pub fn translation_of(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

/// Overwrites only the translation column of `m`, leaving rotation and
/// scale untouched.
#[inline]
pub fn set_translation(m: &mut Mat4, position: Vec3) {
    m.w_axis.x = position.x;
    m.w_axis.y = position.y;
    m.w_axis.z = position.z;
}

/// Transforms a point by `m` (homogenize with `w = 1`, multiply, drop `w`).
#[inline]
#[must_use]
pub fn transform_point(m: &Mat4, p: Vec3) -> Vec3 {
    (*m * p.extend(1.0)).truncate()
}
