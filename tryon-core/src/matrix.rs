//! 4x4 matrix builders shared by the interactive and calibrated views
//!
//! Matrices are `nalgebra::Matrix4<f32>`, stored column-major, so `m[k]`
//! addresses the same element as the flat 16-float layout uploaded to the
//! GPU. Column vectors are assumed: `multiply(a, b)` applies `b` first.

use nalgebra::{Matrix4, Point3, Rotation3, Vector3};

pub type Mat4 = Matrix4<f32>;

pub fn identity() -> Mat4 {
    Mat4::identity()
}

/// `a · b`. Operands are borrowed and the product is a fresh matrix.
pub fn multiply(a: &Mat4, b: &Mat4) -> Mat4 {
    a * b
}

pub fn translation(tx: f32, ty: f32, tz: f32) -> Mat4 {
    Mat4::new_translation(&Vector3::new(tx, ty, tz))
}

pub fn rotation_x(radians: f32) -> Mat4 {
    Rotation3::from_axis_angle(&Vector3::x_axis(), radians).to_homogeneous()
}

pub fn rotation_y(radians: f32) -> Mat4 {
    Rotation3::from_axis_angle(&Vector3::y_axis(), radians).to_homogeneous()
}

pub fn rotation_z(radians: f32) -> Mat4 {
    Rotation3::from_axis_angle(&Vector3::z_axis(), radians).to_homogeneous()
}

pub fn scaling(sx: f32, sy: f32, sz: f32) -> Mat4 {
    Mat4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
}

/// `m = m · T(tx, ty, tz)`
pub fn translate(m: &mut Mat4, tx: f32, ty: f32, tz: f32) {
    *m = multiply(m, &translation(tx, ty, tz));
}

/// `m = m · Rx(radians)`
pub fn rotate_x(m: &mut Mat4, radians: f32) {
    *m = multiply(m, &rotation_x(radians));
}

/// `m = m · Ry(radians)`
pub fn rotate_y(m: &mut Mat4, radians: f32) {
    *m = multiply(m, &rotation_y(radians));
}

/// `m = m · Rz(radians)`
pub fn rotate_z(m: &mut Mat4, radians: f32) {
    *m = multiply(m, &rotation_z(radians));
}

/// `m = m · S(sx, sy, sz)`
pub fn scale(m: &mut Mat4, sx: f32, sy: f32, sz: f32) {
    *m = multiply(m, &scaling(sx, sy, sz));
}

/// Local matrix in the fixed order `T · Rz · Ry · Rx · S`.
///
/// Changing this order changes how every node is placed.
pub fn compose_trs(translation: &Vector3<f32>, rotation: &Vector3<f32>, scale_by: &Vector3<f32>) -> Mat4 {
    let mut m = self::translation(translation.x, translation.y, translation.z);
    rotate_z(&mut m, rotation.z);
    rotate_y(&mut m, rotation.y);
    rotate_x(&mut m, rotation.x);
    scale(&mut m, scale_by.x, scale_by.y, scale_by.z);
    m
}

/// OpenGL-style right-handed perspective projection.
///
/// `f = cot(fovY / 2)`. No validation: a zero aspect or `near == far`
/// produces non-finite entries.
pub fn perspective(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
    let f = 1.0 / (fov_y_degrees.to_radians() / 2.0).tan();
    let nf = 1.0 / (near - far);

    let mut m = Mat4::zeros();
    m[0] = f / aspect;
    m[5] = f;
    m[10] = (far + near) * nf;
    m[11] = -1.0;
    m[14] = 2.0 * far * near * nf;
    m
}

/// Flat column-major copy for uniform upload.
pub fn to_column_major(m: &Mat4) -> [f32; 16] {
    let mut out = [0.0; 16];
    out.copy_from_slice(m.as_slice());
    out
}

/// Apply `m` to a point, including the homogeneous divide.
pub fn transform_point(m: &Mat4, point: &Point3<f32>) -> Point3<f32> {
    m.transform_point(point)
}
