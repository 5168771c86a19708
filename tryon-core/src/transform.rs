//! Local transforms: translation, Euler rotation and scale.

use nalgebra::Vector3;

use crate::matrix::{self, Mat4};

/// Rotation around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// `Rz · Ry · Rx`
    pub fn matrix(&self) -> Mat4 {
        matrix::rotation_z(self.z) * matrix::rotation_y(self.y) * matrix::rotation_x(self.x)
    }

    pub fn as_vector(&self) -> Vector3<f32> {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Parent-relative placement of a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: RotationState,
    pub scale: Vector3<f32>,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            translation: Vector3::zeros(),
            rotation: RotationState::zero(),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(tx: f32, ty: f32, tz: f32) -> Self {
        Self {
            translation: Vector3::new(tx, ty, tz),
            ..Self::identity()
        }
    }

    /// Overwrite every component. Values are taken as given.
    #[allow(clippy::too_many_arguments)]
    pub fn set(&mut self, tx: f32, ty: f32, tz: f32, rx: f32, ry: f32, rz: f32, sx: f32, sy: f32, sz: f32) {
        self.translation = Vector3::new(tx, ty, tz);
        self.rotation = RotationState::new(rx, ry, rz);
        self.scale = Vector3::new(sx, sy, sz);
    }

    /// `T · Rz · Ry · Rx · S`, recomputed from the current fields.
    pub fn local_matrix(&self) -> Mat4 {
        matrix::compose_trs(&self.translation, &self.rotation.as_vector(), &self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = RotationState::zero().matrix();
        assert!((matrix - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn test_identity_transform_gives_identity_matrix() {
        let mut t = Transform::from_translation(3.0, 2.0, 1.0);
        t.set(0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0);
        assert_eq!(t.local_matrix(), matrix::identity());
    }

    #[test]
    fn test_local_matrix_without_scale_matches_rotation_state() {
        let mut t = Transform::identity();
        t.rotation = RotationState::new(0.2, -0.4, 0.9);
        t.translation = Vector3::new(1.0, 0.0, -2.0);
        let expected = matrix::translation(1.0, 0.0, -2.0) * t.rotation.matrix();
        assert!((t.local_matrix() - expected).norm() < 1e-6);
    }
}
