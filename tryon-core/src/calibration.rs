//! Calibrated re-projection
//!
//! Rebuilds the camera a reference photograph was taken with, from the pose
//! and pinhole parameters estimated offline, so the head and glasses can be
//! drawn over that photograph. The head pose comes from the estimate, not
//! from interactive input.

use std::sync::Arc;

use nalgebra::{Vector2, Vector3};
use serde::Deserialize;

use crate::geometry::MeshData;
use crate::matrix::{self, Mat4};
use crate::scene::{DrawItem, TextureId};
use crate::transform::RotationState;

/// Pose and camera estimate paired with a loaded head
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconstructionPose {
    pub translation: Vector3<f32>,
    /// Radians, applied as `Rz · Ry · Rx`
    pub angles: RotationState,
    pub focal_length: f32,
    /// Pixels in the photograph
    pub principal_point: Vector2<f32>,
    pub camera_distance: f32,
}

/// Wire shape of the pose record
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoseRecord {
    translation: [f32; 3],
    rotation_angles: [f32; 3],
    focal_length: f32,
    principal_point: [f32; 2],
    reference_distance: f32,
}

impl From<PoseRecord> for ReconstructionPose {
    fn from(r: PoseRecord) -> Self {
        Self {
            translation: Vector3::from(r.translation),
            angles: RotationState::new(r.rotation_angles[0], r.rotation_angles[1], r.rotation_angles[2]),
            focal_length: r.focal_length,
            principal_point: Vector2::from(r.principal_point),
            camera_distance: r.reference_distance,
        }
    }
}

impl ReconstructionPose {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<PoseRecord>(text).map(Self::from)
    }
}

/// How the vertical principal-point offset is derived.
///
/// `Legacy` takes the vertical offset from the horizontal coordinate.
/// Existing calibration data may compensate for that, so it stays the
/// default until the data is re-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalPointMode {
    #[default]
    Legacy,
    /// Vertical offset from the vertical coordinate, image rows growing down
    Corrected,
}

/// How a pass writes to the framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassMode {
    /// Depth only, color writes disabled
    DepthOnly,
    Color,
}

#[derive(Debug, Clone)]
pub struct RenderPass {
    pub mode: PassMode,
    pub mesh: Arc<MeshData>,
    pub texture: TextureId,
    pub model: Mat4,
}

/// Matrices for drawing over the reference photograph
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedView {
    pub projection: Mat4,
    pub head_model: Mat4,
}

impl CalibratedView {
    pub fn new(
        pose: &ReconstructionPose,
        image_size: f32,
        near: f32,
        far: f32,
        mode: PrincipalPointMode,
    ) -> Self {
        Self {
            projection: calibrated_projection(pose, image_size, near, far, mode),
            head_model: head_model_matrix(pose),
        }
    }

    /// Glasses follow the estimated head pose, not the interactive one.
    pub fn glasses_model(&self, glasses_local: &Mat4) -> Mat4 {
        matrix::multiply(&self.head_model, glasses_local)
    }

    /// Head into the depth buffer first, then everything attached to it in
    /// color, so the photograph supplies the head's appearance while still
    /// occluding the glasses.
    ///
    /// `items` is the head subtree laid out with the head at
    /// [`CalibratedView::head_model`]; the first item is the head.
    pub fn passes(&self, items: &[DrawItem]) -> Vec<RenderPass> {
        items
            .iter()
            .enumerate()
            .map(|(i, item)| RenderPass {
                mode: if i == 0 { PassMode::DepthOnly } else { PassMode::Color },
                mesh: Arc::clone(&item.mesh),
                texture: item.texture,
                model: item.world,
            })
            .collect()
    }
}

/// `T(tx, ty, tz - distance) · Rz · Ry · Rx`
pub fn head_model_matrix(pose: &ReconstructionPose) -> Mat4 {
    let t = pose.translation;
    matrix::multiply(
        &matrix::translation(t.x, t.y, t.z - pose.camera_distance),
        &pose.angles.matrix(),
    )
}

/// Vertical field of view, in degrees, of a pinhole camera with the given
/// focal length over an image `image_size` pixels tall.
pub fn focal_to_fov_degrees(focal_length: f32, image_size: f32) -> f32 {
    (2.0 * (image_size / (2.0 * focal_length)).atan()).to_degrees()
}

/// Perspective matrix from focal length, with the optical axis moved to the
/// photograph's principal point.
pub fn calibrated_projection(
    pose: &ReconstructionPose,
    image_size: f32,
    near: f32,
    far: f32,
    mode: PrincipalPointMode,
) -> Mat4 {
    let fov = focal_to_fov_degrees(pose.focal_length, image_size);
    let mut proj = matrix::perspective(fov, 1.0, near, far);

    let offset_x = (pose.principal_point.x / image_size) * 2.0 - 1.0;
    let offset_y = match mode {
        PrincipalPointMode::Legacy => -offset_x,
        PrincipalPointMode::Corrected => (pose.principal_point.y / image_size) * 2.0 - 1.0,
    };
    proj[8] = -offset_x;
    proj[9] = offset_y;
    proj
}
