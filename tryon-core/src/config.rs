//! Viewer tuning values; every key is optional in serialized form.

use serde::Deserialize;

use crate::calibration::PrincipalPointMode;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Vertical field of view of the interactive camera, degrees
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Head distance in front of the interactive camera (negative Z)
    pub head_depth: f32,
    /// Radians of head rotation per dragged pixel
    pub drag_sensitivity: f32,
    /// Initial offset of newly registered glasses, in the head's frame
    pub glasses_offset: [f32; 3],
    /// Side length of the reference photograph, pixels
    pub image_size: f32,
    pub principal_point: PrincipalPointMode,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            fov_deg: 45.0,
            near: 0.1,
            far: 100.0,
            head_depth: -6.0,
            drag_sensitivity: 0.01,
            glasses_offset: [0.0, 0.3, 0.6],
            image_size: 224.0,
            principal_point: PrincipalPointMode::Legacy,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_take_defaults() {
        let cfg = ViewerConfig::from_json(r#"{"fov_deg": 60.0, "principal_point": "corrected"}"#).unwrap();
        assert_eq!(cfg.fov_deg, 60.0);
        assert_eq!(cfg.principal_point, PrincipalPointMode::Corrected);
        assert_eq!(cfg.head_depth, -6.0);
        assert_eq!(cfg.glasses_offset, [0.0, 0.3, 0.6]);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(ViewerConfig::from_json("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_unknown_principal_point_mode_is_error() {
        assert!(ViewerConfig::from_json(r#"{"principal_point": "sideways"}"#).is_err());
    }
}
