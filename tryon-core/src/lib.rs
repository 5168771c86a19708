//! Tryon Core Library - scene and camera logic for the glasses viewer
//!
//! This library holds everything a front end needs short of drawing pixels:
//! matrix math, the node arena, head/glasses bookkeeping, calibrated
//! re-projection over a reference photograph, and load tracking.

pub mod app;
pub mod calibration;
pub mod config;
pub mod geometry;
pub mod input;
pub mod loader;
pub mod manager;
pub mod matrix;
pub mod obj;
pub mod scene;
pub mod transform;

// Re-export commonly used types
pub use app::{Frame, LoadNotice, ResultFrame, Viewer};
pub use calibration::{CalibratedView, PassMode, PrincipalPointMode, ReconstructionPose, RenderPass};
pub use config::ViewerConfig;
pub use geometry::{MeshData, MeshError};
pub use input::{Axis, DragInput, GlassesOffset};
pub use loader::{AssetError, LoadEvent, LoadSlot, LoadTicket, LoadedAsset};
pub use manager::SceneManager;
pub use matrix::Mat4;
pub use scene::{DrawItem, Drawable, NodeId, SceneError, SceneGraph, TextureId};
pub use transform::{RotationState, Transform};
