//! Head and glasses bookkeeping
//!
//! Holds at most one head and a catalogue of named glasses. Whenever both a
//! head and an active selection exist, the active glasses node is a child of
//! the head; every mutation below re-establishes that.

use std::collections::HashMap;

use crate::calibration::{CalibratedView, PrincipalPointMode, ReconstructionPose, RenderPass};
use crate::config::ViewerConfig;
use crate::scene::{DrawItem, Drawable, NodeId, SceneError, SceneGraph};
use crate::transform::Transform;

#[derive(Debug)]
pub struct SceneManager {
    graph: SceneGraph,
    head: Option<NodeId>,
    head_pose: Option<ReconstructionPose>,
    glasses: HashMap<String, NodeId>,
    active: Option<String>,
    head_depth: f32,
    glasses_offset: [f32; 3],
}

impl SceneManager {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            graph: SceneGraph::new(),
            head: None,
            head_pose: None,
            glasses: HashMap::new(),
            active: None,
            head_depth: config.head_depth,
            glasses_offset: config.glasses_offset,
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    pub fn head_pose(&self) -> Option<&ReconstructionPose> {
        self.head_pose.as_ref()
    }

    pub fn glasses(&self, name: &str) -> Option<NodeId> {
        self.glasses.get(name).copied()
    }

    /// Registered names, sorted for stable presentation.
    pub fn glasses_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.glasses.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn active_glasses(&self) -> Option<&str> {
        self.active.as_deref()
    }

    fn active_node(&self) -> Option<NodeId> {
        self.active.as_deref().and_then(|name| self.glasses(name))
    }

    /// Replace the head. The active glasses move over to the new node and the
    /// old one is dropped from the scene.
    pub fn load_head(
        &mut self,
        drawable: Drawable,
        pose: Option<ReconstructionPose>,
    ) -> Result<NodeId, SceneError> {
        let head = self.graph.spawn(
            Transform::from_translation(0.0, 0.0, self.head_depth),
            Some(drawable),
        );

        if let Some(glasses) = self.active_node() {
            self.graph.add_child(head, glasses)?;
        }
        if let Some(old) = self.head.replace(head) {
            // Keep the old head's rotation so the view doesn't jump.
            let rotation = self.graph.node(old).map(|n| n.transform.rotation);
            if let Some(rotation) = rotation {
                self.graph.transform_mut(head)?.rotation = rotation;
            }
            self.graph.remove(old);
        }
        self.head_pose = pose;

        log::info!(
            "head loaded as {head} ({} calibration)",
            if self.head_pose.is_some() { "with" } else { "without" }
        );
        Ok(head)
    }

    /// Add or replace a named glasses variant. A replaced node that was
    /// active is swapped out of the head for the new one.
    pub fn register_glasses(&mut self, name: &str, drawable: Drawable) -> Result<NodeId, SceneError> {
        let [ox, oy, oz] = self.glasses_offset;
        let node = self
            .graph
            .spawn(Transform::from_translation(ox, oy, oz), Some(drawable));

        if let Some(old) = self.glasses.insert(name.to_owned(), node) {
            let offset = self.graph.node(old).map(|n| n.transform.translation);
            if let Some(offset) = offset {
                self.graph.transform_mut(node)?.translation = offset;
            }
            self.graph.remove(old);
            log::debug!("glasses {name:?} replaced {old} with {node}");
        }

        if self.active.as_deref() == Some(name) {
            if let Some(head) = self.head {
                self.graph.add_child(head, node)?;
            }
        }
        Ok(node)
    }

    /// Make `name` the active glasses. Unknown names are ignored, since the
    /// UI may offer a choice before its asset has arrived.
    pub fn select_glasses(&mut self, name: &str) -> Result<(), SceneError> {
        let Some(next) = self.glasses(name) else {
            log::debug!("ignoring selection of unregistered glasses {name:?}");
            return Ok(());
        };

        if let Some(previous) = self.active_node() {
            if previous != next && self.head.is_some() && self.graph.parent(previous) == self.head {
                self.graph.detach(previous)?;
            }
        }
        self.active = Some(name.to_owned());
        if let Some(head) = self.head {
            self.graph.add_child(head, next)?;
        }

        log::debug!("selected glasses {name:?}");
        Ok(())
    }

    /// Head orbit. The head never rolls, so Z stays zero.
    pub fn set_head_rotation(&mut self, angle_x: f32, angle_y: f32) {
        if let Some(head) = self.head {
            if let Ok(t) = self.graph.transform_mut(head) {
                t.rotation.x = angle_x;
                t.rotation.y = angle_y;
                t.rotation.z = 0.0;
            }
        }
    }

    /// Offset of the active glasses in the head's frame.
    pub fn set_glasses_offset(&mut self, tx: f32, ty: f32, tz: f32) {
        if let Some(glasses) = self.active_node() {
            if let Ok(t) = self.graph.transform_mut(glasses) {
                t.translation.x = tx;
                t.translation.y = ty;
                t.translation.z = tz;
            }
        }
    }

    /// Head first, then what hangs from it. Empty until a head is loaded.
    pub fn draw_list(&self) -> Result<Vec<DrawItem>, SceneError> {
        match self.head {
            Some(head) => self.graph.draw_list(head),
            None => Ok(Vec::new()),
        }
    }

    /// Camera and head placement recovered from the head's calibration.
    /// `None` until a head with a pose record is loaded.
    pub fn calibrated_view(
        &self,
        image_size: f32,
        near: f32,
        far: f32,
        mode: PrincipalPointMode,
    ) -> Option<CalibratedView> {
        self.head?;
        let pose = self.head_pose.as_ref()?;
        Some(CalibratedView::new(pose, image_size, near, far, mode))
    }

    /// Depth-only head pass followed by the glasses, under `view`.
    pub fn calibrated_passes(&self, view: &CalibratedView) -> Result<Vec<RenderPass>, SceneError> {
        match self.head {
            Some(head) => {
                let items = self.graph.draw_list_with_root_world(head, &view.head_model)?;
                Ok(view.passes(&items))
            }
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MeshData;
    use crate::matrix;
    use crate::scene::TextureId;

    fn drawable(texture: u32) -> Drawable {
        Drawable::new(MeshData::cube(1.0), TextureId(texture))
    }

    fn manager() -> SceneManager {
        SceneManager::new(&ViewerConfig::default())
    }

    #[test]
    fn test_select_before_head_then_load() {
        let mut m = manager();
        let a = m.register_glasses("a", drawable(1)).unwrap();
        m.register_glasses("b", drawable(2)).unwrap();
        m.select_glasses("a").unwrap();

        let head = m.load_head(drawable(0), None).unwrap();
        assert_eq!(m.graph().children(head), &[a]);
    }

    #[test]
    fn test_switch_selection_moves_child() {
        let mut m = manager();
        let a = m.register_glasses("a", drawable(1)).unwrap();
        let b = m.register_glasses("b", drawable(2)).unwrap();
        m.select_glasses("a").unwrap();
        let head = m.load_head(drawable(0), None).unwrap();

        m.select_glasses("b").unwrap();
        assert_eq!(m.graph().children(head), &[b]);
        assert_eq!(m.graph().parent(a), None);
        assert_eq!(m.active_glasses(), Some("b"));
    }

    #[test]
    fn test_unknown_selection_is_ignored() {
        let mut m = manager();
        m.register_glasses("a", drawable(1)).unwrap();
        m.select_glasses("a").unwrap();
        m.select_glasses("unknown").unwrap();
        assert_eq!(m.active_glasses(), Some("a"));
    }

    #[test]
    fn test_reloading_head_moves_glasses() {
        let mut m = manager();
        let a = m.register_glasses("a", drawable(1)).unwrap();
        m.select_glasses("a").unwrap();
        let first = m.load_head(drawable(0), None).unwrap();
        m.set_head_rotation(0.2, -0.4);

        let second = m.load_head(drawable(5), None).unwrap();
        assert!(!m.graph().contains(first));
        assert_eq!(m.graph().parent(a), Some(second));
        assert_eq!(m.head(), Some(second));
        let rotation = m.graph().node(second).unwrap().transform.rotation;
        assert_eq!((rotation.x, rotation.y), (0.2, -0.4));
    }

    #[test]
    fn test_replacing_active_glasses_keeps_invariant() {
        let mut m = manager();
        let old = m.register_glasses("a", drawable(1)).unwrap();
        m.select_glasses("a").unwrap();
        let head = m.load_head(drawable(0), None).unwrap();
        m.set_glasses_offset(0.1, 0.2, 0.3);

        let new = m.register_glasses("a", drawable(9)).unwrap();
        assert!(!m.graph().contains(old));
        assert_eq!(m.graph().children(head), &[new]);
        let offset = m.graph().node(new).unwrap().transform.translation;
        assert_eq!((offset.x, offset.y, offset.z), (0.1, 0.2, 0.3));
    }

    #[test]
    fn test_setters_touch_head_and_active_glasses() {
        let mut m = manager();
        let a = m.register_glasses("a", drawable(1)).unwrap();
        m.select_glasses("a").unwrap();
        let head = m.load_head(drawable(0), None).unwrap();

        m.set_head_rotation(0.5, 1.0);
        m.set_glasses_offset(0.0, 0.25, 0.5);

        let h = m.graph().node(head).unwrap().transform;
        assert_eq!((h.rotation.x, h.rotation.y, h.rotation.z), (0.5, 1.0, 0.0));
        assert_eq!(h.translation.z, -6.0);
        let g = m.graph().node(a).unwrap().transform;
        assert_eq!((g.translation.x, g.translation.y, g.translation.z), (0.0, 0.25, 0.5));
    }

    #[test]
    fn test_draw_list_head_first() {
        let mut m = manager();
        assert!(m.draw_list().unwrap().is_empty());

        m.register_glasses("a", drawable(1)).unwrap();
        m.select_glasses("a").unwrap();
        m.load_head(drawable(0), None).unwrap();

        let textures: Vec<u32> = m.draw_list().unwrap().iter().map(|i| i.texture.0).collect();
        assert_eq!(textures, vec![0, 1]);
    }

    #[test]
    fn test_calibrated_view_requires_pose() {
        let mut m = manager();
        assert!(m.calibrated_view(224.0, 0.1, 100.0, PrincipalPointMode::Legacy).is_none());
        m.load_head(drawable(0), None).unwrap();
        assert!(m.calibrated_view(224.0, 0.1, 100.0, PrincipalPointMode::Legacy).is_none());
    }

    #[test]
    fn test_calibrated_passes_follow_pose_not_drag() {
        use crate::calibration::PassMode;
        use crate::transform::RotationState;
        use nalgebra::{Vector2, Vector3};

        let pose = ReconstructionPose {
            translation: Vector3::new(0.0, 0.0, 0.5),
            angles: RotationState::new(0.0, 0.3, 0.0),
            focal_length: 1015.0,
            principal_point: Vector2::new(112.0, 112.0),
            camera_distance: 10.0,
        };
        let mut m = manager();
        let a = m.register_glasses("a", drawable(1)).unwrap();
        m.select_glasses("a").unwrap();
        m.load_head(drawable(0), Some(pose)).unwrap();
        m.set_head_rotation(1.0, 1.0);

        let view = m
            .calibrated_view(224.0, 0.1, 100.0, PrincipalPointMode::Legacy)
            .unwrap();
        let passes = m.calibrated_passes(&view).unwrap();
        assert_eq!(passes.len(), 2);
        assert_eq!(passes[0].mode, PassMode::DepthOnly);
        assert_eq!(passes[0].model, view.head_model);
        assert_eq!(passes[1].mode, PassMode::Color);

        let local = m.graph().local_matrix(a).unwrap();
        let expected = view.glasses_model(&local);
        assert!((passes[1].model - expected).norm() < 1e-6);
        assert!((passes[1].model - matrix::multiply(&view.head_model, &local)).norm() < 1e-6);
    }
}
