//! Scene arena
//!
//! Nodes live in a map keyed by [`NodeId`]; parent and child links are
//! handles, so reparenting never moves a node and a stale handle is simply
//! absent. Links are kept acyclic: [`SceneGraph::add_child`] refuses any
//! parent that is already a descendant of the child.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::geometry::MeshData;
use crate::matrix::{self, Mat4};
use crate::transform::Transform;

/// Opaque, never-reused node handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Texture handle owned by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

/// Mesh and texture, always present together
#[derive(Debug, Clone)]
pub struct Drawable {
    pub mesh: Arc<MeshData>,
    pub texture: TextureId,
}

impl Drawable {
    pub fn new(mesh: MeshData, texture: TextureId) -> Self {
        Self {
            mesh: Arc::new(mesh),
            texture,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("{0} is not in the scene")]
    UnknownNode(NodeId),
    #[error("attaching {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub transform: Transform,
    drawable: Option<Drawable>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn drawable(&self) -> Option<&Drawable> {
        self.drawable.as_ref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// One entry of the renderer's draw list
#[derive(Debug, Clone)]
pub struct DrawItem {
    pub node: NodeId,
    pub mesh: Arc<MeshData>,
    pub texture: TextureId,
    pub world: Mat4,
}

#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: HashMap<NodeId, Node>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, transform: Transform, drawable: Option<Drawable>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(
            id,
            Node {
                transform,
                drawable,
                parent: None,
                children: Vec::new(),
            },
        );
        id
    }

    /// Remove a node, detaching it from its parent. Its children become roots.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.detach(id).ok()?;
        let node = self.nodes.remove(&id)?;
        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
        }
        Some(node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn transform_mut(&mut self, id: NodeId) -> Result<&mut Transform, SceneError> {
        self.nodes
            .get_mut(&id)
            .map(|n| &mut n.transform)
            .ok_or(SceneError::UnknownNode(id))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn set_local_transform(
        &mut self,
        id: NodeId,
        tx: f32,
        ty: f32,
        tz: f32,
        rx: f32,
        ry: f32,
        rz: f32,
        sx: f32,
        sy: f32,
        sz: f32,
    ) -> Result<(), SceneError> {
        self.transform_mut(id)?.set(tx, ty, tz, rx, ry, rz, sx, sy, sz);
        Ok(())
    }

    /// Swap in freshly loaded mesh and texture.
    pub fn set_drawable(&mut self, id: NodeId, drawable: Drawable) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        node.drawable = Some(drawable);
        Ok(())
    }

    /// Attach `child` under `parent`, first detaching it from any previous
    /// parent. Attaching to the current parent is a no-op.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        if !self.contains(parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        if !self.contains(child) {
            return Err(SceneError::UnknownNode(child));
        }
        if self.parent(child) == Some(parent) {
            return Ok(());
        }
        if self.is_ancestor_or_self(child, parent) {
            return Err(SceneError::Cycle { parent, child });
        }

        self.detach(child)?;
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(child);
        }
        log::debug!("scene: attached {child} under {parent}");
        Ok(())
    }

    /// Clear `child`'s parent link, if any.
    pub fn detach(&mut self, child: NodeId) -> Result<(), SceneError> {
        let old_parent = self
            .nodes
            .get_mut(&child)
            .ok_or(SceneError::UnknownNode(child))?
            .parent
            .take();
        if let Some(old_parent) = old_parent {
            if let Some(node) = self.nodes.get_mut(&old_parent) {
                node.children.retain(|c| *c != child);
            }
            log::debug!("scene: detached {child} from {old_parent}");
        }
        Ok(())
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == ancestor {
                return true;
            }
            match self.parent(node) {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    pub fn local_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        self.nodes
            .get(&id)
            .map(|n| n.transform.local_matrix())
            .ok_or(SceneError::UnknownNode(id))
    }

    /// `parent.world · local`, walking up to the root.
    pub fn world_matrix(&self, id: NodeId) -> Result<Mat4, SceneError> {
        let mut world = self.local_matrix(id)?;
        let mut current = self.parent(id);
        while let Some(parent) = current {
            world = matrix::multiply(&self.local_matrix(parent)?, &world);
            current = self.parent(parent);
        }
        Ok(world)
    }

    /// Depth-first draw list for the subtree at `root`: each node before its
    /// children, children in attachment order. Nodes still waiting for their
    /// mesh are skipped but their subtrees are not.
    pub fn draw_list(&self, root: NodeId) -> Result<Vec<DrawItem>, SceneError> {
        let world = self.world_matrix(root)?;
        self.draw_list_with_root_world(root, &world)
    }

    /// Same traversal, with `root` placed at `root_world` instead of its own
    /// world matrix. Descendants keep their local transforms.
    pub fn draw_list_with_root_world(
        &self,
        root: NodeId,
        root_world: &Mat4,
    ) -> Result<Vec<DrawItem>, SceneError> {
        let mut items = Vec::new();
        self.collect_draw_items(root, *root_world, &mut items)?;
        Ok(items)
    }

    fn collect_draw_items(
        &self,
        id: NodeId,
        world: Mat4,
        items: &mut Vec<DrawItem>,
    ) -> Result<(), SceneError> {
        let node = self.nodes.get(&id).ok_or(SceneError::UnknownNode(id))?;

        if let Some(drawable) = &node.drawable {
            items.push(DrawItem {
                node: id,
                mesh: Arc::clone(&drawable.mesh),
                texture: drawable.texture,
                world,
            });
        }
        for &child in &node.children {
            let child_world = matrix::multiply(&world, &self.local_matrix(child)?);
            self.collect_draw_items(child, child_world, items)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawable(texture: u32) -> Drawable {
        Drawable::new(MeshData::cube(1.0), TextureId(texture))
    }

    #[test]
    fn test_root_world_equals_local() {
        let mut sg = SceneGraph::new();
        let id = sg.spawn(Transform::from_translation(1.0, 2.0, 3.0), None);
        sg.transform_mut(id).unwrap().rotation.rotate(0.3, 0.1, 0.0);
        assert_eq!(sg.world_matrix(id).unwrap(), sg.local_matrix(id).unwrap());
    }

    #[test]
    fn test_child_world_composes_parent() {
        let mut sg = SceneGraph::new();
        let parent = sg.spawn(Transform::from_translation(0.0, 0.0, -6.0), None);
        let child = sg.spawn(Transform::from_translation(0.0, 0.3, 0.6), None);
        sg.transform_mut(parent).unwrap().rotation.rotate(0.4, -0.2, 0.0);
        sg.add_child(parent, child).unwrap();

        let expected = matrix::multiply(
            &sg.world_matrix(parent).unwrap(),
            &sg.local_matrix(child).unwrap(),
        );
        assert!((sg.world_matrix(child).unwrap() - expected).norm() < 1e-5);
    }

    #[test]
    fn test_reparent_keeps_single_parent() {
        let mut sg = SceneGraph::new();
        let a = sg.spawn(Transform::identity(), None);
        let b = sg.spawn(Transform::identity(), None);
        let c = sg.spawn(Transform::identity(), None);

        sg.add_child(a, c).unwrap();
        sg.add_child(b, c).unwrap();

        assert_eq!(sg.parent(c), Some(b));
        assert!(!sg.children(a).contains(&c));
        assert_eq!(sg.children(b), &[c]);
    }

    #[test]
    fn test_add_child_twice_does_not_duplicate() {
        let mut sg = SceneGraph::new();
        let a = sg.spawn(Transform::identity(), None);
        let c = sg.spawn(Transform::identity(), None);
        sg.add_child(a, c).unwrap();
        sg.add_child(a, c).unwrap();
        assert_eq!(sg.children(a), &[c]);
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut sg = SceneGraph::new();
        let a = sg.spawn(Transform::identity(), None);
        let b = sg.spawn(Transform::identity(), None);
        let c = sg.spawn(Transform::identity(), None);
        sg.add_child(a, b).unwrap();
        sg.add_child(b, c).unwrap();

        assert_eq!(sg.add_child(c, a), Err(SceneError::Cycle { parent: c, child: a }));
        assert_eq!(sg.add_child(a, a), Err(SceneError::Cycle { parent: a, child: a }));
        // Failed attach leaves links untouched.
        assert_eq!(sg.parent(a), None);
        assert_eq!(sg.children(c), &[] as &[NodeId]);
    }

    #[test]
    fn test_detached_node_world_is_local() {
        let mut sg = SceneGraph::new();
        let a = sg.spawn(Transform::from_translation(5.0, 0.0, 0.0), None);
        let c = sg.spawn(Transform::from_translation(0.0, 1.0, 0.0), None);
        sg.add_child(a, c).unwrap();
        sg.detach(c).unwrap();
        assert_eq!(sg.world_matrix(c).unwrap(), sg.local_matrix(c).unwrap());
    }

    #[test]
    fn test_remove_orphans_children() {
        let mut sg = SceneGraph::new();
        let a = sg.spawn(Transform::identity(), None);
        let c = sg.spawn(Transform::identity(), None);
        sg.add_child(a, c).unwrap();

        assert!(sg.remove(a).is_some());
        assert!(!sg.contains(a));
        assert_eq!(sg.parent(c), None);
        assert_eq!(sg.world_matrix(a), Err(SceneError::UnknownNode(a)));
    }

    #[test]
    fn test_unknown_handles() {
        let mut sg = SceneGraph::new();
        let a = sg.spawn(Transform::identity(), None);
        let gone = sg.spawn(Transform::identity(), None);
        sg.remove(gone);
        assert_eq!(sg.add_child(a, gone), Err(SceneError::UnknownNode(gone)));
        assert!(sg.remove(gone).is_none());
    }

    #[test]
    fn test_draw_list_order_and_skipping() {
        let mut sg = SceneGraph::new();
        let head = sg.spawn(Transform::from_translation(0.0, 0.0, -6.0), Some(drawable(1)));
        let pending = sg.spawn(Transform::identity(), None);
        let glasses = sg.spawn(Transform::from_translation(0.0, 0.3, 0.6), Some(drawable(2)));
        sg.add_child(head, pending).unwrap();
        sg.add_child(pending, glasses).unwrap();

        let items = sg.draw_list(head).unwrap();
        let nodes: Vec<NodeId> = items.iter().map(|i| i.node).collect();
        assert_eq!(nodes, vec![head, glasses]);
        assert_eq!(items[1].texture, TextureId(2));
        assert!((items[1].world - sg.world_matrix(glasses).unwrap()).norm() < 1e-5);
    }

    #[test]
    fn test_root_world_override_moves_whole_subtree() {
        let mut sg = SceneGraph::new();
        let head = sg.spawn(Transform::from_translation(0.0, 0.0, -6.0), Some(drawable(1)));
        let glasses = sg.spawn(Transform::from_translation(0.0, 0.3, 0.6), Some(drawable(2)));
        sg.add_child(head, glasses).unwrap();

        let placed = matrix::translation(1.0, 0.0, -10.0);
        let items = sg.draw_list_with_root_world(head, &placed).unwrap();
        assert_eq!(items[0].world, placed);
        let expected = placed * sg.local_matrix(glasses).unwrap();
        assert!((items[1].world - expected).norm() < 1e-6);
    }

    #[test]
    fn test_late_drawable_becomes_renderable() {
        let mut sg = SceneGraph::new();
        let id = sg.spawn(Transform::identity(), None);
        assert!(sg.draw_list(id).unwrap().is_empty());
        sg.set_drawable(id, drawable(7)).unwrap();
        assert_eq!(sg.draw_list(id).unwrap().len(), 1);
    }
}
