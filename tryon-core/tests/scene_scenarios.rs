use std::f32::consts::PI;

use nalgebra::Point3;
use tryon_core::matrix;
use tryon_core::{
    Drawable, LoadEvent, LoadSlot, LoadedAsset, MeshData, ReconstructionPose, SceneGraph,
    SceneManager, TextureId, Transform, Viewer, ViewerConfig,
};

fn drawable(texture: u32) -> Drawable {
    Drawable::new(MeshData::cube(1.0), TextureId(texture))
}

#[test]
fn world_matrices_compose_down_the_chain() {
    let mut graph = SceneGraph::new();
    let root = graph.spawn(Transform::from_translation(1.0, 0.0, -4.0), None);
    let mid = graph.spawn(Transform::identity(), None);
    let leaf = graph.spawn(Transform::from_translation(0.0, 0.5, 0.0), Some(drawable(1)));
    graph
        .set_local_transform(mid, 0.0, 1.0, 0.0, 0.1, 0.7, -0.2, 1.0, 2.0, 1.0)
        .unwrap();
    graph.add_child(root, mid).unwrap();
    graph.add_child(mid, leaf).unwrap();

    assert_eq!(graph.world_matrix(root).unwrap(), graph.local_matrix(root).unwrap());
    for (parent, child) in [(root, mid), (mid, leaf)] {
        let expected = matrix::multiply(
            &graph.world_matrix(parent).unwrap(),
            &graph.local_matrix(child).unwrap(),
        );
        assert!((graph.world_matrix(child).unwrap() - expected).norm() < 1e-5);
    }
}

#[test]
fn reparenting_keeps_a_single_parent() {
    let mut graph = SceneGraph::new();
    let a = graph.spawn(Transform::identity(), None);
    let b = graph.spawn(Transform::identity(), None);
    let c = graph.spawn(Transform::identity(), None);

    graph.add_child(a, c).unwrap();
    graph.add_child(b, c).unwrap();

    assert_eq!(graph.parent(c), Some(b));
    assert!(!graph.children(a).contains(&c));
    assert_eq!(graph.children(b), &[c]);
}

#[test]
fn identity_transform_is_identity_matrix() {
    let mut graph = SceneGraph::new();
    let n = graph.spawn(Transform::identity(), None);
    graph
        .set_local_transform(n, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0)
        .unwrap();
    assert_eq!(graph.local_matrix(n).unwrap(), matrix::identity());
}

#[test]
fn origin_lands_on_translation() {
    let mut t = Transform::identity();
    t.set(1.0, 2.0, 3.0, PI, 0.0, 0.0, 1.0, 1.0, 1.0);
    let p = matrix::transform_point(&t.local_matrix(), &Point3::origin());
    assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
}

#[test]
fn glasses_follow_selection() {
    let mut manager = SceneManager::new(&ViewerConfig::default());
    let a = manager.register_glasses("a", drawable(1)).unwrap();
    let b = manager.register_glasses("b", drawable(2)).unwrap();
    manager.select_glasses("a").unwrap();
    let head = manager.load_head(drawable(0), None).unwrap();
    assert_eq!(manager.graph().children(head), &[a]);

    manager.select_glasses("b").unwrap();
    assert!(manager.graph().children(head).contains(&b));
    assert!(!manager.graph().children(head).contains(&a));
    assert_eq!(manager.graph().parent(a), None);

    manager.select_glasses("unknown").unwrap();
    assert_eq!(manager.active_glasses(), Some("b"));
}

#[test]
fn perspective_reference_values() {
    let m = matrix::perspective(90.0, 1.0, 1.0, 2.0);
    assert!((m[0] - 1.0).abs() < 1e-6);
    assert!((m[5] - 1.0).abs() < 1e-6);
    assert!((m[10] + 3.0).abs() < 1e-6);
    assert_eq!(m[11], -1.0);
    assert!((m[14] + 4.0).abs() < 1e-6);
}

#[test]
fn late_load_for_a_replaced_slot_is_dropped() {
    let pose = ReconstructionPose::from_json(
        r#"{"translation":[0.1,0,0],"rotationAngles":[0,0,0],"focalLength":1015,
            "principalPoint":[112,112],"referenceDistance":10}"#,
    )
    .unwrap();
    let mut viewer = Viewer::new(ViewerConfig::default());

    let slow = viewer.begin_load(LoadSlot::Head);
    let fast = viewer.begin_load(LoadSlot::Head);
    let sender = viewer.sender();
    std::thread::spawn(move || {
        let asset = LoadedAsset { drawable: drawable(5), pose: Some(pose) };
        sender.send(LoadEvent::Ready { ticket: fast, asset }).unwrap();
    })
    .join()
    .unwrap();
    viewer.frame().unwrap();

    // The first request finally completes, after it was superseded.
    viewer.post(LoadEvent::Ready {
        ticket: slow,
        asset: LoadedAsset { drawable: drawable(9), pose: None },
    });
    let frame = viewer.frame().unwrap();

    assert_eq!(frame.items.len(), 1);
    assert_eq!(frame.items[0].texture, TextureId(5));
    assert!(viewer.manager().head_pose().is_some());
    assert!(viewer.result_frame().unwrap().is_some());
}
