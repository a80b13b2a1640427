use mindmap_core::{
    CanvasOrigin, Dimensions, DropTarget, MindMapConfig, MindMapService, NodeChange, Position,
    ViewportTransform,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const ORIGIN: CanvasOrigin = CanvasOrigin {
    left: 10.0,
    top: 20.0,
};

/// Writes canvas measurements for `node_id` the way the renderer does.
fn measure(service: &mut MindMapService, node_id: &str, absolute: Position) {
    service.on_nodes_change(vec![
        NodeChange::Dimensions {
            id: node_id.to_string(),
            dimensions: Some(Dimensions {
                width: 80.0,
                height: 40.0,
            }),
        },
        NodeChange::Position {
            id: node_id.to_string(),
            position: None,
            position_absolute: Some(absolute),
            dragging: None,
        },
    ]);
}

#[test]
fn drop_on_pane_creates_child_at_resolved_position() {
    let mut service = MindMapService::new(MindMapConfig::default());
    measure(&mut service, "root", Position::new(100.0, 50.0));

    service.connect_start("root");
    let link = service
        .connect_end(
            DropTarget::Pane,
            Position::new(210.0, 170.0),
            ORIGIN,
            &ViewportTransform::default(),
        )
        .unwrap()
        .unwrap();

    assert!(link.created);
    let child = service.snapshot().node(&link.target_id).unwrap().clone();
    // pane = (200, 150); minus parent absolute, plus half size.
    assert_eq!(child.position, Position::new(140.0, 120.0));
    assert_eq!(child.parent_id.as_deref(), Some("root"));
}

#[test]
fn drop_on_pane_applies_viewport_zoom() {
    let mut service = MindMapService::new(MindMapConfig::default());
    measure(&mut service, "root", Position::new(0.0, 0.0));
    let viewport = ViewportTransform {
        x: 40.0,
        y: 0.0,
        zoom: 2.0,
    };

    service.connect_start("root");
    let link = service
        .connect_end(DropTarget::Pane, Position::new(250.0, 120.0), ORIGIN, &viewport)
        .unwrap()
        .unwrap();

    let child = service.snapshot().node(&link.target_id).unwrap().clone();
    assert_eq!(child.position, Position::new(140.0, 70.0));
}

#[test]
fn drop_from_unmeasured_node_creates_nothing() {
    let mut service = MindMapService::new(MindMapConfig::default());
    let before = service.snapshot();

    service.connect_start("root");
    let outcome = service
        .connect_end(
            DropTarget::Pane,
            Position::new(50.0, 50.0),
            ORIGIN,
            &ViewportTransform::default(),
        )
        .unwrap();

    assert!(outcome.is_none());
    assert!(service.snapshot().same_nodes(&before));
    assert!(service.snapshot().same_edges(&before));
}

#[test]
fn drop_on_other_node_relinks() {
    let mut service = MindMapService::new(MindMapConfig::default());
    let a = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap()
        .target_id;
    let b = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap()
        .target_id;
    let before = service.snapshot();

    service.connect_start(&a);
    let link = service
        .connect_end(
            DropTarget::Node(b.clone()),
            Position::default(),
            ORIGIN,
            &ViewportTransform::default(),
        )
        .unwrap()
        .unwrap();

    assert!(!link.created);
    assert_eq!(link.target_id, b);
    let after = service.snapshot();
    assert!(after.same_nodes(&before));
    assert_eq!(after.edges().len(), 3);
}

#[test]
fn drop_on_source_or_elsewhere_is_noop() {
    let mut service = MindMapService::new(MindMapConfig::default());
    measure(&mut service, "root", Position::new(0.0, 0.0));
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    service.subscribe(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    service.connect_start("root");
    let outcome = service
        .connect_end(
            DropTarget::Node("root".to_string()),
            Position::default(),
            ORIGIN,
            &ViewportTransform::default(),
        )
        .unwrap();
    assert!(outcome.is_none());

    service.connect_start("root");
    let outcome = service
        .connect_end(
            DropTarget::Elsewhere,
            Position::default(),
            ORIGIN,
            &ViewportTransform::default(),
        )
        .unwrap();
    assert!(outcome.is_none());
    assert_eq!(notified.load(Ordering::SeqCst), 0);
}

#[test]
fn connect_end_without_start_is_noop() {
    let mut service = MindMapService::new(MindMapConfig::default());
    measure(&mut service, "root", Position::new(0.0, 0.0));

    let outcome = service
        .connect_end(
            DropTarget::Pane,
            Position::default(),
            ORIGIN,
            &ViewportTransform::default(),
        )
        .unwrap();

    assert!(outcome.is_none());
    assert_eq!(service.snapshot().nodes().len(), 1);
}

#[test]
fn subscribers_stop_after_unsubscribe() {
    let mut service = MindMapService::new(MindMapConfig::default());
    let notified = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notified);
    let subscription = service.subscribe(Box::new(move |snapshot| {
        assert!(!snapshot.is_empty());
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    service.toggle_collapse("root");
    assert_eq!(notified.load(Ordering::SeqCst), 2);

    assert!(service.unsubscribe(subscription));
    service.toggle_collapse("root");
    assert_eq!(notified.load(Ordering::SeqCst), 2);
    assert!(!service.unsubscribe(subscription));
}

#[test]
fn drop_from_zero_sized_node_creates_nothing() {
    let mut service = MindMapService::new(MindMapConfig::default());
    measure(&mut service, "root", Position::new(0.0, 0.0));
    service.on_nodes_change(vec![NodeChange::Dimensions {
        id: "root".to_string(),
        dimensions: Some(Dimensions {
            width: 0.0,
            height: 0.0,
        }),
    }]);

    service.connect_start("root");
    let outcome = service
        .connect_end(
            DropTarget::Pane,
            Position::new(50.0, 50.0),
            ORIGIN,
            &ViewportTransform::default(),
        )
        .unwrap();

    assert!(outcome.is_none());
    assert_eq!(service.snapshot().nodes().len(), 1);
}
