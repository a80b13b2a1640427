use mindmap_core::{
    EdgeChange, GraphError, GraphStore, IdGenerator, MindMapConfig, MindMapEdge, MindMapError,
    MindMapNode, MindMapService, NodeChange, Position,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Replays scripted ids, then falls back to `gen-N`.
struct ScriptedIds {
    script: Vec<String>,
    counter: usize,
}

impl ScriptedIds {
    fn new(script: &[&str]) -> Self {
        Self {
            script: script.iter().map(|value| value.to_string()).collect(),
            counter: 0,
        }
    }
}

impl IdGenerator for ScriptedIds {
    fn next_id(&mut self) -> String {
        if !self.script.is_empty() {
            return self.script.remove(0);
        }
        self.counter += 1;
        format!("gen-{}", self.counter)
    }
}

fn setup() -> MindMapService {
    MindMapService::new(MindMapConfig::default())
}

#[test]
fn new_service_holds_single_root() {
    let service = setup();
    let snapshot = service.snapshot();

    assert_eq!(snapshot.nodes().len(), 1);
    assert!(snapshot.edges().is_empty());
    let root = snapshot.root().unwrap();
    assert_eq!(root.id, "root");
    assert_eq!(root.label(), "React Flow Mind Map");
    assert!(!root.hidden);
}

#[test]
fn add_child_creates_one_node_and_one_edge_atomically() {
    let mut service = setup();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    service.subscribe(Box::new(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    }));

    let link = service
        .add_custom_child_node("root", Position::new(10.0, 20.0), None)
        .unwrap();

    assert!(link.created);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let snapshot = service.snapshot();
    assert_eq!(snapshot.nodes().len(), 2);
    assert_eq!(snapshot.edges().len(), 1);

    let edge = &snapshot.edges()[0];
    assert_eq!(edge.id, link.edge_id);
    assert_eq!(edge.source, "root");
    assert_eq!(edge.target, link.target_id);

    let child = snapshot.node(&link.target_id).unwrap();
    assert_eq!(child.label(), "New Node");
    assert_eq!(child.position, Position::new(10.0, 20.0));
    assert_eq!(child.parent_id.as_deref(), Some("root"));
    assert!(!child.hidden);
    assert!(child.animated);
    assert_eq!(snapshot.children_of("root"), [link.target_id.clone()]);
}

#[test]
fn generated_ids_are_unique_across_many_children() {
    let mut service = setup();
    let mut parent = "root".to_string();
    for step in 0..50 {
        let link = service
            .add_custom_child_node(&parent, Position::new(step as f64, 0.0), None)
            .unwrap();
        if step % 3 == 0 {
            parent = link.target_id;
        }
    }

    let snapshot = service.snapshot();
    let node_ids: HashSet<&str> = snapshot.nodes().iter().map(|node| node.id.as_str()).collect();
    let edge_ids: HashSet<&str> = snapshot.edges().iter().map(|edge| edge.id.as_str()).collect();
    assert_eq!(node_ids.len(), 51);
    assert_eq!(edge_ids.len(), 50);
}

#[test]
fn generated_ids_skip_ids_already_in_the_model() {
    let mut service =
        MindMapService::new(MindMapConfig::default()).with_id_generator(ScriptedIds::new(&[
            "root", "n1", "n1", "e1",
        ]));

    let link = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    assert_eq!(link.target_id, "n1");
    // "n1" is a free edge id: node and edge ids live in separate collections.
    assert_eq!(link.edge_id, "n1");

    let second = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    assert_eq!(second.target_id, "e1");
    assert_eq!(second.edge_id, "gen-1");
}

#[test]
fn relink_adds_edge_without_node_or_reparenting() {
    let mut service = setup();
    let a = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    let b = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();

    let before = service.snapshot();
    let relink = service
        .add_custom_child_node(&a.target_id, Position::new(99.0, 99.0), Some(&b.target_id))
        .unwrap();

    assert!(!relink.created);
    assert_eq!(relink.target_id, b.target_id);
    let after = service.snapshot();
    assert_eq!(after.nodes().len(), before.nodes().len());
    assert!(after.same_nodes(&before));
    assert_eq!(after.edges().len(), before.edges().len() + 1);

    let edge = after.edges().last().unwrap();
    assert_eq!(edge.source, a.target_id);
    assert_eq!(edge.target, b.target_id);
    let target = after.node(&b.target_id).unwrap();
    assert_eq!(target.parent_id.as_deref(), Some("root"));
}

#[test]
fn add_child_rejects_missing_parent_or_target() {
    let mut service = setup();
    let before = service.snapshot();

    let err = service
        .add_custom_child_node("ghost", Position::default(), None)
        .unwrap_err();
    assert!(matches!(
        err,
        MindMapError::Graph(GraphError::ParentNotFound(id)) if id == "ghost"
    ));

    let err = service
        .add_custom_child_node("root", Position::default(), Some("ghost"))
        .unwrap_err();
    assert!(matches!(
        err,
        MindMapError::Graph(GraphError::TargetNotFound(id)) if id == "ghost"
    ));

    let after = service.snapshot();
    assert!(after.same_nodes(&before));
    assert!(after.same_edges(&before));
}

#[test]
fn label_update_touches_only_the_matching_node() {
    let mut service = setup();
    let a = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    let b = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    let before = service.snapshot();

    assert!(service.update_node_label(&a.target_id, "Idea"));

    let after = service.snapshot();
    assert!(!after.same_nodes(&before));
    assert!(after.same_edges(&before));
    assert_eq!(after.node(&a.target_id).unwrap().label(), "Idea");
    assert!(Arc::ptr_eq(
        before.node("root").unwrap(),
        after.node("root").unwrap()
    ));
    assert!(Arc::ptr_eq(
        before.node(&b.target_id).unwrap(),
        after.node(&b.target_id).unwrap()
    ));
}

#[test]
fn label_update_on_missing_node_is_silent_noop() {
    let mut service = setup();
    let before = service.snapshot();

    assert!(!service.update_node_label("ghost", "x"));
    assert!(service.snapshot().same_nodes(&before));
}

#[test]
fn node_changes_merge_positions_and_keep_identity() {
    let mut service = setup();
    let a = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    let before = service.snapshot();

    let pending = service.on_nodes_change(vec![NodeChange::Position {
        id: a.target_id.clone(),
        position: Some(Position::new(7.0, 8.0)),
        position_absolute: None,
        dragging: Some(true),
    }]);

    assert!(pending.is_none());
    let after = service.snapshot();
    assert!(!after.same_nodes(&before));
    let moved = after.node(&a.target_id).unwrap();
    assert_eq!(moved.position, Position::new(7.0, 8.0));
    assert!(moved.dragging);
    assert!(Arc::ptr_eq(
        before.node("root").unwrap(),
        after.node("root").unwrap()
    ));
}

#[test]
fn removing_a_branch_takes_descendants_and_their_edges() {
    let mut service = setup();
    let a = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    let a1 = service
        .add_custom_child_node(&a.target_id, Position::default(), None)
        .unwrap();
    let b = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    service
        .add_custom_child_node(&b.target_id, Position::default(), Some(&a1.target_id))
        .unwrap();

    let pending = service.on_nodes_change(vec![NodeChange::Remove {
        id: a.target_id.clone(),
    }]);

    assert!(pending.is_none());
    let snapshot = service.snapshot();
    let ids: Vec<&str> = snapshot.nodes().iter().map(|node| node.id.as_str()).collect();
    assert_eq!(ids, vec!["root", b.target_id.as_str()]);
    assert_eq!(snapshot.edges().len(), 1);
    assert_eq!(snapshot.edges()[0].target, b.target_id);
}

#[test]
fn edge_changes_drop_adds_with_missing_endpoints() {
    let mut service = setup();
    let a = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();

    service.on_edges_change(vec![
        EdgeChange::Add {
            item: MindMapEdge::new("dangling", "root", "ghost"),
        },
        EdgeChange::Add {
            item: MindMapEdge::new("back", a.target_id.clone(), "root"),
        },
        EdgeChange::Select {
            id: a.edge_id.clone(),
            selected: true,
        },
    ]);

    let snapshot = service.snapshot();
    let ids: Vec<&str> = snapshot.edges().iter().map(|edge| edge.id.as_str()).collect();
    assert_eq!(ids, vec![a.edge_id.as_str(), "back"]);
    assert!(snapshot.edges()[0].selected);

    service.on_edges_change(vec![EdgeChange::Remove {
        id: "back".to_string(),
    }]);
    assert_eq!(service.snapshot().edges().len(), 1);
}

#[test]
fn node_add_change_appends_and_indexes_child() {
    let mut service = setup();
    service.on_nodes_change(vec![NodeChange::Add {
        item: MindMapNode::child("manual", "Manual", Position::default(), "root"),
    }]);

    let snapshot = service.snapshot();
    assert_eq!(snapshot.nodes().len(), 2);
    assert_eq!(snapshot.children_of("root"), ["manual".to_string()]);
}

#[test]
fn reset_batch_from_canvas_cannot_replace_the_root() {
    let mut service = setup();
    let child = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    let before = service.snapshot();

    let pending = service.on_nodes_change(vec![NodeChange::Reset {
        item: MindMapNode::root("other", "Other"),
    }]);

    assert!(pending.is_none());
    let after = service.snapshot();
    assert!(after.same_nodes(&before));
    assert!(after.same_edges(&before));
    assert_eq!(after.root().unwrap().id, "root");
    assert_eq!(after.edges()[0].target, child.target_id);
}

#[test]
fn add_changes_that_break_the_tree_are_dropped() {
    let mut service = setup();

    service.on_nodes_change(vec![
        NodeChange::Add {
            item: MindMapNode::child("root", "Dup", Position::default(), "root"),
        },
        NodeChange::Add {
            item: MindMapNode::child("orphan", "Orphan", Position::default(), "ghost"),
        },
        NodeChange::Add {
            item: MindMapNode::root("root2", "Second"),
        },
        NodeChange::Add {
            item: MindMapNode::child("a", "A", Position::default(), "root"),
        },
        NodeChange::Add {
            item: MindMapNode::child("a", "A again", Position::default(), "root"),
        },
        NodeChange::Add {
            item: MindMapNode::child("a1", "A1", Position::default(), "a"),
        },
    ]);

    let snapshot = service.snapshot();
    let nodes: Vec<(&str, Option<&str>)> = snapshot
        .nodes()
        .iter()
        .map(|node| (node.id.as_str(), node.parent_id.as_deref()))
        .collect();
    assert_eq!(
        nodes,
        vec![("root", None), ("a", Some("root")), ("a1", Some("a"))]
    );
    assert_eq!(snapshot.node("a").unwrap().label(), "A");
    assert_eq!(snapshot.children_of("a"), ["a1".to_string()]);
}

#[test]
fn add_under_a_parent_removed_in_the_same_batch_is_dropped() {
    let mut service = setup();
    let a = service
        .add_custom_child_node("root", Position::default(), None)
        .unwrap();
    let a1 = service
        .add_custom_child_node(&a.target_id, Position::default(), None)
        .unwrap();

    service.on_nodes_change(vec![
        NodeChange::Remove {
            id: a.target_id.clone(),
        },
        NodeChange::Add {
            item: MindMapNode::child("late", "Late", Position::default(), a1.target_id.clone()),
        },
    ]);

    let snapshot = service.snapshot();
    assert_eq!(snapshot.nodes().len(), 1);
    assert!(snapshot.node("late").is_none());
    assert!(snapshot.edges().is_empty());
}

#[test]
fn root_may_be_added_back_to_an_empty_map() {
    let mut service = setup();
    let pending = service.request_delete("root").unwrap();
    service
        .resolve_confirmation(&pending, mindmap_core::Decision::Accepted)
        .unwrap();
    assert!(service.snapshot().is_empty());

    service.on_nodes_change(vec![
        NodeChange::Add {
            item: MindMapNode::root("fresh", "Fresh"),
        },
        NodeChange::Add {
            item: MindMapNode::root("extra", "Extra"),
        },
    ]);

    let snapshot = service.snapshot();
    assert_eq!(snapshot.nodes().len(), 1);
    assert_eq!(snapshot.root().unwrap().id, "fresh");
}

#[test]
fn store_reset_drops_edges_left_without_endpoints() {
    let mut store = GraphStore::new(
        vec![
            MindMapNode::root("root", "Root"),
            MindMapNode::child("a", "A", Position::default(), "root"),
        ],
        vec![MindMapEdge::new("e1", "root", "a")],
    );

    store.apply_node_changes(&[NodeChange::Reset {
        item: MindMapNode::root("other", "Other"),
    }]);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.nodes().len(), 1);
    assert!(snapshot.edges().is_empty());
    assert!(snapshot.children_of("root").is_empty());
}
