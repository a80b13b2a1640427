//! Authoritative node/edge collections and their transitions.
//!
//! # Responsibility
//! - Own every node and edge record; hand out shared read-only snapshots.
//! - Apply each logical mutation as exactly one transition and notify
//!   subscribers once, after the transition is complete.
//!
//! # Invariants
//! - Every transition replaces the changed container(s) with new ones, so
//!   observers can detect change by pointer comparison.
//! - Records a transition does not touch keep their `Arc` identity.
//! - A structural node change drops every edge left without an endpoint
//!   in the same transition.
//! - The child index always matches the committed node collection.

use crate::graph::changes::{self, EdgeChange, NodeChange};
use crate::graph::collapse;
use crate::graph::index::ChildIndex;
use crate::model::edge::MindMapEdge;
use crate::model::node::{MindMapNode, NodeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Handle returned by [`GraphStore::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observer invoked with the committed snapshot after every transition.
pub type Listener = Box<dyn FnMut(&GraphSnapshot) + Send>;

/// Read-only view of the model at one point in time.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    nodes: Arc<Vec<Arc<MindMapNode>>>,
    edges: Arc<Vec<Arc<MindMapEdge>>>,
    children: Arc<ChildIndex>,
}

impl GraphSnapshot {
    pub fn nodes(&self) -> &[Arc<MindMapNode>] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Arc<MindMapEdge>] {
        &self.edges
    }

    pub fn node(&self, node_id: &str) -> Option<&Arc<MindMapNode>> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    /// First node without a parent.
    pub fn root(&self) -> Option<&Arc<MindMapNode>> {
        self.nodes.iter().find(|node| node.is_root())
    }

    /// Direct children of `node_id` by hierarchy (not by edges).
    pub fn children_of(&self, node_id: &str) -> &[NodeId] {
        self.children.children_of(node_id)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes the canvas should draw.
    pub fn visible_nodes(&self) -> Vec<Arc<MindMapNode>> {
        self.nodes
            .iter()
            .filter(|node| !node.hidden)
            .cloned()
            .collect()
    }

    /// Edges whose endpoints both exist and are visible.
    pub fn visible_edges(&self) -> Vec<Arc<MindMapEdge>> {
        let visible: HashSet<&str> = self
            .nodes
            .iter()
            .filter(|node| !node.hidden)
            .map(|node| node.id.as_str())
            .collect();
        self.edges
            .iter()
            .filter(|edge| {
                visible.contains(edge.source.as_str()) && visible.contains(edge.target.as_str())
            })
            .cloned()
            .collect()
    }

    /// Whether both snapshots share the same node container.
    pub fn same_nodes(&self, other: &GraphSnapshot) -> bool {
        Arc::ptr_eq(&self.nodes, &other.nodes)
    }

    /// Whether both snapshots share the same edge container.
    pub fn same_edges(&self, other: &GraphSnapshot) -> bool {
        Arc::ptr_eq(&self.edges, &other.edges)
    }
}

enum IndexUpdate {
    Keep,
    Append { parent_id: NodeId, child_id: NodeId },
    Rebuild,
}

/// In-memory graph store. Constructed by the composition root; there is no
/// process-wide instance.
pub struct GraphStore {
    snapshot: GraphSnapshot,
    node_slots: HashMap<NodeId, usize>,
    edge_ids: HashSet<NodeId>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl GraphStore {
    /// Creates a store holding `nodes` and `edges`.
    pub fn new(nodes: Vec<MindMapNode>, edges: Vec<MindMapEdge>) -> Self {
        let mut store = Self {
            snapshot: GraphSnapshot::default(),
            node_slots: HashMap::new(),
            edge_ids: HashSet::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        };
        store.install(nodes, edges);
        store
    }

    /// Returns the current snapshot. Cheap: only reference counts change.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.snapshot.clone()
    }

    pub fn node(&self, node_id: &str) -> Option<&Arc<MindMapNode>> {
        self.node_slots
            .get(node_id)
            .and_then(|slot| self.snapshot.nodes.get(*slot))
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.node_slots.contains_key(node_id)
    }

    pub fn contains_edge(&self, edge_id: &str) -> bool {
        self.edge_ids.contains(edge_id)
    }

    pub fn node_count(&self) -> usize {
        self.snapshot.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.snapshot.edges.len()
    }

    /// Id of the first node without a parent.
    pub fn root_id(&self) -> Option<&str> {
        self.snapshot.root().map(|node| node.id.as_str())
    }

    pub fn children(&self) -> &ChildIndex {
        &self.snapshot.children
    }

    /// Registers `listener`; it runs after every later transition.
    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, listener));
        id
    }

    /// Removes a listener. Returns `false` for unknown handles.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(registered, _)| *registered != id);
        self.listeners.len() != before
    }

    /// Overwrites both collections unconditionally.
    pub fn replace_all(&mut self, nodes: Vec<MindMapNode>, edges: Vec<MindMapEdge>) {
        self.install(nodes, edges);
        self.publish();
    }

    /// Merges a node delta batch.
    ///
    /// A `remove` takes the node's whole hierarchy subtree with it. After any
    /// structural change, edges with a missing endpoint are dropped. Returns
    /// the ids of all nodes removed by `remove` changes.
    pub fn apply_node_changes(&mut self, batch: &[NodeChange]) -> Vec<NodeId> {
        if batch.is_empty() {
            return Vec::new();
        }

        let mut removed: Vec<NodeId> = Vec::new();
        let mut seen = HashSet::new();
        for change in batch.iter().filter(|change| change.is_remove()) {
            let node_id = change.node_id();
            if !self.contains_node(node_id) {
                continue;
            }
            let subtree = std::iter::once(node_id.to_string())
                .chain(self.snapshot.children.descendants_of(node_id));
            for id in subtree {
                if seen.insert(id.clone()) {
                    removed.push(id);
                }
            }
        }

        let mut effective = batch.to_vec();
        effective.extend(
            removed
                .iter()
                .filter(|id| {
                    !batch
                        .iter()
                        .any(|change| change.is_remove() && change.node_id() == id.as_str())
                })
                .map(|id| NodeChange::Remove { id: id.clone() }),
        );
        let nodes = changes::apply_node_changes(&effective, &self.snapshot.nodes);

        let structural = batch.iter().any(NodeChange::is_structural);
        let edges = if structural {
            let present: HashSet<&str> = nodes.iter().map(|node| node.id.as_str()).collect();
            let dangling = |edge: &&Arc<MindMapEdge>| {
                !present.contains(edge.source.as_str()) || !present.contains(edge.target.as_str())
            };
            if self.snapshot.edges.iter().any(|edge| dangling(&edge)) {
                Some(
                    self.snapshot
                        .edges
                        .iter()
                        .filter(|edge| !dangling(edge))
                        .cloned()
                        .collect(),
                )
            } else {
                None
            }
        } else {
            None
        };

        let index = if structural {
            IndexUpdate::Rebuild
        } else {
            IndexUpdate::Keep
        };
        self.commit(Some(nodes), edges, index);
        removed
    }

    /// Merges an edge delta batch.
    pub fn apply_edge_changes(&mut self, batch: &[EdgeChange]) {
        if batch.is_empty() {
            return;
        }
        let edges = changes::apply_edge_changes(batch, &self.snapshot.edges);
        self.commit(None, Some(edges), IndexUpdate::Keep);
    }

    /// Replaces the label of `node_id`. Returns `false` when the node is gone.
    pub fn update_node_label(&mut self, node_id: &str, label: &str) -> bool {
        let Some(slot) = self.node_slots.get(node_id).copied() else {
            return false;
        };

        let mut nodes = self.snapshot.nodes.as_ref().clone();
        let mut updated = MindMapNode::clone(&nodes[slot]);
        updated.data.label = label.to_string();
        nodes[slot] = Arc::new(updated);
        self.commit(Some(nodes), None, IndexUpdate::Keep);
        true
    }

    /// Adds `edge` and, when given, the freshly created `node` in one
    /// transition.
    pub fn insert_link(&mut self, node: Option<MindMapNode>, edge: MindMapEdge) {
        let mut edges = self.snapshot.edges.as_ref().clone();
        edges.push(Arc::new(edge));

        let Some(node) = node else {
            self.commit(None, Some(edges), IndexUpdate::Keep);
            return;
        };

        let index = match node.parent_id.clone() {
            Some(parent_id) => IndexUpdate::Append {
                parent_id,
                child_id: node.id.clone(),
            },
            None => IndexUpdate::Keep,
        };
        let mut nodes = self.snapshot.nodes.as_ref().clone();
        nodes.push(Arc::new(node));
        self.commit(Some(nodes), Some(edges), index);
    }

    /// Toggles collapse of `node_id`. Returns `false` for unknown nodes.
    pub fn toggle_collapse(&mut self, node_id: &str) -> bool {
        let Some(plan) = collapse::plan_toggle(
            |id| self.node(id).map(Arc::as_ref),
            &self.snapshot.children,
            node_id,
        ) else {
            return false;
        };

        let nodes = collapse::apply_toggle(&plan, &self.snapshot.nodes);
        self.commit(Some(nodes), None, IndexUpdate::Keep);
        true
    }

    fn install(&mut self, nodes: Vec<MindMapNode>, edges: Vec<MindMapEdge>) {
        let nodes = nodes.into_iter().map(Arc::new).collect();
        let edges = edges.into_iter().map(Arc::new).collect();
        self.store_collections(Some(nodes), Some(edges), IndexUpdate::Rebuild);
    }

    fn commit(
        &mut self,
        nodes: Option<Vec<Arc<MindMapNode>>>,
        edges: Option<Vec<Arc<MindMapEdge>>>,
        index: IndexUpdate,
    ) {
        self.store_collections(nodes, edges, index);
        self.publish();
    }

    fn store_collections(
        &mut self,
        nodes: Option<Vec<Arc<MindMapNode>>>,
        edges: Option<Vec<Arc<MindMapEdge>>>,
        index: IndexUpdate,
    ) {
        if let Some(nodes) = nodes {
            self.node_slots = nodes
                .iter()
                .enumerate()
                .map(|(slot, node)| (node.id.clone(), slot))
                .collect();
            self.snapshot.nodes = Arc::new(nodes);
        }
        if let Some(edges) = edges {
            self.edge_ids = edges.iter().map(|edge| edge.id.clone()).collect();
            self.snapshot.edges = Arc::new(edges);
        }

        match index {
            IndexUpdate::Keep => {}
            IndexUpdate::Append {
                parent_id,
                child_id,
            } => Arc::make_mut(&mut self.snapshot.children).insert(&parent_id, &child_id),
            IndexUpdate::Rebuild => {
                self.snapshot.children = Arc::new(ChildIndex::build(&self.snapshot.nodes));
            }
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot.clone();
        for (_, listener) in self.listeners.iter_mut() {
            listener(&snapshot);
        }
    }
}
