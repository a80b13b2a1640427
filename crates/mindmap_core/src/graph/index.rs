//! Parent -> children adjacency index.
//!
//! The model stores hierarchy only as `parent_id` on each node. This index
//! derives the child lists once so subtree walks do not rescan the node
//! collection per level.
//!
//! # Invariants
//! - Child order follows node collection order.
//! - The index is appended on child insert and rebuilt on any other
//!   structural change (remove, reset, import).

use crate::model::node::{MindMapNode, NodeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ChildIndex {
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl ChildIndex {
    /// Builds the index from a full node collection.
    pub fn build(nodes: &[Arc<MindMapNode>]) -> Self {
        let mut index = Self::default();
        for node in nodes {
            if let Some(parent_id) = node.parent_id.as_deref() {
                index.insert(parent_id, node.id.as_str());
            }
        }
        index
    }

    /// Records `child_id` as the last child of `parent_id`.
    pub fn insert(&mut self, parent_id: &str, child_id: &str) {
        self.children
            .entry(parent_id.to_string())
            .or_default()
            .push(child_id.to_string());
    }

    /// Direct children of `parent_id`, empty for leaves and unknown ids.
    pub fn children_of(&self, parent_id: &str) -> &[NodeId] {
        self.children
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All descendants of `node_id` in pre-order, excluding `node_id` itself.
    ///
    /// Guarded by a visited set: imported documents can carry `parent_id`
    /// cycles, which must not loop forever.
    pub fn descendants_of(&self, node_id: &str) -> Vec<NodeId> {
        let mut visited = HashSet::from([node_id.to_string()]);
        let mut ordered = Vec::new();
        let mut stack: Vec<&NodeId> = self.children_of(node_id).iter().rev().collect();
        while let Some(child_id) = stack.pop() {
            if !visited.insert(child_id.clone()) {
                continue;
            }
            ordered.push(child_id.clone());
            stack.extend(self.children_of(child_id).iter().rev());
        }
        ordered
    }
}
