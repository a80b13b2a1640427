//! Mind-map edge record.
//!
//! Edges are directed `source -> target` connections. They usually mirror a
//! parent/child link, but a re-link connects two pre-existing nodes without
//! touching the target's `parent_id`, so edges and hierarchy may diverge.

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};

/// One directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapEdge {
    pub id: NodeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

impl MindMapEdge {
    pub fn new(id: impl Into<NodeId>, source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            selected: false,
        }
    }

    /// Returns whether `node_id` is either endpoint.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}
