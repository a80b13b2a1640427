//! Batched node/edge deltas produced by the canvas interaction layer.
//!
//! # Responsibility
//! - Define the change shapes the canvas emits (drag, measure, select,
//!   remove, add, reset).
//! - Merge a batch into a collection, producing a new container.
//!
//! # Invariants
//! - Merging never mutates the input collection.
//! - Records without a change keep their `Arc` identity.
//! - A batch containing any `reset` yields exactly the reset items.

use crate::model::edge::MindMapEdge;
use crate::model::node::{MindMapNode, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Measured node size reported by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

/// One node delta. Serialized with a `type` tag matching canvas naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeChange {
    Dimensions {
        id: String,
        dimensions: Option<Dimensions>,
    },
    Position {
        id: String,
        position: Option<Position>,
        #[serde(rename = "positionAbsolute")]
        position_absolute: Option<Position>,
        dragging: Option<bool>,
    },
    Select {
        id: String,
        selected: bool,
    },
    Remove {
        id: String,
    },
    Add {
        item: MindMapNode,
    },
    Reset {
        item: MindMapNode,
    },
}

impl NodeChange {
    /// Id of the node this change targets.
    pub fn node_id(&self) -> &str {
        match self {
            Self::Dimensions { id, .. }
            | Self::Position { id, .. }
            | Self::Select { id, .. }
            | Self::Remove { id } => id.as_str(),
            Self::Add { item } | Self::Reset { item } => item.id.as_str(),
        }
    }

    pub fn is_remove(&self) -> bool {
        matches!(self, Self::Remove { .. })
    }

    /// Whether applying this change alters the parent/child structure.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Remove { .. } | Self::Add { .. } | Self::Reset { .. })
    }
}

/// One edge delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EdgeChange {
    Select { id: String, selected: bool },
    Remove { id: String },
    Add { item: MindMapEdge },
    Reset { item: MindMapEdge },
}

impl EdgeChange {
    pub fn edge_id(&self) -> &str {
        match self {
            Self::Select { id, .. } | Self::Remove { id } => id.as_str(),
            Self::Add { item } | Self::Reset { item } => item.id.as_str(),
        }
    }
}

/// Merges node deltas into `nodes`, returning a new collection.
pub fn apply_node_changes(
    changes: &[NodeChange],
    nodes: &[Arc<MindMapNode>],
) -> Vec<Arc<MindMapNode>> {
    let resets: Vec<Arc<MindMapNode>> = changes
        .iter()
        .filter_map(|change| match change {
            NodeChange::Reset { item } => Some(Arc::new(item.clone())),
            _ => None,
        })
        .collect();
    if !resets.is_empty() {
        return resets;
    }

    let mut by_id: HashMap<&str, Vec<&NodeChange>> = HashMap::new();
    for change in changes {
        if !matches!(change, NodeChange::Add { .. }) {
            by_id.entry(change.node_id()).or_default().push(change);
        }
    }

    let mut merged = Vec::with_capacity(nodes.len());
    for node in nodes {
        let Some(pending) = by_id.get(node.id.as_str()) else {
            merged.push(Arc::clone(node));
            continue;
        };
        if pending.iter().any(|change| change.is_remove()) {
            continue;
        }

        let mut updated = MindMapNode::clone(node);
        for change in pending {
            apply_node_change(&mut updated, change);
        }
        merged.push(Arc::new(updated));
    }

    merged.extend(changes.iter().filter_map(|change| match change {
        NodeChange::Add { item } => Some(Arc::new(item.clone())),
        _ => None,
    }));
    merged
}

fn apply_node_change(node: &mut MindMapNode, change: &NodeChange) {
    match change {
        NodeChange::Dimensions { dimensions, .. } => {
            if let Some(dimensions) = dimensions {
                node.width = Some(dimensions.width);
                node.height = Some(dimensions.height);
            }
        }
        NodeChange::Position {
            position,
            position_absolute,
            dragging,
            ..
        } => {
            if let Some(position) = position {
                node.position = *position;
            }
            if let Some(position_absolute) = position_absolute {
                node.position_absolute = Some(*position_absolute);
            }
            if let Some(dragging) = dragging {
                node.dragging = *dragging;
            }
        }
        NodeChange::Select { selected, .. } => node.selected = *selected,
        NodeChange::Remove { .. } | NodeChange::Add { .. } | NodeChange::Reset { .. } => {}
    }
}

/// Merges edge deltas into `edges`, returning a new collection.
pub fn apply_edge_changes(
    changes: &[EdgeChange],
    edges: &[Arc<MindMapEdge>],
) -> Vec<Arc<MindMapEdge>> {
    let resets: Vec<Arc<MindMapEdge>> = changes
        .iter()
        .filter_map(|change| match change {
            EdgeChange::Reset { item } => Some(Arc::new(item.clone())),
            _ => None,
        })
        .collect();
    if !resets.is_empty() {
        return resets;
    }

    let mut by_id: HashMap<&str, Vec<&EdgeChange>> = HashMap::new();
    for change in changes {
        if !matches!(change, EdgeChange::Add { .. }) {
            by_id.entry(change.edge_id()).or_default().push(change);
        }
    }

    let mut merged = Vec::with_capacity(edges.len());
    for edge in edges {
        let Some(pending) = by_id.get(edge.id.as_str()) else {
            merged.push(Arc::clone(edge));
            continue;
        };
        if pending
            .iter()
            .any(|change| matches!(change, EdgeChange::Remove { .. }))
        {
            continue;
        }

        let mut updated = MindMapEdge::clone(edge);
        for change in pending {
            if let EdgeChange::Select { selected, .. } = change {
                updated.selected = *selected;
            }
        }
        merged.push(Arc::new(updated));
    }

    merged.extend(changes.iter().filter_map(|change| match change {
        EdgeChange::Add { item } => Some(Arc::new(item.clone())),
        _ => None,
    }));
    merged
}
