//! Subtree collapse/expand.
//!
//! # Responsibility
//! - Compute the hidden flags a toggle assigns to a node's descendants.
//! - Apply a computed plan to a node collection as one new container.
//!
//! # Invariants
//! - Collapse only changes `hidden`/`collapsed`, never node existence.
//! - Collapsing hides every descendant.
//! - Expanding reveals descendants but keeps the subtree of any descendant
//!   that is itself collapsed hidden, so two toggles restore the prior state.
//! - Nodes the plan does not change keep their `Arc` identity.

use crate::graph::index::ChildIndex;
use crate::model::node::{MindMapNode, NodeId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Outcome of one toggle, computed before any mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TogglePlan {
    /// Toggled node.
    pub node_id: NodeId,
    /// Collapsed flag the toggled node ends up with.
    pub collapsed: bool,
    /// Hidden flag assigned to every visited descendant.
    pub hidden: HashMap<NodeId, bool>,
}

/// Plans a toggle of `node_id`. Returns `None` when the node is unknown.
pub fn plan_toggle<'a>(
    lookup: impl Fn(&str) -> Option<&'a MindMapNode>,
    children: &ChildIndex,
    node_id: &str,
) -> Option<TogglePlan> {
    let target = lookup(node_id)?;
    let hide = !target.is_collapsed();

    let mut hidden = HashMap::new();
    let mut visited = HashSet::from([node_id.to_string()]);
    let mut stack = vec![node_id];
    while let Some(parent_id) = stack.pop() {
        for child_id in children.children_of(parent_id) {
            if !visited.insert(child_id.clone()) {
                continue;
            }
            hidden.insert(child_id.clone(), hide);

            // A collapsed descendant stays folded when an ancestor expands.
            let keep_folded =
                !hide && lookup(child_id.as_str()).is_some_and(MindMapNode::is_collapsed);
            if !keep_folded {
                stack.push(child_id.as_str());
            }
        }
    }

    Some(TogglePlan {
        node_id: node_id.to_string(),
        collapsed: !target.is_collapsed(),
        hidden,
    })
}

/// Applies `plan` to `nodes`, returning the new collection.
pub fn apply_toggle(plan: &TogglePlan, nodes: &[Arc<MindMapNode>]) -> Vec<Arc<MindMapNode>> {
    nodes
        .iter()
        .map(|node| {
            let is_target = node.id == plan.node_id;
            let hidden = plan.hidden.get(node.id.as_str()).copied();
            let hidden_changes = hidden.is_some_and(|value| value != node.hidden);
            let collapsed_changes = is_target && node.is_collapsed() != plan.collapsed;
            if !hidden_changes && !collapsed_changes {
                return Arc::clone(node);
            }

            let mut updated = MindMapNode::clone(node);
            if let Some(hidden) = hidden {
                updated.hidden = hidden;
            }
            if is_target {
                updated.data.collapsed = plan.collapsed;
            }
            Arc::new(updated)
        })
        .collect()
}
