//! Graph model: storage, change merging, hierarchy index and collapse.
//!
//! # Responsibility
//! - Hold the canonical node/edge collections behind one store.
//! - Provide the pure algorithms the mutation API composes.
//!
//! # Invariants
//! - All writes go through `GraphStore`, one transition per operation.
//! - Subtree walks use the child index, never a per-level scan.

use crate::model::node::NodeId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod changes;
pub mod collapse;
pub mod index;
pub mod store;

/// Errors from graph-level mutation preconditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Target node does not exist.
    NodeNotFound(NodeId),
    /// Parent node for a new link does not exist.
    ParentNotFound(NodeId),
    /// Re-link target does not exist.
    TargetNotFound(NodeId),
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent node not found: {id}"),
            Self::TargetNotFound(id) => write!(f, "link target node not found: {id}"),
        }
    }
}

impl Error for GraphError {}
