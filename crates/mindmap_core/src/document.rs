//! Export/import document bridge.
//!
//! # Responsibility
//! - Convert the model to a pretty-printed JSON document and back.
//! - Reject malformed input before anything touches the store.
//!
//! # Invariants
//! - Export always emits both `nodes` and `edges`.
//! - Import requires both top-level keys; deeper shape errors and broken
//!   references are reported, never partially applied.

use crate::graph::store::GraphSnapshot;
use crate::model::edge::MindMapEdge;
use crate::model::node::{MindMapNode, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NODES_KEY: &str = "nodes";
const EDGES_KEY: &str = "edges";

/// Serialization unit: the entire working set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<MindMapNode>,
    pub edges: Vec<MindMapEdge>,
}

/// Errors from document export/import.
#[derive(Debug)]
pub enum DocumentError {
    /// Input is not valid JSON.
    Parse(serde_json::Error),
    /// A required top-level key is absent or `null`.
    MissingField(&'static str),
    /// Keys are present but records do not match the node/edge shape.
    InvalidShape(serde_json::Error),
    /// Two nodes share one id.
    DuplicateNodeId(NodeId),
    /// Two edges share one id.
    DuplicateEdgeId(NodeId),
    /// A node's `parentNode` references a missing node.
    DanglingParent { node_id: NodeId, parent_id: NodeId },
    /// An edge endpoint references a missing node.
    DanglingEdge { edge_id: NodeId, node_id: NodeId },
    /// More than one node has no parent.
    MultipleRoots { first: NodeId, second: NodeId },
    /// Nodes exist but none of them is a root.
    MissingRoot,
    /// Following `parentNode` from this node never reaches the root.
    ParentCycle { node_id: NodeId },
    /// Export encoding failed.
    Encode(serde_json::Error),
    /// Reading or saving the document failed.
    Io(std::io::Error),
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "document is not valid JSON: {err}"),
            Self::MissingField(field) => write!(f, "document is missing `{field}`"),
            Self::InvalidShape(err) => write!(f, "document has an invalid shape: {err}"),
            Self::DuplicateNodeId(id) => write!(f, "duplicate node id: {id}"),
            Self::DuplicateEdgeId(id) => write!(f, "duplicate edge id: {id}"),
            Self::DanglingParent { node_id, parent_id } => write!(
                f,
                "node {node_id} references missing parent {parent_id}"
            ),
            Self::DanglingEdge { edge_id, node_id } => {
                write!(f, "edge {edge_id} references missing node {node_id}")
            }
            Self::MultipleRoots { first, second } => {
                write!(f, "document has more than one root: {first}, {second}")
            }
            Self::MissingRoot => write!(f, "document has nodes but no root"),
            Self::ParentCycle { node_id } => {
                write!(f, "node {node_id} is part of a parent cycle")
            }
            Self::Encode(err) => write!(f, "failed to encode document: {err}"),
            Self::Io(err) => write!(f, "document I/O failed: {err}"),
        }
    }
}

impl Error for DocumentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) | Self::InvalidShape(err) | Self::Encode(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::MissingField(_)
            | Self::DuplicateNodeId(_)
            | Self::DuplicateEdgeId(_)
            | Self::DanglingParent { .. }
            | Self::DanglingEdge { .. }
            | Self::MultipleRoots { .. }
            | Self::MissingRoot
            | Self::ParentCycle { .. } => None,
        }
    }
}

impl From<std::io::Error> for DocumentError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl GraphDocument {
    /// Copies the records of `snapshot` into an owned document.
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Self {
        Self {
            nodes: snapshot
                .nodes()
                .iter()
                .map(|node| MindMapNode::clone(node))
                .collect(),
            edges: snapshot
                .edges()
                .iter()
                .map(|edge| MindMapEdge::clone(edge))
                .collect(),
        }
    }

    /// Encodes the document as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(self).map_err(DocumentError::Encode)
    }

    /// Parses raw import text.
    ///
    /// Only the presence of `nodes` and `edges` is checked before typed
    /// decoding; reference checks are separate (`validate_references`).
    pub fn parse(raw: &str) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(raw).map_err(DocumentError::Parse)?;
        for key in [NODES_KEY, EDGES_KEY] {
            if value.get(key).map_or(true, Value::is_null) {
                return Err(DocumentError::MissingField(key));
            }
        }
        serde_json::from_value(value).map_err(DocumentError::InvalidShape)
    }

    /// Checks id uniqueness, exactly one root for a non-empty document,
    /// acyclic parent links, and that every parent and edge endpoint exists.
    pub fn validate_references(&self) -> Result<(), DocumentError> {
        let mut node_ids = HashSet::new();
        let mut root: Option<&str> = None;
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(DocumentError::DuplicateNodeId(node.id.clone()));
            }
            if node.parent_id.is_none() {
                if let Some(first) = root {
                    return Err(DocumentError::MultipleRoots {
                        first: first.to_string(),
                        second: node.id.clone(),
                    });
                }
                root = Some(node.id.as_str());
            }
        }

        for node in &self.nodes {
            if let Some(parent_id) = node.parent_id.as_deref() {
                if !node_ids.contains(parent_id) {
                    return Err(DocumentError::DanglingParent {
                        node_id: node.id.clone(),
                        parent_id: parent_id.to_string(),
                    });
                }
            }
        }

        if root.is_none() && !self.nodes.is_empty() {
            return Err(DocumentError::MissingRoot);
        }
        self.check_parent_chains()?;

        let mut edge_ids = HashSet::new();
        for edge in &self.edges {
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(DocumentError::DuplicateEdgeId(edge.id.clone()));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(DocumentError::DanglingEdge {
                        edge_id: edge.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Walks every parent chain iteratively; chains already known to reach
    /// the root are not walked again.
    fn check_parent_chains(&self) -> Result<(), DocumentError> {
        let parents: HashMap<&str, Option<&str>> = self
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node.parent_id.as_deref()))
            .collect();
        let mut settled: HashSet<&str> = HashSet::new();

        for node in &self.nodes {
            let mut path = Vec::new();
            let mut on_path = HashSet::new();
            let mut current = Some(node.id.as_str());
            while let Some(id) = current {
                if settled.contains(id) {
                    break;
                }
                if !on_path.insert(id) {
                    return Err(DocumentError::ParentCycle {
                        node_id: id.to_string(),
                    });
                }
                path.push(id);
                current = parents.get(id).copied().flatten();
            }
            settled.extend(path);
        }
        Ok(())
    }
}
