//! Mind-map node record.
//!
//! # Responsibility
//! - Define the canonical node shape shared by the store, the document
//!   bridge and the rendering collaborator.
//! - Keep wire naming (`parentNode`, `isCollapsed`, `type`) at the serde layer
//!   so Rust code can use descriptive field names.
//!
//! # Invariants
//! - `id` is stable and never reassigned after creation.
//! - `collapsed` only changes visibility of descendants, never existence.

use serde::{Deserialize, Serialize};

/// Stable identifier for nodes and edges.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
/// Ids are plain strings because imported documents may carry any id shape
/// (the initial root uses `"root"`).
pub type NodeId = String;

/// Node `type` value the canvas uses to pick the mind-map node renderer.
pub const MINDMAP_NODE_TYPE: &str = "mindmap";

/// Drag handle selector attached to engine-created nodes.
pub const DEFAULT_DRAG_HANDLE: &str = ".dragHandle";

/// Point in canvas (or screen) space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// User-facing payload of one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    /// Editable text shown in the node input.
    pub label: String,
    /// Whether this node's subtree is folded. Absent on the wire means `false`.
    #[serde(rename = "isCollapsed", default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
}

/// One mind-map entry.
///
/// Measurement fields (`width`, `height`, `position_absolute`) are written by
/// the canvas layer through change batches; the core only reads them when
/// resolving child positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapNode {
    pub id: NodeId,
    /// Serialized as `type` to match the canvas schema.
    #[serde(rename = "type", default = "default_node_type")]
    pub kind: String,
    pub data: NodeData,
    pub position: Position,
    /// Owning node. `None` marks the root.
    #[serde(rename = "parentNode", default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default = "default_animated")]
    pub animated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drag_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_absolute: Option<Position>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub dragging: bool,
}

impl MindMapNode {
    /// Creates a visible, expanded root node (no parent).
    pub fn root(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self::with_parent(id, label, Position::default(), None)
    }

    /// Creates a visible, expanded child node under `parent_id`.
    pub fn child(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        position: Position,
        parent_id: impl Into<NodeId>,
    ) -> Self {
        Self::with_parent(id, label, position, Some(parent_id.into()))
    }

    fn with_parent(
        id: impl Into<NodeId>,
        label: impl Into<String>,
        position: Position,
        parent_id: Option<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: default_node_type(),
            data: NodeData {
                label: label.into(),
                collapsed: false,
            },
            position,
            parent_id,
            hidden: false,
            animated: true,
            drag_handle: Some(DEFAULT_DRAG_HANDLE.to_string()),
            width: None,
            height: None,
            position_absolute: None,
            selected: false,
            dragging: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    pub fn is_collapsed(&self) -> bool {
        self.data.collapsed
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns measured size when the canvas has reported both dimensions.
    pub fn size(&self) -> Option<(f64, f64)> {
        match (self.width, self.height) {
            (Some(width), Some(height)) => Some((width, height)),
            _ => None,
        }
    }
}

fn default_node_type() -> String {
    MINDMAP_NODE_TYPE.to_string()
}

fn default_animated() -> bool {
    true
}

fn is_false(value: &bool) -> bool {
    !*value
}
