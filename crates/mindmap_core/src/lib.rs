//! Core graph state engine for the mind-map editor.
//! This crate is the single source of truth for node/edge invariants.

pub mod capability;
pub mod config;
pub mod document;
pub mod geometry;
pub mod graph;
pub mod id;
pub mod logging;
pub mod model;
pub mod service;

pub use capability::{
    CanvasProjection, ConfirmationPrompt, Decision, DocumentSink, FileReader, FsDocumentSink,
    FsFileReader, LogNotifier, Notice, Notifier,
};
pub use config::{ConfigError, MindMapConfig};
pub use document::{DocumentError, GraphDocument};
pub use geometry::{resolve_child_position, CanvasOrigin, ViewportTransform};
pub use graph::changes::{Dimensions, EdgeChange, NodeChange};
pub use graph::store::{GraphSnapshot, GraphStore, Listener, SubscriptionId};
pub use graph::GraphError;
pub use id::{IdGenerator, UuidGenerator};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::edge::MindMapEdge;
pub use model::node::{MindMapNode, NodeData, NodeId, Position, MINDMAP_NODE_TYPE};
pub use service::mindmap_service::{
    ChildLink, DropTarget, MindMapError, MindMapService, PendingConfirmation,
    DELETE_CONFIRMATION_MESSAGE,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
