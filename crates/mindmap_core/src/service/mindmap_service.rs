//! Mind-map mutation use-case service.
//!
//! # Responsibility
//! - Expose every gesture-level mutation (canvas deltas, label edit,
//!   drag-to-create, collapse, import, reset) over one `GraphStore`.
//! - Run the two-phase confirmation for destructive root deletion.
//! - Surface recoverable failures as notices and structured log events.
//!
//! # Invariants
//! - Each public mutation is one store transition or none at all.
//! - A failed import, a declined deletion and a stale confirmation leave
//!   the model exactly as it was.
//! - Re-linking to an existing node adds an edge only; the target keeps its
//!   `parent_id`. Edges and hierarchy are separate relations.
//! - Canvas batches cannot bypass the model shape: node ids stay unique,
//!   there is at most one root, and every parent exists.

use crate::capability::{
    CanvasProjection, ConfirmationPrompt, Decision, DocumentSink, FileReader, LogNotifier, Notice,
    Notifier,
};
use crate::config::MindMapConfig;
use crate::document::{DocumentError, GraphDocument};
use crate::geometry::{resolve_child_position, CanvasOrigin};
use crate::graph::changes::{EdgeChange, NodeChange};
use crate::graph::store::{GraphSnapshot, GraphStore, Listener, SubscriptionId};
use crate::graph::GraphError;
use crate::id::{fresh_id, IdGenerator, UuidGenerator};
use crate::model::edge::MindMapEdge;
use crate::model::node::{MindMapNode, NodeId, Position};
use log::{debug, info, warn};
use std::error::Error;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Prompt text shown before a destructive deletion.
pub const DELETE_CONFIRMATION_MESSAGE: &str = "Are you sure? You won't be able to revert this!";

/// Errors from mind-map service operations.
#[derive(Debug)]
pub enum MindMapError {
    /// Graph precondition failure.
    Graph(GraphError),
    /// Import/export failure.
    Document(DocumentError),
    /// No deletion is awaiting confirmation.
    NoPendingConfirmation,
    /// The given confirmation was superseded or already resolved.
    StaleConfirmation { token: u64 },
}

impl Display for MindMapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "{err}"),
            Self::Document(err) => write!(f, "{err}"),
            Self::NoPendingConfirmation => write!(f, "no deletion is awaiting confirmation"),
            Self::StaleConfirmation { token } => {
                write!(f, "confirmation {token} is no longer pending")
            }
        }
    }
}

impl Error for MindMapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Document(err) => Some(err),
            Self::NoPendingConfirmation | Self::StaleConfirmation { .. } => None,
        }
    }
}

impl From<GraphError> for MindMapError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<DocumentError> for MindMapError {
    fn from(value: DocumentError) -> Self {
        Self::Document(value)
    }
}

/// A withheld deletion awaiting the user's decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingConfirmation {
    /// Identifies this request; resolving an older token is rejected.
    pub token: u64,
    /// Node whose removal is withheld.
    pub node_id: NodeId,
    /// Prompt text for the confirmation dialog.
    pub message: String,
}

/// Result of `add_custom_child_node`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildLink {
    /// Id of the new edge.
    pub edge_id: NodeId,
    /// Edge target: the new node, or the re-linked existing node.
    pub target_id: NodeId,
    /// Whether a node was created (`false` for re-links).
    pub created: bool,
}

/// Where a drag-to-create gesture was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Empty canvas area: create a new child there.
    Pane,
    /// An existing node: re-link to it.
    Node(NodeId),
    /// Anything else (controls, minimap, outside the canvas).
    Elsewhere,
}

/// Mind-map use-case facade. Owned by the host's composition root.
pub struct MindMapService {
    store: GraphStore,
    config: MindMapConfig,
    ids: Box<dyn IdGenerator>,
    notifier: Box<dyn Notifier>,
    pending_delete: Option<PendingConfirmation>,
    next_token: u64,
    connecting_from: Option<NodeId>,
}

impl MindMapService {
    /// Creates a session holding the initial map: one root, no edges.
    pub fn new(config: MindMapConfig) -> Self {
        let store = GraphStore::new(vec![initial_root(&config)], Vec::new());
        Self {
            store,
            config,
            ids: Box::new(UuidGenerator),
            notifier: Box::new(LogNotifier),
            pending_delete: None,
            next_token: 1,
            connecting_from: None,
        }
    }

    /// Replaces the identifier source.
    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Replaces the notice sink.
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn config(&self) -> &MindMapConfig {
        &self.config
    }

    /// Current read-only view of the model.
    pub fn snapshot(&self) -> GraphSnapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&mut self, listener: Listener) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Currently withheld deletion, if any.
    pub fn pending_confirmation(&self) -> Option<&PendingConfirmation> {
        self.pending_delete.as_ref()
    }

    /// Applies a canvas node delta batch.
    ///
    /// A removal of the root is withheld and returned as a pending
    /// confirmation; the rest of the batch applies immediately. `reset`
    /// items are dropped (whole-model replacement goes through
    /// `import_document`), as are `add` items that would duplicate an id,
    /// hang off a missing parent or introduce a second root.
    pub fn on_nodes_change(&mut self, changes: Vec<NodeChange>) -> Option<PendingConfirmation> {
        let root_id = self.store.root_id().map(str::to_string);
        let (root_removals, rest): (Vec<NodeChange>, Vec<NodeChange>) =
            changes.into_iter().partition(|change| {
                change.is_remove() && root_id.as_deref() == Some(change.node_id())
            });
        let rest = self.admit_node_changes(rest);

        if !rest.is_empty() {
            let removed = self.store.apply_node_changes(&rest);
            if !removed.is_empty() {
                info!(
                    "event=nodes_removed module=service status=ok count={}",
                    removed.len()
                );
            }
            self.notify_if_empty();
        }

        let root_id = root_id?;
        if root_removals.is_empty() {
            return None;
        }
        Some(self.withhold_delete(root_id))
    }

    /// Applies a canvas edge delta batch. Added edges with a missing
    /// endpoint are dropped.
    pub fn on_edges_change(&mut self, changes: Vec<EdgeChange>) {
        let accepted: Vec<EdgeChange> = changes
            .into_iter()
            .filter(|change| match change {
                EdgeChange::Add { item } | EdgeChange::Reset { item } => {
                    let valid = self.store.contains_node(&item.source)
                        && self.store.contains_node(&item.target);
                    if !valid {
                        warn!(
                            "event=edge_change_dropped module=service status=skipped edge_id={}",
                            item.id
                        );
                    }
                    valid
                }
                EdgeChange::Select { .. } | EdgeChange::Remove { .. } => true,
            })
            .collect();
        self.store.apply_edge_changes(&accepted);
    }

    /// Withholds deletion of `node_id` until `resolve_confirmation`.
    ///
    /// A new request supersedes any earlier pending one.
    pub fn request_delete(&mut self, node_id: &str) -> Result<PendingConfirmation, MindMapError> {
        if !self.store.contains_node(node_id) {
            return Err(GraphError::NodeNotFound(node_id.to_string()).into());
        }
        Ok(self.withhold_delete(node_id.to_string()))
    }

    /// Applies or discards a withheld deletion.
    ///
    /// Returns whether the removal was applied.
    pub fn resolve_confirmation(
        &mut self,
        pending: &PendingConfirmation,
        decision: Decision,
    ) -> Result<bool, MindMapError> {
        match &self.pending_delete {
            None => return Err(MindMapError::NoPendingConfirmation),
            Some(current) if current.token != pending.token => {
                return Err(MindMapError::StaleConfirmation {
                    token: pending.token,
                });
            }
            Some(_) => {}
        }
        self.pending_delete = None;

        let node_id = pending.node_id.clone();
        match decision {
            Decision::Declined => {
                info!(
                    "event=delete_declined module=service status=ok node_id={}",
                    node_id
                );
                self.notifier.notify(&Notice::DeleteCancelled { node_id });
                Ok(false)
            }
            Decision::Accepted => {
                if !self.store.contains_node(&node_id) {
                    debug!(
                        "event=delete_accepted module=service status=skipped node_id={}",
                        node_id
                    );
                    return Ok(false);
                }
                let removed = self.store.apply_node_changes(&[NodeChange::Remove {
                    id: node_id.clone(),
                }]);
                info!(
                    "event=delete_accepted module=service status=ok node_id={} removed={}",
                    node_id,
                    removed.len()
                );
                self.notifier.notify(&Notice::NodeDeleted { node_id });
                self.notify_if_empty();
                Ok(true)
            }
        }
    }

    /// Resolves `pending` by asking `prompt`.
    pub fn confirm_with(
        &mut self,
        pending: &PendingConfirmation,
        prompt: &impl ConfirmationPrompt,
    ) -> Result<bool, MindMapError> {
        let decision = prompt.confirm(&pending.message);
        self.resolve_confirmation(pending, decision)
    }

    /// Replaces the label of `node_id`.
    ///
    /// Unknown ids are a silent no-op: deletion can race with an edit.
    pub fn update_node_label(&mut self, node_id: &str, label: &str) -> bool {
        let updated = self.store.update_node_label(node_id, label);
        if !updated {
            debug!(
                "event=label_update module=service status=skipped node_id={}",
                node_id
            );
        }
        updated
    }

    /// Connects `parent_id` to a new child at `position`, or to
    /// `existing_target_id` when given (re-link, `position` ignored).
    pub fn add_custom_child_node(
        &mut self,
        parent_id: &str,
        position: Position,
        existing_target_id: Option<&str>,
    ) -> Result<ChildLink, MindMapError> {
        if !self.store.contains_node(parent_id) {
            return Err(GraphError::ParentNotFound(parent_id.to_string()).into());
        }
        if let Some(target_id) = existing_target_id {
            if !self.store.contains_node(target_id) {
                return Err(GraphError::TargetNotFound(target_id.to_string()).into());
            }
            if target_id == parent_id {
                warn!(
                    "event=self_link module=service status=ok node_id={}",
                    parent_id
                );
            }
        }

        let store = &self.store;
        let (node, target_id) = match existing_target_id {
            Some(target_id) => (None, target_id.to_string()),
            None => {
                let node_id = fresh_id(self.ids.as_mut(), |candidate| {
                    store.contains_node(candidate)
                });
                let node = MindMapNode::child(
                    node_id.clone(),
                    self.config.default_child_label.clone(),
                    position,
                    parent_id,
                );
                (Some(node), node_id)
            }
        };
        let edge_id = fresh_id(self.ids.as_mut(), |candidate| store.contains_edge(candidate));

        let link = ChildLink {
            edge_id: edge_id.clone(),
            target_id: target_id.clone(),
            created: node.is_some(),
        };

        self.store.insert_link(
            node,
            MindMapEdge::new(edge_id, parent_id.to_string(), target_id),
        );
        info!(
            "event=child_linked module=service status=ok parent_id={} target_id={} created={}",
            parent_id, link.target_id, link.created
        );
        Ok(link)
    }

    /// Folds or unfolds the subtree under `node_id`. Unknown ids are a no-op.
    pub fn toggle_collapse(&mut self, node_id: &str) -> bool {
        let toggled = self.store.toggle_collapse(node_id);
        if toggled {
            let collapsed = self
                .store
                .node(node_id)
                .is_some_and(|node| node.is_collapsed());
            debug!(
                "event=collapse_toggled module=service status=ok node_id={} collapsed={}",
                node_id, collapsed
            );
        }
        toggled
    }

    /// Records the source node of a drag-to-create gesture.
    pub fn connect_start(&mut self, node_id: &str) {
        self.connecting_from = Some(node_id.to_string());
    }

    /// Finishes a drag-to-create gesture.
    ///
    /// Returns `Ok(None)` when the gesture produces nothing: no gesture in
    /// progress, a drop outside the canvas or back onto the source, or a
    /// source that was never measured.
    pub fn connect_end(
        &mut self,
        drop: DropTarget,
        pointer: Position,
        origin: CanvasOrigin,
        projection: &impl CanvasProjection,
    ) -> Result<Option<ChildLink>, MindMapError> {
        let Some(source_id) = self.connecting_from.take() else {
            return Ok(None);
        };

        match drop {
            DropTarget::Node(target_id) if target_id == source_id => Ok(None),
            DropTarget::Node(target_id) => {
                let position = self
                    .store
                    .node(&source_id)
                    .and_then(|source| resolve_child_position(pointer, origin, source, projection))
                    .unwrap_or_default();
                self.add_custom_child_node(&source_id, position, Some(&target_id))
                    .map(Some)
            }
            DropTarget::Pane => {
                let Some(source) = self.store.node(&source_id) else {
                    return Ok(None);
                };
                let Some(position) = resolve_child_position(pointer, origin, source, projection)
                else {
                    debug!(
                        "event=connect_end module=service status=skipped reason=unmeasured node_id={}",
                        source_id
                    );
                    return Ok(None);
                };
                self.add_custom_child_node(&source_id, position, None)
                    .map(Some)
            }
            DropTarget::Elsewhere => Ok(None),
        }
    }

    /// Replaces the whole model with the document in `raw`.
    ///
    /// On failure an `ImportRejected` notice is emitted and nothing changes.
    pub fn import_document(&mut self, raw: &str) -> Result<(), MindMapError> {
        let document = match self.decode_import(raw) {
            Ok(document) => document,
            Err(err) => {
                warn!("event=import module=service status=error reason={}", err);
                self.notifier.notify(&Notice::ImportRejected {
                    reason: err.to_string(),
                });
                return Err(err.into());
            }
        };

        let (node_count, edge_count) = (document.nodes.len(), document.edges.len());
        self.pending_delete = None;
        self.connecting_from = None;
        self.store.replace_all(document.nodes, document.edges);
        info!(
            "event=import module=service status=ok nodes={} edges={}",
            node_count, edge_count
        );
        self.notify_if_empty();
        Ok(())
    }

    /// Reads `handle` through `reader`, then imports it.
    pub fn import_from(
        &mut self,
        reader: &impl FileReader,
        handle: &Path,
    ) -> Result<(), MindMapError> {
        match reader.read_file(handle) {
            Ok(raw) => self.import_document(&raw),
            Err(err) => {
                let err = DocumentError::Io(err);
                warn!("event=import module=service status=error reason={}", err);
                self.notifier.notify(&Notice::ImportRejected {
                    reason: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Pretty-printed JSON of the current model.
    pub fn export_document(&self) -> Result<String, MindMapError> {
        let text = GraphDocument::from_snapshot(&self.store.snapshot()).to_json_pretty()?;
        info!(
            "event=export module=service status=ok nodes={} edges={}",
            self.store.node_count(),
            self.store.edge_count()
        );
        Ok(text)
    }

    /// Exports into `sink` under the configured file name.
    pub fn export_to(&self, sink: &impl DocumentSink) -> Result<(), MindMapError> {
        let text = self.export_document()?;
        sink.save(&self.config.export_file_name, &text)
            .map_err(DocumentError::Io)?;
        Ok(())
    }

    /// Restores the initial single-root map.
    pub fn reset(&mut self) {
        self.pending_delete = None;
        self.connecting_from = None;
        self.store
            .replace_all(vec![initial_root(&self.config)], Vec::new());
        info!("event=reset module=service status=ok");
    }

    fn withhold_delete(&mut self, node_id: NodeId) -> PendingConfirmation {
        let pending = PendingConfirmation {
            token: self.next_token,
            node_id,
            message: DELETE_CONFIRMATION_MESSAGE.to_string(),
        };
        self.next_token += 1;
        if let Some(superseded) = self.pending_delete.replace(pending.clone()) {
            debug!(
                "event=delete_requested module=service status=superseded token={}",
                superseded.token
            );
        }
        info!(
            "event=delete_requested module=service status=pending token={} node_id={}",
            pending.token, pending.node_id
        );
        pending
    }

    fn admit_node_changes(&self, changes: Vec<NodeChange>) -> Vec<NodeChange> {
        let mut removed: HashSet<NodeId> = HashSet::new();
        for change in changes.iter().filter(|change| change.is_remove()) {
            let node_id = change.node_id();
            if self.store.contains_node(node_id) {
                removed.insert(node_id.to_string());
                removed.extend(self.store.children().descendants_of(node_id));
            }
        }

        let mut added: HashSet<NodeId> = HashSet::new();
        let mut has_root = self.store.root_id().is_some();
        changes
            .into_iter()
            .filter(|change| {
                let reason = match change {
                    NodeChange::Reset { .. } => Some("reset"),
                    NodeChange::Add { item } => {
                        let rejection = if self.store.contains_node(&item.id)
                            || added.contains(&item.id)
                        {
                            Some("duplicate_id")
                        } else {
                            match item.parent_id.as_deref() {
                                Some(parent_id) => {
                                    let parent_present = (self.store.contains_node(parent_id)
                                        && !removed.contains(parent_id))
                                        || added.contains(parent_id);
                                    (!parent_present).then_some("missing_parent")
                                }
                                None if has_root => Some("second_root"),
                                None => None,
                            }
                        };
                        if rejection.is_none() {
                            has_root |= item.parent_id.is_none();
                            added.insert(item.id.clone());
                        }
                        rejection
                    }
                    _ => None,
                };
                if let Some(reason) = reason {
                    warn!(
                        "event=node_change_dropped module=service status=skipped reason={} node_id={}",
                        reason,
                        change.node_id()
                    );
                }
                reason.is_none()
            })
            .collect()
    }

    fn decode_import(&self, raw: &str) -> Result<GraphDocument, DocumentError> {
        let document = GraphDocument::parse(raw)?;
        if self.config.strict_import {
            document.validate_references()?;
        }
        Ok(document)
    }

    fn notify_if_empty(&self) {
        if self.store.node_count() == 0 {
            warn!("event=map_empty module=service status=ok");
            self.notifier.notify(&Notice::MapEmpty);
        }
    }
}

fn initial_root(config: &MindMapConfig) -> MindMapNode {
    MindMapNode::root(config.root_id.clone(), config.root_label.clone())
}
