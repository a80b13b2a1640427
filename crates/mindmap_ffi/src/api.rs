//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level mind-map functions to Dart via FRB.
//! - Own the process composition root: one `MindMapService` session.
//! - Translate core results into simple envelopes and JSON strings.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every mutation goes through the session service; Dart never holds
//!   model records, only JSON copies.
//! - Return values are UTF-8 strings with stable meaning.

use log::warn;
use mindmap_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    Decision, EdgeChange, GraphDocument, MindMapConfig, MindMapService, NodeChange, Notice,
    Notifier, PendingConfirmation, Position,
};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

const CONFIG_PATH_ENV: &str = "MINDMAP_CONFIG_PATH";

static SESSION: OnceLock<Mutex<MindMapService>> = OnceLock::new();
static NOTICES: OnceLock<Arc<Mutex<Vec<Notice>>>> = OnceLock::new();

/// Queues notices until Dart drains them with `mindmap_take_notices`.
#[derive(Clone)]
struct QueuedNotifier {
    queue: Arc<Mutex<Vec<Notice>>>,
}

impl Notifier for QueuedNotifier {
    fn notify(&self, notice: &Notice) {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice.clone());
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rotated logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for mind-map mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MindMapActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
    /// Node the action produced or targeted, when there is one.
    pub node_id: Option<String>,
    /// Set when a deletion is withheld; pass it to `mindmap_resolve_delete`.
    pub pending_token: Option<u64>,
}

impl MindMapActionResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
            node_id: None,
            pending_token: None,
        }
    }

    fn with_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    fn pending(pending: &PendingConfirmation) -> Self {
        Self {
            ok: true,
            message: pending.message.clone(),
            node_id: Some(pending.node_id.clone()),
            pending_token: Some(pending.token),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
            node_id: None,
            pending_token: None,
        }
    }
}

/// Full model as compact `{nodes, edges}` JSON.
///
/// # FFI contract
/// - Sync call, in-memory.
/// - Never panics; returns an empty string if encoding fails.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_snapshot() -> String {
    let document = GraphDocument::from_snapshot(&lock_session().snapshot());
    encode_document(&document)
}

/// Renderable subset: non-hidden nodes and edges between them.
///
/// # FFI contract
/// - Sync call, in-memory.
/// - Never panics; returns an empty string if encoding fails.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_visible_snapshot() -> String {
    let snapshot = lock_session().snapshot();
    let document = GraphDocument {
        nodes: snapshot
            .visible_nodes()
            .iter()
            .map(|node| node.as_ref().clone())
            .collect(),
        edges: snapshot
            .visible_edges()
            .iter()
            .map(|edge| edge.as_ref().clone())
            .collect(),
    };
    encode_document(&document)
}

/// Applies a JSON array of canvas node changes.
///
/// A root removal in the batch is withheld: the response carries its
/// `pending_token` while the rest of the batch is applied.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_apply_node_changes(changes_json: String) -> MindMapActionResponse {
    let changes: Vec<NodeChange> = match serde_json::from_str(&changes_json) {
        Ok(changes) => changes,
        Err(err) => {
            return MindMapActionResponse::failure(format!(
                "mindmap_apply_node_changes failed: {err}"
            ))
        }
    };
    match lock_session().on_nodes_change(changes) {
        Some(pending) => MindMapActionResponse::pending(&pending),
        None => MindMapActionResponse::success("Node changes applied."),
    }
}

/// Applies a JSON array of canvas edge changes.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_apply_edge_changes(changes_json: String) -> MindMapActionResponse {
    let changes: Vec<EdgeChange> = match serde_json::from_str(&changes_json) {
        Ok(changes) => changes,
        Err(err) => {
            return MindMapActionResponse::failure(format!(
                "mindmap_apply_edge_changes failed: {err}"
            ))
        }
    };
    lock_session().on_edges_change(changes);
    MindMapActionResponse::success("Edge changes applied.")
}

/// Replaces a node label. Unknown ids succeed without changes.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_update_label(node_id: String, label: String) -> MindMapActionResponse {
    let message = if lock_session().update_node_label(&node_id, &label) {
        "Label updated."
    } else {
        "Node not found; nothing changed."
    };
    MindMapActionResponse::success(message).with_node(node_id)
}

/// Adds a child under `parent_id` at `(x, y)`, or links to
/// `existing_target_id` when given.
///
/// # FFI contract
/// - Sync call, in-memory.
/// - Ids are matched verbatim, without trimming.
/// - Returns the edge target in `node_id` on success.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_add_child(
    parent_id: String,
    x: f64,
    y: f64,
    existing_target_id: Option<String>,
) -> MindMapActionResponse {
    let result = lock_session().add_custom_child_node(
        &parent_id,
        Position::new(x, y),
        existing_target_id.as_deref(),
    );
    match result {
        Ok(link) if link.created => {
            MindMapActionResponse::success("Node created.").with_node(link.target_id)
        }
        Ok(link) => MindMapActionResponse::success("Nodes linked.").with_node(link.target_id),
        Err(err) => MindMapActionResponse::failure(format!("mindmap_add_child failed: {err}")),
    }
}

/// Folds or unfolds the subtree under `node_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_toggle_collapse(node_id: String) -> MindMapActionResponse {
    if lock_session().toggle_collapse(&node_id) {
        MindMapActionResponse::success("Collapse toggled.").with_node(node_id)
    } else {
        MindMapActionResponse::failure(format!(
            "mindmap_toggle_collapse failed: node not found: {node_id}"
        ))
    }
}

/// Withholds deletion of `node_id` until `mindmap_resolve_delete`.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_request_delete(node_id: String) -> MindMapActionResponse {
    match lock_session().request_delete(&node_id) {
        Ok(pending) => MindMapActionResponse::pending(&pending),
        Err(err) => MindMapActionResponse::failure(format!("mindmap_request_delete failed: {err}")),
    }
}

/// Resolves the withheld deletion identified by `token`.
///
/// # FFI contract
/// - A token other than the current pending one is rejected.
/// - `ok` reports the call outcome; the message tells whether the node was
///   deleted or kept.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_resolve_delete(token: u64, accepted: bool) -> MindMapActionResponse {
    let mut session = lock_session();
    let Some(current) = session.pending_confirmation().cloned() else {
        return MindMapActionResponse::failure(
            "mindmap_resolve_delete failed: no deletion is awaiting confirmation",
        );
    };
    let node_id = current.node_id.clone();
    let pending = PendingConfirmation { token, ..current };
    match session.resolve_confirmation(&pending, Decision::from_accepted(accepted)) {
        Ok(true) => MindMapActionResponse::success("Node deleted.").with_node(node_id),
        Ok(false) => MindMapActionResponse::success("Node kept.").with_node(node_id),
        Err(err) => MindMapActionResponse::failure(format!("mindmap_resolve_delete failed: {err}")),
    }
}

/// Replaces the whole model with an imported document.
///
/// On failure the model is untouched.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_import(raw: String) -> MindMapActionResponse {
    match lock_session().import_document(&raw) {
        Ok(()) => MindMapActionResponse::success("Document imported."),
        Err(err) => MindMapActionResponse::failure(format!("Import failed: {err}")),
    }
}

/// Pretty-printed export document. Empty string if encoding fails.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_export() -> String {
    match lock_session().export_document() {
        Ok(text) => text,
        Err(err) => {
            warn!("event=export module=ffi status=error reason={}", err);
            String::new()
        }
    }
}

/// Restores the initial single-root map.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_reset() -> MindMapActionResponse {
    lock_session().reset();
    MindMapActionResponse::success("Mind map reset.")
}

/// Drains queued user-facing notices, oldest first.
#[flutter_rust_bridge::frb(sync)]
pub fn mindmap_take_notices() -> Vec<String> {
    let mut queue = notice_queue()
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    queue.drain(..).map(|notice| notice.to_string()).collect()
}

fn notice_queue() -> &'static Arc<Mutex<Vec<Notice>>> {
    NOTICES.get_or_init(|| Arc::new(Mutex::new(Vec::new())))
}

fn lock_session() -> MutexGuard<'static, MindMapService> {
    SESSION
        .get_or_init(|| {
            let notifier = QueuedNotifier {
                queue: Arc::clone(notice_queue()),
            };
            Mutex::new(MindMapService::new(load_config()).with_notifier(notifier))
        })
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn load_config() -> MindMapConfig {
    let Ok(raw_path) = std::env::var(CONFIG_PATH_ENV) else {
        return MindMapConfig::default();
    };
    let path = raw_path.trim();
    if path.is_empty() {
        return MindMapConfig::default();
    }

    let loaded = std::fs::read_to_string(path)
        .map_err(|err| err.to_string())
        .and_then(|raw| MindMapConfig::from_json_str(&raw).map_err(|err| err.to_string()));
    match loaded {
        Ok(config) => config,
        Err(reason) => {
            warn!(
                "event=config_load module=ffi status=error fallback=default reason={}",
                reason
            );
            MindMapConfig::default()
        }
    }
}

fn encode_document(document: &GraphDocument) -> String {
    serde_json::to_string(document).unwrap_or_else(|err| {
        warn!("event=snapshot_encode module=ffi status=error reason={}", err);
        String::new()
    })
}
