//! Collaborator capabilities consumed by the core.
//!
//! # Responsibility
//! - Declare the narrow interfaces the engine needs from its host: user
//!   confirmation, canvas projection, file read, document save and user
//!   notification.
//! - Ship filesystem and log-backed defaults for hosts without their own.
//!
//! # Invariants
//! - Capabilities never mutate the model; they only return data or
//!   decisions to the caller.

use crate::model::node::{NodeId, Position};
use log::{info, warn};
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Outcome of a confirmation prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accepted,
    Declined,
}

impl Decision {
    pub fn from_accepted(accepted: bool) -> Self {
        if accepted {
            Self::Accepted
        } else {
            Self::Declined
        }
    }
}

/// Asks the user to confirm a destructive action.
pub trait ConfirmationPrompt {
    fn confirm(&self, message: &str) -> Decision;
}

/// Projects a point relative to the canvas element into canvas space,
/// applying the active pan/zoom.
pub trait CanvasProjection {
    fn screen_to_canvas(&self, point: Position) -> Position;
}

/// Reads raw document text for import.
pub trait FileReader {
    fn read_file(&self, handle: &Path) -> io::Result<String>;
}

/// Reads straight from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileReader;

impl FileReader for FsFileReader {
    fn read_file(&self, handle: &Path) -> io::Result<String> {
        fs::read_to_string(handle)
    }
}

/// Receives exported document text (the "download" side effect).
pub trait DocumentSink {
    fn save(&self, file_name: &str, contents: &str) -> io::Result<()>;
}

/// Writes exported documents into one directory.
#[derive(Debug, Clone)]
pub struct FsDocumentSink {
    dir: PathBuf,
}

impl FsDocumentSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl DocumentSink for FsDocumentSink {
    fn save(&self, file_name: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(file_name), contents)
    }
}

/// User-visible outcome of a recoverable event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Import failed; the model was left untouched.
    ImportRejected { reason: String },
    /// A confirmed deletion was applied.
    NodeDeleted { node_id: NodeId },
    /// A deletion request was declined.
    DeleteCancelled { node_id: NodeId },
    /// The map has no nodes left.
    MapEmpty,
}

impl Notice {
    /// Stable event name used in logs and FFI envelopes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImportRejected { .. } => "import_rejected",
            Self::NodeDeleted { .. } => "node_deleted",
            Self::DeleteCancelled { .. } => "delete_cancelled",
            Self::MapEmpty => "map_empty",
        }
    }
}

impl Display for Notice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImportRejected { reason } => write!(f, "Import failed: {reason}"),
            Self::NodeDeleted { .. } => write!(f, "Deleted! Your node has been deleted."),
            Self::DeleteCancelled { .. } => write!(f, "Cancelled. Your node is safe."),
            Self::MapEmpty => write!(f, "No nodes available!"),
        }
    }
}

/// Surfaces notices to the user.
pub trait Notifier: Send {
    fn notify(&self, notice: &Notice);
}

/// Default notifier: records notices as log events only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice {
            Notice::ImportRejected { .. } | Notice::MapEmpty => {
                warn!("event=notice module=capability kind={}", notice.as_str())
            }
            Notice::NodeDeleted { node_id } | Notice::DeleteCancelled { node_id } => info!(
                "event=notice module=capability kind={} node_id={}",
                notice.as_str(),
                node_id
            ),
        }
    }
}
