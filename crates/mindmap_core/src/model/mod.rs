//! Mind-map domain model.
//!
//! # Responsibility
//! - Define canonical node/edge records used by core business logic.
//! - Keep the wire shape of the exported document in one place.
//!
//! # Invariants
//! - Every record is identified by a stable string id.
//! - Hierarchy (`parent_id`) and edges are separate relations.

pub mod edge;
pub mod node;
