//! Identifier generation for new nodes and edges.
//!
//! # Invariants
//! - Generated ids are non-empty.
//! - Callers must re-draw on collision with an id already in the model;
//!   imported documents may contain arbitrary ids.

use uuid::Uuid;

/// Source of fresh record identifiers.
pub trait IdGenerator: Send {
    /// Returns one new candidate identifier.
    fn next_id(&mut self) -> String;
}

/// Default generator backed by random UUID v4 values (simple form).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Draws ids from `generator` until one is non-empty and not `is_taken`.
pub(crate) fn fresh_id(generator: &mut dyn IdGenerator, is_taken: impl Fn(&str) -> bool) -> String {
    loop {
        let candidate = generator.next_id();
        if !candidate.is_empty() && !is_taken(candidate.as_str()) {
            return candidate;
        }
        log::debug!("event=id_collision module=id status=retry");
    }
}
