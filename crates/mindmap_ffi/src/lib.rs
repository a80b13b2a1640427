//! Flutter-facing bindings for the mind-map engine.

pub mod api;
