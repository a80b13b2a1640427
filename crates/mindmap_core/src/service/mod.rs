//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store transitions into gesture-level APIs.
//! - Keep UI/FFI layers decoupled from graph internals.

pub mod mindmap_service;
