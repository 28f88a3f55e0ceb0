//! Core use-case services.
//!
//! # Responsibility
//! - Own the canonical item sequence and its change propagation.
//! - Keep drivers (CLI, UI bindings) decoupled from storage details.

pub mod todo_store;
