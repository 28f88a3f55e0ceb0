//! Durable key-value slots and the item codec stored in them.
//!
//! # Responsibility
//! - Define the slot storage contract used by the store.
//! - Keep SQL and JSON details out of store orchestration.
//!
//! # Invariants
//! - Slot writes fully overwrite prior content; there are no partial writes.
//! - Read paths surface undecodable content instead of masking it.

pub mod item_slot;
pub mod slot_repo;
