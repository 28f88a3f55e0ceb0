//! Domain model for the task list.
//!
//! # Responsibility
//! - Define the canonical item record persisted in the `todos` slot.
//! - Provide id generation and view filters shared by every driver.
//!
//! # Invariants
//! - Every item is identified by an `ItemId` that never changes.
//! - Mutation helpers return new values; stored items are never edited in place.

pub mod filter;
pub mod id;
pub mod item;
