//! Item identifier generation.
//!
//! # Responsibility
//! - Provide the id capability injected into a store.
//! - Keep id policy out of process-wide state.
//!
//! # Invariants
//! - `UuidV4Generator` emits the canonical 8-4-4-4-12 lowercase layout with
//!   version nibble `4` and variant nibble in `8..=b`.
//! - Uniqueness of v4 ids is probabilistic; the store guards collisions.

use crate::model::item::ItemId;
use uuid::Uuid;

/// Source of fresh item ids.
pub trait IdGenerator {
    fn next_id(&mut self) -> ItemId;
}

/// Random UUID v4 ids. Default for production stores.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidV4Generator;

impl IdGenerator for UuidV4Generator {
    fn next_id(&mut self) -> ItemId {
        ItemId::new(Uuid::new_v4().hyphenated().to_string())
    }
}

/// Deterministic `"{prefix}-{n}"` ids, counting from 1.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("item")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> ItemId {
        let id = ItemId::new(format!("{}-{}", self.prefix, self.next));
        self.next += 1;
        id
    }
}

impl<F> IdGenerator for F
where
    F: FnMut() -> ItemId,
{
    fn next_id(&mut self) -> ItemId {
        self()
    }
}
