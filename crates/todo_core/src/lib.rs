//! Core of the todo list: items, their durable slot, and the store that
//! keeps both in step and notifies listeners.
//! This crate is the single source of truth for item invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::filter::{ItemFilter, UnknownFilter};
pub use model::id::{IdGenerator, SequentialIdGenerator, UuidV4Generator};
pub use model::item::{validate_title, Item, ItemId, ItemValidationError};
pub use repo::item_slot::{load_items, save_items, TODOS_SLOT_KEY};
pub use repo::slot_repo::{
    MemorySlotRepository, RepoError, RepoResult, SlotRepository, SqliteSlotRepository,
};
pub use service::todo_store::{
    ChangeListener, StoreError, StoreResult, TodoStore, MAX_ID_ATTEMPTS,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
