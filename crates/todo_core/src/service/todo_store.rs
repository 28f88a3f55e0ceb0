//! Item store: canonical state, persistence and change notification.
//!
//! # Responsibility
//! - Own the ordered item sequence for one session.
//! - Persist the full sequence after every mutation.
//! - Notify listeners, in registration order, after persistence succeeds.
//!
//! # Invariants
//! - Each mutation installs a new sequence; unchanged entries keep their
//!   `Rc` allocation, changed entries are new `Item` values.
//! - Items are matched by `ItemId`, never by reference.
//! - The slot always holds the sequence the listeners are about to see.
//! - A failed persist leaves the in-memory sequence untouched and notifies
//!   nobody.

use crate::model::filter::ItemFilter;
use crate::model::id::{IdGenerator, UuidV4Generator};
use crate::model::item::{validate_title, Item, ItemId, ItemValidationError};
use crate::repo::item_slot::{load_items, save_items, TODOS_SLOT_KEY};
use crate::repo::slot_repo::{RepoError, SlotRepository};
use log::{debug, error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;
use std::time::Instant;

/// Fresh-id draws attempted before `add` gives up on collisions.
pub const MAX_ID_ATTEMPTS: usize = 8;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store operation outcome on failure.
#[derive(Debug)]
pub enum StoreError {
    /// Rejected input; nothing was persisted or notified.
    Validation(ItemValidationError),
    /// The slot could not be read or written.
    StorageUnavailable(RepoError),
    /// The slot holds content that does not decode into items.
    CorruptData(String),
    /// The id generator kept returning ids already in use.
    IdCollision { attempts: usize },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::StorageUnavailable(err) => write!(f, "item storage unavailable: {err}"),
            Self::CorruptData(message) => write!(f, "stored items are corrupt: {message}"),
            Self::IdCollision { attempts } => {
                write!(f, "no unused item id after {attempts} attempts")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::StorageUnavailable(err) => Some(err),
            Self::CorruptData(_) | Self::IdCollision { .. } => None,
        }
    }
}

impl From<ItemValidationError> for StoreError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::InvalidData(message) => Self::CorruptData(message),
            other => Self::StorageUnavailable(other),
        }
    }
}

/// Callback invoked with the store after every completed mutation.
pub type ChangeListener<R> = Box<dyn Fn(&TodoStore<R>)>;

/// Single authority for the item list of one session.
pub struct TodoStore<R: SlotRepository> {
    repo: R,
    items: Vec<Rc<Item>>,
    listeners: Vec<ChangeListener<R>>,
    ids: Box<dyn IdGenerator>,
}

impl<R: SlotRepository> TodoStore<R> {
    /// Opens a store seeded from the `todos` slot, with random v4 ids.
    ///
    /// An absent slot seeds an empty sequence.
    ///
    /// # Errors
    /// - `CorruptData` when the slot exists but does not decode.
    /// - `StorageUnavailable` when the slot cannot be read.
    pub fn open(repo: R) -> StoreResult<Self> {
        Self::open_with_generator(repo, UuidV4Generator)
    }

    /// Opens a store with an injected id generator.
    pub fn open_with_generator(repo: R, ids: impl IdGenerator + 'static) -> StoreResult<Self> {
        let items = match load_items(&repo, TODOS_SLOT_KEY) {
            Ok(items) => items.unwrap_or_default(),
            Err(err) => {
                error!("event=store_open module=store status=error error={err}");
                return Err(err.into());
            }
        };
        info!(
            "event=store_open module=store status=ok items={}",
            items.len()
        );

        Ok(Self {
            repo,
            items: items.into_iter().map(Rc::new).collect(),
            listeners: Vec::new(),
            ids: Box::new(ids),
        })
    }

    /// Registers a listener for all future mutations.
    ///
    /// Listeners cannot be removed and run in registration order.
    pub fn subscribe(&mut self, listener: impl Fn(&TodoStore<R>) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Prepends a new uncompleted item and returns its id.
    ///
    /// # Errors
    /// - `Validation` for a blank title.
    /// - `IdCollision` when no unused id is produced in [`MAX_ID_ATTEMPTS`].
    pub fn add(&mut self, title: impl Into<String>) -> StoreResult<ItemId> {
        let title = title.into();
        validate_title(&title)?;
        let id = self.fresh_id()?;

        let mut next = Vec::with_capacity(self.items.len() + 1);
        next.push(Rc::new(Item::new(id.clone(), title)));
        next.extend(self.items.iter().cloned());

        self.commit("add", next)?;
        Ok(id)
    }

    /// Removes the item with `id`. A miss leaves the sequence unchanged.
    pub fn remove(&mut self, id: &ItemId) -> StoreResult<()> {
        let next = self
            .items
            .iter()
            .filter(|item| &item.id != id)
            .cloned()
            .collect();
        self.commit("remove", next)
    }

    /// Flips `completed` on the item with `id`.
    pub fn toggle_one(&mut self, id: &ItemId) -> StoreResult<()> {
        let next = self.replace_where(
            |item| &item.id == id,
            |item| item.with_completed(!item.completed),
        );
        self.commit("toggle_one", next)
    }

    /// Sets `completed` on every item; matching items are kept as-is.
    pub fn toggle_all(&mut self, completed: bool) -> StoreResult<()> {
        let next = self.replace_where(
            |item| item.completed != completed,
            |item| item.with_completed(completed),
        );
        self.commit("toggle_all", next)
    }

    /// Renames the item with `id`.
    ///
    /// # Errors
    /// - `Validation` for a blank title, checked before lookup.
    pub fn update_title(&mut self, id: &ItemId, title: impl Into<String>) -> StoreResult<()> {
        let title = title.into();
        validate_title(&title)?;
        let next = self.replace_where(
            |item| &item.id == id,
            |item| item.with_title(title.as_str()),
        );
        self.commit("update_title", next)
    }

    /// Drops every completed item.
    pub fn clear_completed(&mut self) -> StoreResult<()> {
        let next = self
            .items
            .iter()
            .filter(|item| !item.completed)
            .cloned()
            .collect();
        self.commit("clear_completed", next)
    }

    /// Current sequence, newest first.
    pub fn items(&self) -> &[Rc<Item>] {
        &self.items
    }

    pub fn get(&self, id: &ItemId) -> Option<&Rc<Item>> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items not yet completed.
    pub fn remaining_count(&self) -> usize {
        self.items.iter().filter(|item| !item.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.items.len() - self.remaining_count()
    }

    /// True when there is at least one item and none remain.
    pub fn all_completed(&self) -> bool {
        !self.items.is_empty() && self.remaining_count() == 0
    }

    /// Items visible under `filter`, in display order.
    pub fn filtered(&self, filter: ItemFilter) -> Vec<Rc<Item>> {
        self.items
            .iter()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    fn replace_where(
        &self,
        matches: impl Fn(&Item) -> bool,
        replace: impl Fn(&Item) -> Item,
    ) -> Vec<Rc<Item>> {
        self.items
            .iter()
            .map(|item| {
                if matches(item) {
                    Rc::new(replace(item))
                } else {
                    Rc::clone(item)
                }
            })
            .collect()
    }

    fn fresh_id(&mut self) -> StoreResult<ItemId> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            if self.get(&id).is_none() {
                return Ok(id);
            }
            debug!("event=id_collision module=store status=retry");
        }
        Err(StoreError::IdCollision {
            attempts: MAX_ID_ATTEMPTS,
        })
    }

    fn commit(&mut self, op: &'static str, next: Vec<Rc<Item>>) -> StoreResult<()> {
        let started_at = Instant::now();

        let persisted = save_items(&self.repo, TODOS_SLOT_KEY, next.iter().map(|item| &**item));
        if let Err(err) = persisted {
            error!("event=store_persist module=store status=error op={op} error={err}");
            return Err(StoreError::StorageUnavailable(err));
        }
        self.items = next;

        for listener in &self.listeners {
            listener(self);
        }

        debug!(
            "event=store_mutation module=store status=ok op={op} items={} listeners={} duration_ms={}",
            self.items.len(),
            self.listeners.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}
