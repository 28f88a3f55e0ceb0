use regex::Regex;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use todo_core::db::open_db_in_memory;
use todo_core::{
    load_items, Item, ItemFilter, ItemId, ItemValidationError, MemorySlotRepository, RepoError,
    RepoResult, SequentialIdGenerator, SlotRepository, SqliteSlotRepository, StoreError,
    TodoStore, MAX_ID_ATTEMPTS, TODOS_SLOT_KEY,
};

fn seq_store() -> TodoStore<MemorySlotRepository> {
    TodoStore::open_with_generator(MemorySlotRepository::new(), SequentialIdGenerator::new("t"))
        .unwrap()
}

fn titles<R: SlotRepository>(store: &TodoStore<R>) -> Vec<String> {
    store.items().iter().map(|item| item.title.clone()).collect()
}

fn persisted<R: SlotRepository>(store: &TodoStore<R>) -> Vec<Item> {
    load_items(store.repository(), TODOS_SLOT_KEY)
        .unwrap()
        .unwrap_or_default()
}

fn in_memory<R: SlotRepository>(store: &TodoStore<R>) -> Vec<Item> {
    store.items().iter().map(|item| Item::clone(item)).collect()
}

/// Slot repository whose writes can be switched off.
#[derive(Default)]
struct FlakySlotRepository {
    inner: MemorySlotRepository,
    fail_writes: Cell<bool>,
}

impl SlotRepository for FlakySlotRepository {
    fn read_slot(&self, key: &str) -> RepoResult<Option<String>> {
        self.inner.read_slot(key)
    }

    fn write_slot(&self, key: &str, value: &str) -> RepoResult<()> {
        if self.fail_writes.get() {
            return Err(RepoError::Db(todo_core::db::DbError::Sqlite(
                rusqlite::Error::InvalidQuery,
            )));
        }
        self.inner.write_slot(key, value)
    }
}

#[test]
fn open_without_slot_starts_empty_and_writes_nothing() {
    let store = seq_store();

    assert!(store.is_empty());
    assert_eq!(store.repository().read_slot(TODOS_SLOT_KEY).unwrap(), None);
}

#[test]
fn open_seeds_items_from_slot_in_stored_order() {
    let repo = MemorySlotRepository::new().with_slot(
        TODOS_SLOT_KEY,
        r#"[{"id":"b","title":"Walk dog","completed":false},
            {"id":"a","title":"Buy milk","completed":true}]"#,
    );

    let store = TodoStore::open(repo).unwrap();

    assert_eq!(titles(&store), ["Walk dog", "Buy milk"]);
    assert!(store.get(&ItemId::new("a")).unwrap().completed);
}

#[test]
fn open_with_malformed_slot_reports_corrupt_data() {
    let repo = MemorySlotRepository::new().with_slot(TODOS_SLOT_KEY, "[{\"id\":");

    let err = TodoStore::open(repo).err().unwrap();

    assert!(matches!(err, StoreError::CorruptData(_)));
}

#[test]
fn open_with_blank_or_null_slot_starts_empty() {
    for raw in ["", "   ", "null"] {
        let repo = MemorySlotRepository::new().with_slot(TODOS_SLOT_KEY, raw);

        let mut store = TodoStore::open(repo).unwrap();
        assert!(store.is_empty(), "payload {raw:?}");

        store.add("first").unwrap();
        assert_eq!(persisted(&store), in_memory(&store));
    }
}

#[test]
fn open_with_truncated_object_reports_corrupt_data() {
    let repo = MemorySlotRepository::new().with_slot(TODOS_SLOT_KEY, "{");

    let err = TodoStore::open(repo).err().unwrap();

    assert!(matches!(err, StoreError::CorruptData(_)));
}

#[test]
fn add_prepends_uncompleted_item_with_unique_v4_id() {
    let mut store = TodoStore::open(MemorySlotRepository::new()).unwrap();
    let layout =
        Regex::new(r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$").unwrap();

    let first = store.add("Buy milk").unwrap();
    let second = store.add("Walk dog").unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.items()[0].id, second);
    assert_eq!(store.items()[0].title, "Walk dog");
    assert!(!store.items()[0].completed);
    assert_ne!(first, second);
    assert!(layout.is_match(first.as_str()));
    assert!(layout.is_match(second.as_str()));
}

#[test]
fn add_rejects_blank_title_without_side_effects() {
    let mut store = seq_store();
    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    store.subscribe(move |_| counter.set(counter.get() + 1));

    let err = store.add("   ").unwrap_err();

    assert!(matches!(
        err,
        StoreError::Validation(ItemValidationError::EmptyTitle)
    ));
    assert!(store.is_empty());
    assert_eq!(notified.get(), 0);
    assert_eq!(store.repository().read_slot(TODOS_SLOT_KEY).unwrap(), None);
}

#[test]
fn add_redraws_ids_already_in_use() {
    let repo = MemorySlotRepository::new().with_slot(
        TODOS_SLOT_KEY,
        r#"[{"id":"t-1","title":"seeded","completed":false}]"#,
    );
    let mut store =
        TodoStore::open_with_generator(repo, SequentialIdGenerator::new("t")).unwrap();

    let id = store.add("fresh").unwrap();

    assert_eq!(id.as_str(), "t-2");
}

#[test]
fn add_gives_up_when_generator_only_repeats() {
    let mut store =
        TodoStore::open_with_generator(MemorySlotRepository::new(), || ItemId::new("same"))
            .unwrap();
    store.add("first").unwrap();

    let err = store.add("second").unwrap_err();

    assert!(matches!(err, StoreError::IdCollision { attempts } if attempts == MAX_ID_ATTEMPTS));
    assert_eq!(store.len(), 1);
}

#[test]
fn remove_drops_only_the_matching_item() {
    let mut store = seq_store();
    let a = store.add("a").unwrap();
    store.add("b").unwrap();

    store.remove(&a).unwrap();

    assert_eq!(titles(&store), ["b"]);
    assert_eq!(persisted(&store), in_memory(&store));
}

#[test]
fn missing_ids_are_silent_no_ops_that_still_notify() {
    let mut store = seq_store();
    store.add("a").unwrap();
    let before = store.items().to_vec();
    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    store.subscribe(move |_| counter.set(counter.get() + 1));
    let ghost = ItemId::new("ghost");

    store.remove(&ghost).unwrap();
    store.toggle_one(&ghost).unwrap();
    store.update_title(&ghost, "renamed").unwrap();

    assert_eq!(notified.get(), 3);
    assert!(Rc::ptr_eq(&before[0], &store.items()[0]));
}

#[test]
fn toggle_one_flips_exactly_one_item() {
    let mut store = seq_store();
    let a = store.add("a").unwrap();
    store.add("b").unwrap();
    store.add("c").unwrap();
    let before = store.items().to_vec();

    store.toggle_one(&a).unwrap();

    let after = store.items();
    assert!(Rc::ptr_eq(&before[0], &after[0]));
    assert!(Rc::ptr_eq(&before[1], &after[1]));
    assert!(!Rc::ptr_eq(&before[2], &after[2]));
    assert!(after[2].completed);
    assert_eq!(after[2].id, a);
    assert_eq!(after[2].title, "a");
    assert!(!before[2].completed);

    store.toggle_one(&a).unwrap();
    assert!(!store.items()[2].completed);
}

#[test]
fn toggle_all_only_rebuilds_items_that_change_and_is_idempotent() {
    let mut store = seq_store();
    let a = store.add("a").unwrap();
    store.add("b").unwrap();
    store.toggle_one(&a).unwrap();
    let before = store.items().to_vec();

    store.toggle_all(true).unwrap();

    let after = store.items().to_vec();
    assert!(after.iter().all(|item| item.completed));
    assert!(!Rc::ptr_eq(&before[0], &after[0]));
    assert!(Rc::ptr_eq(&before[1], &after[1]));

    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    store.subscribe(move |_| counter.set(counter.get() + 1));
    store.toggle_all(true).unwrap();

    assert_eq!(notified.get(), 1);
    assert!(store
        .items()
        .iter()
        .zip(&after)
        .all(|(now, then)| Rc::ptr_eq(now, then)));

    store.toggle_all(false).unwrap();
    assert_eq!(store.remaining_count(), 2);
}

#[test]
fn update_title_replaces_matching_item_and_rejects_blank() {
    let mut store = seq_store();
    let a = store.add("draft").unwrap();

    store.update_title(&a, "final").unwrap();
    assert_eq!(store.get(&a).unwrap().title, "final");

    let err = store.update_title(&a, "").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(store.get(&a).unwrap().title, "final");
    assert_eq!(persisted(&store)[0].title, "final");
}

#[test]
fn clear_completed_empties_fully_completed_list_and_tolerates_empty() {
    let mut store = seq_store();
    store.add("a").unwrap();
    store.add("b").unwrap();
    store.toggle_all(true).unwrap();

    store.clear_completed().unwrap();
    assert!(store.is_empty());
    assert!(persisted(&store).is_empty());

    store.clear_completed().unwrap();
    assert!(store.is_empty());
}

#[test]
fn every_mutation_leaves_slot_equal_to_memory() {
    let mut store = seq_store();
    let a = store.add("a").unwrap();
    assert_eq!(persisted(&store), in_memory(&store));
    let b = store.add("b").unwrap();
    assert_eq!(persisted(&store), in_memory(&store));
    store.toggle_one(&a).unwrap();
    assert_eq!(persisted(&store), in_memory(&store));
    store.update_title(&b, "bee").unwrap();
    assert_eq!(persisted(&store), in_memory(&store));
    store.toggle_all(true).unwrap();
    assert_eq!(persisted(&store), in_memory(&store));
    store.toggle_all(false).unwrap();
    assert_eq!(persisted(&store), in_memory(&store));
    store.remove(&b).unwrap();
    assert_eq!(persisted(&store), in_memory(&store));
    store.clear_completed().unwrap();
    assert_eq!(persisted(&store), in_memory(&store));
}

#[test]
fn listeners_run_once_per_mutation_in_order_after_persistence() {
    let mut store = seq_store();
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = Rc::clone(&log);
    store.subscribe(move |store: &TodoStore<MemorySlotRepository>| {
        let slot = load_items(store.repository(), TODOS_SLOT_KEY)
            .unwrap()
            .unwrap();
        let visible: Vec<Item> = store.items().iter().map(|item| Item::clone(item)).collect();
        assert_eq!(slot, visible);
        first.borrow_mut().push(format!("first:{}", store.len()));
    });
    let second = Rc::clone(&log);
    store.subscribe(move |store: &TodoStore<MemorySlotRepository>| {
        second.borrow_mut().push(format!("second:{}", store.len()));
    });
    assert_eq!(store.listener_count(), 2);

    store.add("a").unwrap();
    store.add("b").unwrap();
    store.clear_completed().unwrap();

    assert_eq!(
        *log.borrow(),
        [
            "first:1", "second:1", "first:2", "second:2", "first:2", "second:2"
        ]
    );
}

#[test]
fn failed_persist_keeps_state_and_skips_listeners() {
    let mut store = TodoStore::open_with_generator(
        FlakySlotRepository::default(),
        SequentialIdGenerator::new("t"),
    )
    .unwrap();
    store.add("kept").unwrap();
    let notified = Rc::new(Cell::new(0));
    let counter = Rc::clone(&notified);
    store.subscribe(move |_| counter.set(counter.get() + 1));

    store.repository().fail_writes.set(true);
    let err = store.add("lost").unwrap_err();

    assert!(matches!(err, StoreError::StorageUnavailable(_)));
    assert_eq!(titles(&store), ["kept"]);
    assert_eq!(notified.get(), 0);

    store.repository().fail_writes.set(false);
    store.toggle_all(true).unwrap();
    assert_eq!(notified.get(), 1);
    assert_eq!(persisted(&store), in_memory(&store));
}

#[test]
fn counts_and_filters_follow_completion_state() {
    let mut store = seq_store();
    assert!(!store.all_completed());
    let a = store.add("a").unwrap();
    store.add("b").unwrap();
    store.add("c").unwrap();
    store.toggle_one(&a).unwrap();

    assert_eq!(store.remaining_count(), 2);
    assert_eq!(store.completed_count(), 1);
    assert!(!store.all_completed());

    let active: Vec<ItemId> = store
        .filtered(ItemFilter::Active)
        .iter()
        .map(|item| item.id.clone())
        .collect();
    assert_eq!(active.len(), 2);
    assert!(!active.contains(&a));
    assert_eq!(store.filtered(ItemFilter::Completed)[0].id, a);
    assert_eq!(store.filtered(ItemFilter::All).len(), 3);

    store.toggle_all(store.remaining_count() > 0).unwrap();
    assert!(store.all_completed());
}

#[test]
fn reopening_sqlite_store_restores_last_state() {
    let conn = open_db_in_memory().unwrap();
    let a;
    {
        let mut store = TodoStore::open(SqliteSlotRepository::new(&conn)).unwrap();
        a = store.add("Buy milk").unwrap();
        store.add("Walk dog").unwrap();
        store.toggle_one(&a).unwrap();
    }

    let store = TodoStore::open(SqliteSlotRepository::new(&conn)).unwrap();

    assert_eq!(titles(&store), ["Walk dog", "Buy milk"]);
    assert!(store.get(&a).unwrap().completed);
    let ids: HashSet<&ItemId> = store.items().iter().map(|item| &item.id).collect();
    assert_eq!(ids.len(), 2);
}

#[test]
fn buy_milk_walk_dog_scenario() {
    let mut store = seq_store();

    let milk = store.add("Buy milk").unwrap();
    store.add("Walk dog").unwrap();
    assert_eq!(titles(&store), ["Walk dog", "Buy milk"]);

    store.toggle_one(&milk).unwrap();
    assert_eq!(store.remaining_count(), 1);

    store.clear_completed().unwrap();
    assert_eq!(titles(&store), ["Walk dog"]);
    assert!(!store.items()[0].completed);
}
