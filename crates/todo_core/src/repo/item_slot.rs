//! JSON codec for the item sequence stored in one slot.

use crate::model::item::Item;
use crate::repo::slot_repo::{RepoError, RepoResult, SlotRepository};
use std::collections::HashSet;

/// Slot key holding the persisted item sequence.
pub const TODOS_SLOT_KEY: &str = "todos";

/// Reads and decodes the item sequence under `key`.
///
/// Returns `Ok(None)` when the slot was never written, is blank, or holds
/// JSON `null`.
///
/// # Errors
/// - `InvalidData` when the payload is not a JSON array of items or two
///   entries share an id.
pub fn load_items<R: SlotRepository + ?Sized>(
    repo: &R,
    key: &str,
) -> RepoResult<Option<Vec<Item>>> {
    let Some(raw) = repo.read_slot(key)? else {
        return Ok(None);
    };
    decode_items(&raw)
}

/// Encodes `items` in order and overwrites the slot under `key`.
pub fn save_items<'a, R, I>(repo: &R, key: &str, items: I) -> RepoResult<()>
where
    R: SlotRepository + ?Sized,
    I: IntoIterator<Item = &'a Item>,
{
    let payload = encode_items(items)?;
    repo.write_slot(key, &payload)
}

fn encode_items<'a>(items: impl IntoIterator<Item = &'a Item>) -> RepoResult<String> {
    let items: Vec<&Item> = items.into_iter().collect();
    serde_json::to_string(&items)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode items: {err}")))
}

fn decode_items(raw: &str) -> RepoResult<Option<Vec<Item>>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let Some(items) = serde_json::from_str::<Option<Vec<Item>>>(raw)
        .map_err(|err| RepoError::InvalidData(format!("failed to decode items: {err}")))?
    else {
        return Ok(None);
    };

    let mut seen = HashSet::with_capacity(items.len());
    for item in &items {
        if !seen.insert(&item.id) {
            return Err(RepoError::InvalidData(format!(
                "duplicate item id `{}`",
                item.id
            )));
        }
    }
    Ok(Some(items))
}
