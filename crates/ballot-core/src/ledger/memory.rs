use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use super::VoteStore;
use crate::error::{BallotError, BallotResult};
use crate::model::{Item, ItemId};

#[derive(Debug)]
struct Entry {
    item: Item,
    votes: AtomicU64,
}

/// In-process vote store with one atomic counter per item.
///
/// Votes take the map's read lock and `fetch_add` the counter, so
/// increments on different items never contend. Only catalog upserts take
/// the write lock.
#[derive(Debug, Default)]
pub struct MemoryVoteStore {
    entries: RwLock<BTreeMap<ItemId, Entry>>,
}

impl MemoryVoteStore {
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let entries = items
            .into_iter()
            .map(|item| {
                (
                    item.id,
                    Entry {
                        item,
                        votes: AtomicU64::new(0),
                    },
                )
            })
            .collect();
        Self {
            entries: RwLock::new(entries),
        }
    }
}

impl VoteStore for MemoryVoteStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn load_items(&self) -> BallotResult<Vec<Item>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.values().map(|entry| entry.item.clone()).collect())
    }

    fn upsert_items(&self, items: &[Item]) -> BallotResult<usize> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let mut added = 0;
        for item in items {
            if let Some(entry) = entries.get_mut(&item.id) {
                if item.name.is_some() {
                    entry.item.name.clone_from(&item.name);
                }
                if item.image_url.is_some() {
                    entry.item.image_url.clone_from(&item.image_url);
                }
            } else {
                entries.insert(
                    item.id,
                    Entry {
                        item: item.clone(),
                        votes: AtomicU64::new(0),
                    },
                );
                added += 1;
            }
        }
        Ok(added)
    }

    fn increment(&self, id: ItemId) -> BallotResult<u64> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&id).ok_or(BallotError::UnknownItem(id))?;
        Ok(entry.votes.fetch_add(1, Ordering::AcqRel) + 1)
    }

    fn counts(&self) -> BallotResult<BTreeMap<ItemId, u64>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .iter()
            .map(|(id, entry)| (*id, entry.votes.load(Ordering::Acquire)))
            .collect())
    }
}
