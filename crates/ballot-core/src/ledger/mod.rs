//! The vote ledger: authoritative per-item counters.
//!
//! [`VoteStore`] is the storage seam. Every backend must make "read current
//! value, add one, write back" a single indivisible step:
//!
//! - [`SqliteVoteStore`] appends a `vote_events` row and bumps the counter in
//!   one `BEGIN IMMEDIATE` transaction. Processes sharing the database file
//!   are serialized by SQLite's write lock.
//! - [`MemoryVoteStore`] keeps one `AtomicU64` per item. Single-process and
//!   not durable.

mod memory;
mod sqlite;

use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::error::BallotResult;
use crate::model::{Item, ItemId};

pub use memory::MemoryVoteStore;
pub use sqlite::SqliteVoteStore;

/// Storage backend for the catalog rows and their vote counters.
pub trait VoteStore: Send + Sync + Debug {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    /// Every catalog item, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BallotError::StorageUnavailable`] if the backing
    /// store cannot be read.
    fn load_items(&self) -> BallotResult<Vec<Item>>;

    /// Insert or update catalog items, creating a zero counter for each new
    /// one. Returns how many ids were new.
    ///
    /// # Errors
    ///
    /// Storage failure; nothing is applied.
    fn upsert_items(&self, items: &[Item]) -> BallotResult<usize>;

    /// Add exactly one vote to `id` and return the new count.
    ///
    /// # Errors
    ///
    /// [`crate::BallotError::UnknownItem`] when the store has no such item,
    /// or a storage error. Either way no counter changes.
    fn increment(&self, id: ItemId) -> BallotResult<u64>;

    /// Current counter values. Items never voted on may be absent.
    ///
    /// # Errors
    ///
    /// Storage failure.
    fn counts(&self) -> BallotResult<BTreeMap<ItemId, u64>>;
}
