use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use super::VoteStore;
use crate::db::{open_store, rebuild};
use crate::error::{BallotError, BallotResult};
use crate::model::{Item, ItemId, VoteEvent};

/// Idle connections kept for reuse by blocking workers.
const MAX_IDLE_CONNECTIONS: usize = 8;

/// Durable vote store backed by one SQLite file.
///
/// Each operation checks out a connection for its own duration only. The
/// pool lock is never held while SQL runs.
#[derive(Debug)]
pub struct SqliteVoteStore {
    path: PathBuf,
    busy_timeout: Duration,
    idle: Mutex<Vec<Connection>>,
}

impl SqliteVoteStore {
    /// Open (creating and migrating if needed) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: impl Into<PathBuf>, busy_timeout: Duration) -> BallotResult<Self> {
        let path = path.into();
        let conn = open_store(&path, busy_timeout)?;
        tracing::debug!(path = %path.display(), "opened sqlite vote store");
        Ok(Self {
            path,
            busy_timeout,
            idle: Mutex::new(vec![conn]),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Most recent vote events, newest first.
    ///
    /// # Errors
    ///
    /// Storage failure.
    pub fn recent_events(&self, limit: usize) -> BallotResult<Vec<VoteEvent>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT event_id, item_id, voted_at_us
                 FROM vote_events
                 ORDER BY event_id DESC
                 LIMIT ?1",
            )?;
            let rows = stmt.query_map([limit], |row| {
                Ok(VoteEvent {
                    event_id: row.get(0)?,
                    item_id: row.get(1)?,
                    voted_at_us: row.get(2)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    /// Recompute every counter from the event log.
    ///
    /// # Errors
    ///
    /// Storage failure; counters are left untouched.
    pub fn rebuild(&self) -> BallotResult<rebuild::RebuildReport> {
        self.with_conn(rebuild::rebuild_counters)
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> BallotResult<T>,
    ) -> BallotResult<T> {
        let pooled = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let mut conn = match pooled {
            Some(conn) => conn,
            None => open_store(&self.path, self.busy_timeout)?,
        };

        let result = f(&mut conn);

        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < MAX_IDLE_CONNECTIONS {
            idle.push(conn);
        }
        result
    }
}

impl VoteStore for SqliteVoteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    fn load_items(&self) -> BallotResult<Vec<Item>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT item_id, name, image_url
                 FROM items
                 ORDER BY item_id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Item {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    image_url: row.get(2)?,
                })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn upsert_items(&self, items: &[Item]) -> BallotResult<usize> {
        self.with_conn(|conn| {
            let now_us = chrono::Utc::now().timestamp_micros();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let mut added = 0_usize;
            {
                let mut exists = tx.prepare("SELECT 1 FROM items WHERE item_id = ?1")?;
                let mut upsert_item = tx.prepare(
                    "INSERT INTO items (item_id, name, image_url, created_at_us)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(item_id) DO UPDATE SET
                         name = COALESCE(excluded.name, items.name),
                         image_url = COALESCE(excluded.image_url, items.image_url)",
                )?;
                let mut ensure_counter = tx.prepare(
                    "INSERT OR IGNORE INTO vote_counters (item_id, votes, updated_at_us)
                     VALUES (?1, 0, ?2)",
                )?;

                for item in items {
                    if !exists.exists([item.id])? {
                        added += 1;
                    }
                    upsert_item.execute(params![item.id, item.name, item.image_url, now_us])?;
                    ensure_counter.execute(params![item.id, now_us])?;
                }
            }
            tx.commit()?;
            tracing::info!(submitted = items.len(), added, "catalog items upserted");
            Ok(added)
        })
    }

    fn increment(&self, id: ItemId) -> BallotResult<u64> {
        self.with_conn(|conn| {
            let now_us = chrono::Utc::now().timestamp_micros();
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            // Only rows present in `items` can be counted; a missing counter
            // row for a known item is created at 1.
            let votes: Option<i64> = tx
                .query_row(
                    "INSERT INTO vote_counters (item_id, votes, updated_at_us)
                     SELECT item_id, 1, ?2 FROM items WHERE item_id = ?1
                     ON CONFLICT(item_id) DO UPDATE SET
                         votes = votes + 1,
                         updated_at_us = excluded.updated_at_us
                     RETURNING votes",
                    params![id, now_us],
                    |row| row.get(0),
                )
                .optional()?;

            // Dropping `tx` without commit rolls back.
            let Some(votes) = votes else {
                return Err(BallotError::UnknownItem(id));
            };

            tx.execute(
                "INSERT INTO vote_events (item_id, voted_at_us) VALUES (?1, ?2)",
                params![id, now_us],
            )?;
            tx.commit()?;

            Ok(u64::try_from(votes).unwrap_or(0))
        })
    }

    fn counts(&self) -> BallotResult<BTreeMap<ItemId, u64>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT item_id, votes FROM vote_counters")?;
            let rows = stmt.query_map([], |row| {
                let id: ItemId = row.get(0)?;
                let votes: i64 = row.get(1)?;
                Ok((id, u64::try_from(votes).unwrap_or(0)))
            })?;
            Ok(rows.collect::<rusqlite::Result<BTreeMap<_, _>>>()?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteVoteStore;
    use crate::db::DEFAULT_BUSY_TIMEOUT;
    use crate::error::{BallotError, ErrorCode};
    use crate::ledger::VoteStore;
    use crate::model::{Item, ItemId};
    use crate::service::VoteService;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_with(ids: &[u32]) -> (TempDir, SqliteVoteStore) {
        let dir = TempDir::new().expect("tempdir");
        let store =
            SqliteVoteStore::open(dir.path().join("ballot.db"), DEFAULT_BUSY_TIMEOUT).expect("open");
        let items: Vec<Item> = ids.iter().map(|&id| Item::new(ItemId::new(id))).collect();
        store.upsert_items(&items).expect("seed");
        (dir, store)
    }

    #[test]
    fn upsert_reports_only_new_ids_and_keeps_metadata() {
        let (_dir, store) = store_with(&[]);
        let first = store
            .upsert_items(&[Item::new(ItemId::new(1)).with_name("Aventus")])
            .expect("first upsert");
        assert_eq!(first, 1);

        let second = store
            .upsert_items(&[Item::new(ItemId::new(1)), Item::new(ItemId::new(2))])
            .expect("second upsert");
        assert_eq!(second, 1);

        let items = store.load_items().expect("load");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name.as_deref(), Some("Aventus"));
    }

    #[test]
    fn new_items_start_with_zero_counters() {
        let (_dir, store) = store_with(&[4, 5]);
        let counts = store.counts().expect("counts");
        assert_eq!(counts.get(&ItemId::new(4)), Some(&0));
        assert_eq!(counts.get(&ItemId::new(5)), Some(&0));
    }

    #[test]
    fn increment_appends_an_event_per_vote() {
        let (_dir, store) = store_with(&[1]);
        assert_eq!(store.increment(ItemId::new(1)).expect("vote"), 1);
        assert_eq!(store.increment(ItemId::new(1)).expect("vote"), 2);

        let events = store.recent_events(10).expect("events");
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.item_id == ItemId::new(1)));
        assert!(events[0].event_id > events[1].event_id, "newest first");
    }

    #[test]
    fn increment_unknown_item_leaves_no_trace() {
        let (_dir, store) = store_with(&[1]);
        let err = store.increment(ItemId::new(2)).expect_err("unknown");
        assert!(matches!(err, BallotError::UnknownItem(id) if id == ItemId::new(2)));

        assert!(store.recent_events(10).expect("events").is_empty());
        assert_eq!(store.counts().expect("counts").get(&ItemId::new(2)), None);
    }

    #[test]
    fn increment_recreates_missing_counter_row_for_known_item() {
        let (_dir, store) = store_with(&[1]);
        store
            .with_conn(|conn| {
                conn.execute("DELETE FROM vote_counters WHERE item_id = 1", [])?;
                Ok(())
            })
            .expect("drop counter");

        assert_eq!(store.increment(ItemId::new(1)).expect("vote"), 1);
    }

    #[test]
    fn failed_event_append_rolls_back_the_counter() {
        let (_dir, store) = store_with(&[1]);
        let store = Arc::new(store);
        let service = VoteService::new(Arc::clone(&store) as Arc<dyn VoteStore>).expect("service");
        service.record_vote(ItemId::new(1)).expect("first vote");

        store
            .with_conn(|conn| {
                conn.execute_batch(
                    "CREATE TRIGGER reject_events BEFORE INSERT ON vote_events
                     BEGIN SELECT RAISE(ABORT, 'event log offline'); END;",
                )?;
                Ok(())
            })
            .expect("install trigger");

        let err = service.record_vote(ItemId::new(1)).expect_err("append fails");
        assert!(matches!(err, BallotError::StorageUnavailable(_)), "{err:?}");
        assert_eq!(err.code(), ErrorCode::StorageUnavailable);

        let snapshot = service.snapshot().expect("snapshot");
        assert_eq!(snapshot.votes_for(ItemId::new(1)), Some(1));
        assert_eq!(store.recent_events(10).expect("events").len(), 1);
    }

    #[test]
    fn rebuild_after_votes_matches_live_counters() {
        let (_dir, store) = store_with(&[1, 2]);
        for _ in 0..3 {
            store.increment(ItemId::new(1)).expect("vote");
        }
        let before = store.counts().expect("counts");

        let report = store.rebuild().expect("rebuild");
        assert_eq!(report.event_count, 3);
        assert_eq!(report.corrected, 0);
        assert_eq!(store.counts().expect("counts"), before);
    }

    #[test]
    fn connections_are_reused() {
        let (_dir, store) = store_with(&[1]);
        for _ in 0..20 {
            store.counts().expect("counts");
        }
        let idle = store.idle.lock().expect("pool lock").len();
        assert_eq!(idle, 1);
    }
}
