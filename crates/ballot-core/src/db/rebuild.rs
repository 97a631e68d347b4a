//! Counter rebuild from the vote event log.
//!
//! `ballot rebuild` recomputes every `vote_counters` row from `vote_events`,
//! proving the counters are a disposable materialization of the log.

use std::time::{Duration, Instant};

use rusqlite::{Connection, TransactionBehavior};

use crate::error::BallotResult;

/// Report returned after a counter rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    /// Catalog items whose counters were recomputed.
    pub item_count: usize,
    /// Vote events replayed.
    pub event_count: usize,
    /// Counters whose stored value disagreed with the log.
    pub corrected: usize,
    /// Wall-clock elapsed time for the rebuild.
    pub elapsed: Duration,
}

/// Recompute every counter from the event log in one immediate transaction.
///
/// Concurrent voters wait on the write lock, so no vote lands between the
/// recount and the commit.
///
/// # Errors
///
/// Returns an error if any statement fails; the transaction is rolled back
/// and the previous counters remain in place.
pub fn rebuild_counters(conn: &mut Connection) -> BallotResult<RebuildReport> {
    let start = Instant::now();
    let now_us = chrono::Utc::now().timestamp_micros();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "INSERT OR IGNORE INTO vote_counters (item_id, votes, updated_at_us)
         SELECT item_id, 0, ?1 FROM items",
        [now_us],
    )?;

    let corrected: i64 = tx.query_row(
        "SELECT COUNT(*)
         FROM vote_counters c
         WHERE c.votes <> (
             SELECT COUNT(*) FROM vote_events e WHERE e.item_id = c.item_id
         )",
        [],
        |row| row.get(0),
    )?;

    tx.execute(
        "UPDATE vote_counters
         SET votes = (
                 SELECT COUNT(*) FROM vote_events e WHERE e.item_id = vote_counters.item_id
             ),
             updated_at_us = ?1",
        [now_us],
    )?;

    tx.execute(
        "UPDATE store_meta SET last_rebuild_at_us = ?1 WHERE id = 1",
        [now_us],
    )?;

    let item_count: i64 = tx.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0))?;
    let event_count: i64 =
        tx.query_row("SELECT COUNT(*) FROM vote_events", [], |row| row.get(0))?;

    tx.commit()?;

    let elapsed = start.elapsed();
    let report = RebuildReport {
        item_count: usize::try_from(item_count).unwrap_or(0),
        event_count: usize::try_from(event_count).unwrap_or(0),
        corrected: usize::try_from(corrected).unwrap_or(0),
        elapsed,
    };

    tracing::info!(
        item_count = report.item_count,
        event_count = report.event_count,
        corrected = report.corrected,
        elapsed_ms = elapsed.as_millis(),
        "counter rebuild complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::rebuild_counters;
    use crate::db::{DEFAULT_BUSY_TIMEOUT, open_store};
    use rusqlite::Connection;
    use tempfile::TempDir;

    fn seeded_store() -> (TempDir, Connection) {
        let dir = TempDir::new().expect("create tempdir");
        let conn = open_store(&dir.path().join("ballot.db"), DEFAULT_BUSY_TIMEOUT)
            .expect("open store");
        conn.execute_batch(
            "INSERT INTO items (item_id, created_at_us) VALUES (1, 0), (2, 0), (3, 0);
             INSERT INTO vote_counters (item_id, votes, updated_at_us) VALUES (1, 2, 0), (2, 1, 0);
             INSERT INTO vote_events (item_id, voted_at_us) VALUES (1, 10), (1, 11), (2, 12);",
        )
        .expect("seed");
        (dir, conn)
    }

    fn counter(conn: &Connection, item_id: i64) -> i64 {
        conn.query_row(
            "SELECT votes FROM vote_counters WHERE item_id = ?1",
            [item_id],
            |row| row.get(0),
        )
        .expect("counter row")
    }

    #[test]
    fn rebuild_matching_counters_is_a_no_op() {
        let (_dir, mut conn) = seeded_store();

        let report = rebuild_counters(&mut conn).expect("rebuild");
        assert_eq!(report.item_count, 3);
        assert_eq!(report.event_count, 3);
        assert_eq!(report.corrected, 0);

        assert_eq!(counter(&conn, 1), 2);
        assert_eq!(counter(&conn, 2), 1);
        // Missing counter rows are created at zero.
        assert_eq!(counter(&conn, 3), 0);
    }

    #[test]
    fn rebuild_repairs_drifted_counters() {
        let (_dir, mut conn) = seeded_store();
        conn.execute("UPDATE vote_counters SET votes = 40 WHERE item_id = 1", [])
            .expect("corrupt counter");

        let report = rebuild_counters(&mut conn).expect("rebuild");
        assert_eq!(report.corrected, 1);
        assert_eq!(counter(&conn, 1), 2);
    }

    #[test]
    fn rebuild_records_timestamp() {
        let (_dir, mut conn) = seeded_store();
        rebuild_counters(&mut conn).expect("rebuild");

        let last: i64 = conn
            .query_row(
                "SELECT last_rebuild_at_us FROM store_meta WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .expect("meta row");
        assert!(last > 0);
    }
}
