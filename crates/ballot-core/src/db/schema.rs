//! Canonical SQLite schema for the vote store.
//!
//! - `items` is the catalog: one row per votable item
//! - `vote_events` is the append-only log, one row per accepted vote
//! - `vote_counters` is the materialized per-item count over `vote_events`
//! - `store_meta` tracks schema version and the last counter rebuild

/// Migration v1: catalog, event log, counters, and metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS items (
    item_id INTEGER PRIMARY KEY CHECK (item_id >= 0),
    name TEXT,
    image_url TEXT,
    created_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS vote_counters (
    item_id INTEGER PRIMARY KEY REFERENCES items(item_id),
    votes INTEGER NOT NULL DEFAULT 0 CHECK (votes >= 0),
    updated_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS vote_events (
    event_id INTEGER PRIMARY KEY AUTOINCREMENT,
    item_id INTEGER NOT NULL REFERENCES items(item_id),
    voted_at_us INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    last_rebuild_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (
    id,
    schema_version,
    last_rebuild_at_us
) VALUES (1, 1, 0);
";

/// Migration v2: read-path indexes for results and rebuild.
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_vote_events_item_time
    ON vote_events(item_id, voted_at_us);

CREATE INDEX IF NOT EXISTS idx_vote_counters_votes
    ON vote_counters(votes DESC, item_id ASC);
";

/// Indexes every fully migrated store must have.
pub const REQUIRED_INDEXES: &[&str] = &["idx_vote_events_item_time", "idx_vote_counters_votes"];
