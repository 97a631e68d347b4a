//! Results projection: per-item tallies over the whole catalog.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::model::ItemId;

/// Default leaderboard size (the original hall-of-fame page showed ten).
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// One `{image_id, votes}` record as served by `/get_results`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    #[serde(rename = "image_id")]
    pub item_id: ItemId,
    pub votes: u64,
}

/// Read-only tally covering every catalog item, ascending by id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResultsSnapshot {
    entries: Vec<TallyEntry>,
}

impl ResultsSnapshot {
    /// Join catalog membership with counter values.
    ///
    /// Catalog items missing from `counts` report zero. Counters for ids
    /// outside the catalog are dropped.
    #[must_use]
    pub fn aggregate(catalog: &Catalog, counts: &BTreeMap<ItemId, u64>) -> Self {
        let entries = catalog
            .ids()
            .iter()
            .map(|&item_id| TallyEntry {
                item_id,
                votes: counts.get(&item_id).copied().unwrap_or(0),
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[TallyEntry] {
        &self.entries
    }

    #[must_use]
    pub fn votes_for(&self, id: ItemId) -> Option<u64> {
        self.entries
            .binary_search_by_key(&id, |entry| entry.item_id)
            .ok()
            .map(|idx| self.entries[idx].votes)
    }

    #[must_use]
    pub fn total_votes(&self) -> u64 {
        self.entries.iter().map(|entry| entry.votes).sum()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top `limit` entries by votes, ties broken by ascending id.
    #[must_use]
    pub fn leaderboard(&self, limit: usize) -> Vec<TallyEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes).then(a.item_id.cmp(&b.item_id)));
        ranked.truncate(limit);
        ranked
    }
}
