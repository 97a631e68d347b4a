//! `VoteService` ties the catalog, selector, ledger, and results together.
//!
//! It is cheap to clone and safe to share across request handlers. All
//! methods are synchronous; async callers run them on a blocking pool.

use std::collections::BTreeSet;
use std::sync::Arc;

use rand::Rng;

use crate::catalog::{Catalog, CatalogHandle};
use crate::error::{BallotError, BallotResult};
use crate::ledger::VoteStore;
use crate::model::{Item, ItemId, VoteReceipt};
use crate::results::{ResultsSnapshot, TallyEntry};
use crate::selector;

#[derive(Debug, Clone)]
pub struct VoteService {
    catalog: Arc<CatalogHandle>,
    store: Arc<dyn VoteStore>,
}

impl VoteService {
    /// Build a service and load the initial catalog from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    pub fn new(store: Arc<dyn VoteStore>) -> BallotResult<Self> {
        let catalog = Catalog::from_items(store.load_items()?);
        tracing::info!(
            backend = store.backend(),
            items = catalog.len(),
            "vote service ready"
        );
        Ok(Self {
            catalog: Arc::new(CatalogHandle::new(catalog)),
            store,
        })
    }

    /// Current catalog snapshot.
    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        self.catalog.current()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn VoteStore> {
        &self.store
    }

    /// Reload the catalog from the store and publish it. Returns the new size.
    ///
    /// # Errors
    ///
    /// Storage failure; the previous snapshot stays in effect.
    pub fn refresh_catalog(&self) -> BallotResult<usize> {
        let (previous, fresh) = self
            .catalog
            .reload(|| Ok::<_, BallotError>(Catalog::from_items(self.store.load_items()?)))?;
        let size = fresh.len();
        if previous.len() != size {
            tracing::info!(before = previous.len(), after = size, "catalog refreshed");
        }
        Ok(size)
    }

    /// Add or update catalog items and publish the new catalog. Returns how
    /// many ids were new.
    ///
    /// # Errors
    ///
    /// Storage failure; nothing is applied.
    pub fn add_items(&self, items: &[Item]) -> BallotResult<usize> {
        let added = self.store.upsert_items(items)?;
        self.refresh_catalog()?;
        Ok(added)
    }

    /// Choose an item for a display slot.
    ///
    /// # Errors
    ///
    /// [`BallotError::EmptyCatalog`] when nothing is eligible.
    pub fn random_item<R: Rng + ?Sized>(
        &self,
        exclude: &BTreeSet<ItemId>,
        rng: &mut R,
    ) -> BallotResult<ItemId> {
        selector::select(&self.catalog.current(), exclude, rng)
    }

    /// Record one vote for `id`.
    ///
    /// The id is checked against the catalog before the store is touched.
    ///
    /// # Errors
    ///
    /// [`BallotError::UnknownItem`] for ids outside the catalog, or a storage
    /// error. In both cases no counter changes.
    pub fn record_vote(&self, id: ItemId) -> BallotResult<VoteReceipt> {
        if !self.catalog.current().exists(id) {
            tracing::debug!(item_id = %id, "vote rejected: unknown item");
            return Err(BallotError::UnknownItem(id));
        }

        let votes = self.store.increment(id)?;
        tracing::debug!(item_id = %id, votes, "vote recorded");
        Ok(VoteReceipt { item_id: id, votes })
    }

    /// Tally of every catalog item, zero-vote items included.
    ///
    /// # Errors
    ///
    /// Storage failure.
    pub fn snapshot(&self) -> BallotResult<ResultsSnapshot> {
        let catalog = self.catalog.current();
        let counts = self.store.counts()?;
        Ok(ResultsSnapshot::aggregate(&catalog, &counts))
    }

    /// Top `limit` items by votes.
    ///
    /// # Errors
    ///
    /// Storage failure.
    pub fn leaderboard(&self, limit: usize) -> BallotResult<Vec<TallyEntry>> {
        Ok(self.snapshot()?.leaderboard(limit))
    }
}

#[cfg(test)]
mod tests {
    use super::VoteService;
    use crate::error::BallotError;
    use crate::ledger::{MemoryVoteStore, VoteStore};
    use crate::model::{Item, ItemId};
    use rand::{SeedableRng, rngs::StdRng};
    use std::collections::BTreeSet;
    use std::sync::Arc;

    const A: ItemId = ItemId::new(1);
    const B: ItemId = ItemId::new(2);
    const C: ItemId = ItemId::new(3);

    fn service_with(ids: &[ItemId]) -> VoteService {
        let store = MemoryVoteStore::new(ids.iter().map(|&id| Item::new(id)));
        VoteService::new(Arc::new(store)).expect("service")
    }

    #[test]
    fn three_votes_for_a_one_for_b() {
        let service = service_with(&[A, B]);
        for _ in 0..3 {
            service.record_vote(A).expect("vote A");
        }
        service.record_vote(B).expect("vote B");

        let snapshot = service.snapshot().expect("snapshot");
        assert_eq!(snapshot.votes_for(A), Some(3));
        assert_eq!(snapshot.votes_for(B), Some(1));
    }

    #[test]
    fn unknown_vote_changes_nothing() {
        let service = service_with(&[A, B]);
        let err = service.record_vote(C).expect_err("C is not in the catalog");
        assert!(matches!(err, BallotError::UnknownItem(id) if id == C));

        let snapshot = service.snapshot().expect("snapshot");
        assert_eq!(snapshot.votes_for(A), Some(0));
        assert_eq!(snapshot.votes_for(B), Some(0));
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn receipt_reports_post_increment_count() {
        let service = service_with(&[A]);
        assert_eq!(service.record_vote(A).expect("vote").votes, 1);
        assert_eq!(service.record_vote(A).expect("vote").votes, 2);
    }

    #[test]
    fn added_items_become_selectable_and_votable() {
        let service = service_with(&[]);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            service.random_item(&BTreeSet::new(), &mut rng),
            Err(BallotError::EmptyCatalog)
        ));

        assert_eq!(service.add_items(&[Item::new(C)]).expect("add"), 1);
        assert_eq!(
            service.random_item(&BTreeSet::new(), &mut rng).expect("select"),
            C
        );
        service.record_vote(C).expect("vote");
    }

    #[test]
    fn refresh_picks_up_items_added_behind_the_service() {
        let store = Arc::new(MemoryVoteStore::new([Item::new(A)]));
        let service = VoteService::new(store.clone()).expect("service");

        store.upsert_items(&[Item::new(B)]).expect("direct upsert");
        assert!(matches!(
            service.record_vote(B),
            Err(BallotError::UnknownItem(_))
        ));

        assert_eq!(service.refresh_catalog().expect("refresh"), 2);
        service.record_vote(B).expect("vote after refresh");
    }

    #[test]
    fn concurrent_adds_all_land_in_the_published_catalog() {
        let service = service_with(&[]);
        std::thread::scope(|scope| {
            for id in 1..=16 {
                let service = service.clone();
                scope.spawn(move || {
                    service
                        .add_items(&[Item::new(ItemId::new(id))])
                        .expect("add");
                });
            }
        });

        assert_eq!(service.catalog().len(), 16);
        for id in 1..=16 {
            service.record_vote(ItemId::new(id)).expect("vote");
        }
    }

    #[test]
    fn sequential_snapshots_are_stable_without_votes() {
        let service = service_with(&[A, B]);
        service.record_vote(A).expect("vote");
        let first = service.snapshot().expect("first");
        let second = service.snapshot().expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn leaderboard_is_a_view_of_the_snapshot() {
        let service = service_with(&[A, B, C]);
        service.record_vote(C).expect("vote");
        service.record_vote(C).expect("vote");
        service.record_vote(A).expect("vote");

        let top = service.leaderboard(2).expect("leaderboard");
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].item_id, C);
        assert_eq!(top[1].item_id, A);
    }
}
