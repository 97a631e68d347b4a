//! The item catalog: the set of identifiers eligible for selection and voting.
//!
//! A [`Catalog`] is immutable once built. [`CatalogHandle`] publishes the
//! current snapshot behind an `Arc` and swaps it wholesale on refresh, so
//! readers clone a pointer and never hold a lock across I/O.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::model::{Item, ItemId};

/// Immutable snapshot of the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: BTreeMap<ItemId, Item>,
    // Sorted ids for O(1) uniform indexing.
    ids: Vec<ItemId>,
}

impl Catalog {
    /// Build a catalog from items. Later duplicates replace earlier ones.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let items: BTreeMap<ItemId, Item> = items.into_iter().map(|item| (item.id, item)).collect();
        let ids = items.keys().copied().collect();
        Self { items, ids }
    }

    /// All identifiers, ascending.
    #[must_use]
    pub fn list(&self) -> BTreeSet<ItemId> {
        self.ids.iter().copied().collect()
    }

    /// All identifiers as a sorted slice.
    #[must_use]
    pub fn ids(&self) -> &[ItemId] {
        &self.ids
    }

    #[must_use]
    pub fn exists(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// Items in ascending id order.
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Shared, swappable pointer to the current [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogHandle {
    current: RwLock<Arc<Catalog>>,
    reload: Mutex<()>,
}

impl CatalogHandle {
    #[must_use]
    pub fn new(catalog: Catalog) -> Self {
        Self {
            current: RwLock::new(Arc::new(catalog)),
            reload: Mutex::new(()),
        }
    }

    /// The snapshot in effect right now.
    #[must_use]
    pub fn current(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Publish a new snapshot. Returns the previous one.
    pub fn replace(&self, catalog: Catalog) -> Arc<Catalog> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(catalog))
    }

    /// Build a snapshot with `load` and publish it, one reload at a time.
    ///
    /// Reloads are serialized so a slow load cannot publish over a snapshot
    /// read later. Readers are not blocked while `load` runs. Returns the
    /// previous and the new snapshot.
    ///
    /// # Errors
    ///
    /// Whatever `load` returns; the current snapshot is left in place.
    pub fn reload<E>(
        &self,
        load: impl FnOnce() -> Result<Catalog, E>,
    ) -> Result<(Arc<Catalog>, Arc<Catalog>), E> {
        let _serial = self.reload.lock().unwrap_or_else(PoisonError::into_inner);
        let fresh = Arc::new(load()?);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let previous = std::mem::replace(&mut *guard, Arc::clone(&fresh));
        Ok((previous, fresh))
    }
}
