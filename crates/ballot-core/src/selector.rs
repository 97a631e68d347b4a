//! Uniform random selection of an item for a display slot.
//!
//! Every call draws independently from the catalog snapshot it is given.
//! Two slots asking at the same time may receive the same item; callers that
//! want distinct slots pass the other slot's id in `exclude`.

use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::{IteratorRandom, SliceRandom};

use crate::catalog::Catalog;
use crate::error::{BallotError, BallotResult};
use crate::model::ItemId;

/// Pick an identifier uniformly at random from `catalog` minus `exclude`.
///
/// Exclusions that are not in the catalog are ignored.
///
/// # Errors
///
/// Returns [`BallotError::EmptyCatalog`] when no eligible item remains.
pub fn select<R: Rng + ?Sized>(
    catalog: &Catalog,
    exclude: &BTreeSet<ItemId>,
    rng: &mut R,
) -> BallotResult<ItemId> {
    let picked = if exclude.is_empty() {
        catalog.ids().choose(rng).copied()
    } else {
        catalog
            .ids()
            .iter()
            .filter(|id| !exclude.contains(id))
            .copied()
            .choose(rng)
    };

    picked.ok_or(BallotError::EmptyCatalog)
}
