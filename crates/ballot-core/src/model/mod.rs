//! Domain types shared by the catalog, ledger, and results projection.

pub mod item;
pub mod item_id;
pub mod vote;

pub use item::Item;
pub use item_id::{ItemId, MAX_ITEM_ID, ParseItemIdError};
pub use vote::{VoteEvent, VoteReceipt};
