use serde::Serialize;

use super::ItemId;

/// One accepted vote, as appended to the `vote_events` log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoteEvent {
    pub event_id: i64,
    pub item_id: ItemId,
    pub voted_at_us: i64,
}

/// Outcome of an accepted vote: the item and its counter after the increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    pub item_id: ItemId,
    pub votes: u64,
}
