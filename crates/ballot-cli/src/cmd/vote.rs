use anyhow::Result;
use ballot_core::ItemId;
use clap::Args;

use super::AppContext;
use crate::output::render;

#[derive(Args, Debug)]
pub struct VoteArgs {
    /// Item to vote for.
    pub id: ItemId,
}

/// Execute `ballot vote`: record one vote through the same path as
/// `POST /save_vote`.
///
/// # Errors
///
/// Returns an error if the id is not in the catalog or the write fails.
pub fn run_vote(args: &VoteArgs, ctx: &AppContext) -> Result<()> {
    let receipt = ctx.open_service()?.record_vote(args.id)?;

    render(ctx.output, &receipt, |r, w| {
        writeln!(w, "✓ Vote recorded for {} (now {})", r.item_id, r.votes)
    })
}
