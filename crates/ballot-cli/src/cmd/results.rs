use anyhow::Result;
use ballot_core::TallyEntry;
use clap::Args;

use super::AppContext;
use crate::output::render;

#[derive(Args, Debug)]
pub struct ResultsArgs {
    /// Show only the top N items by votes (leaderboard order).
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub top: Option<u16>,
}

/// Execute `ballot results`: print the full tally in id order, or the
/// leaderboard with `--top`.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub fn run_results(args: &ResultsArgs, ctx: &AppContext) -> Result<()> {
    let service = ctx.open_service()?;
    let entries: Vec<TallyEntry> = match args.top {
        Some(top) => service.leaderboard(usize::from(top))?,
        None => service.snapshot()?.entries().to_vec(),
    };

    render(ctx.output, &entries, |entries, w| {
        if entries.is_empty() {
            return writeln!(w, "No items.");
        }
        writeln!(w, "{:>10}  {:>8}", "image_id", "votes")?;
        for entry in entries {
            writeln!(w, "{:>10}  {:>8}", entry.item_id, entry.votes)?;
        }
        let total: u64 = entries.iter().map(|e| e.votes).sum();
        writeln!(w, "{:>10}  {:>8}", "total", total)
    })
}
