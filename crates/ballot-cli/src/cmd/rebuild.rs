use anyhow::Result;
use clap::Args;
use serde::Serialize;

use super::AppContext;
use crate::output::render;

#[derive(Args, Debug)]
pub struct RebuildArgs {}

#[derive(Debug, Serialize)]
struct RebuildSummary {
    items: usize,
    events: usize,
    corrected: usize,
    elapsed_ms: u128,
}

/// Run `ballot rebuild`: recompute every vote counter from the event log.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the rebuild fails.
pub fn run_rebuild(_args: &RebuildArgs, ctx: &AppContext) -> Result<()> {
    let report = ctx.open_store()?.rebuild()?;

    let summary = RebuildSummary {
        items: report.item_count,
        events: report.event_count,
        corrected: report.corrected,
        elapsed_ms: report.elapsed.as_millis(),
    };
    render(ctx.output, &summary, |s, w| {
        writeln!(
            w,
            "rebuild: items={} events={} corrected={} elapsed={}ms",
            s.items, s.events, s.corrected, s.elapsed_ms
        )
    })
}
