use anyhow::Result;
use ballot_core::VoteEvent;
use chrono::DateTime;
use clap::Args;

use super::AppContext;
use crate::output::render;

#[derive(Args, Debug)]
pub struct LogArgs {
    /// Number of events to show, newest first.
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

/// Execute `ballot log`: show the most recent vote events.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub fn run_log(args: &LogArgs, ctx: &AppContext) -> Result<()> {
    let events: Vec<VoteEvent> = ctx.open_store()?.recent_events(args.limit)?;

    render(ctx.output, &events, |events, w| {
        if events.is_empty() {
            return writeln!(w, "No votes yet.");
        }
        for event in events {
            writeln!(
                w,
                "#{:<8} {}  image_id={}",
                event.event_id,
                format_timestamp(event.voted_at_us),
                event.item_id
            )?;
        }
        Ok(())
    })
}

fn format_timestamp(us: i64) -> String {
    DateTime::from_timestamp_micros(us).map_or_else(
        || us.to_string(),
        |ts| ts.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::format_timestamp;

    #[test]
    fn formats_microsecond_timestamps() {
        assert_eq!(
            format_timestamp(1_700_000_000_123_456),
            "2023-11-14 22:13:20.123 UTC"
        );
    }
}
