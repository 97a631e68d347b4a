use anyhow::Result;
use ballot_core::{Item, VoteStore};
use clap::Args;

use super::AppContext;
use crate::output::render;

#[derive(Args, Debug)]
pub struct ListArgs {}

/// Execute `ballot list`: print every catalog item in id order.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub fn run_list(_args: &ListArgs, ctx: &AppContext) -> Result<()> {
    let items: Vec<Item> = ctx.open_store()?.load_items()?;

    render(ctx.output, &items, |items, w| {
        if items.is_empty() {
            return writeln!(w, "No items. Add some with `ballot add` or `ballot import`.");
        }
        writeln!(w, "{:>10}  {:<24}  image_url", "image_id", "name")?;
        for item in items {
            writeln!(
                w,
                "{:>10}  {:<24}  {}",
                item.id,
                item.name.as_deref().unwrap_or("-"),
                item.image_url.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    })
}
