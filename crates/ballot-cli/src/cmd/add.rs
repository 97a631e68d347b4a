use anyhow::Result;
use ballot_core::{Item, ItemId};
use clap::Args;
use serde::Serialize;

use super::AppContext;
use crate::output::render;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Item id (non-negative integer).
    pub id: ItemId,

    /// Display name.
    #[arg(long)]
    pub name: Option<String>,

    /// Image URL shown to voters.
    #[arg(long)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct AddReport {
    #[serde(flatten)]
    item: Item,
    created: bool,
}

/// Execute `ballot add`: insert or update one catalog item.
///
/// Re-adding an existing id updates its metadata and keeps its votes.
///
/// # Errors
///
/// Returns an error if the database cannot be opened or written.
pub fn run_add(args: &AddArgs, ctx: &AppContext) -> Result<()> {
    let mut item = Item::new(args.id);
    item.name.clone_from(&args.name);
    item.image_url.clone_from(&args.image_url);

    let service = ctx.open_service()?;
    let created = service.add_items(std::slice::from_ref(&item))? == 1;

    let report = AddReport { item, created };
    render(ctx.output, &report, |r, w| {
        let verb = if r.created { "Added" } else { "Updated" };
        match &r.item.name {
            Some(name) => writeln!(w, "✓ {verb} item {} ({name})", r.item.id),
            None => writeln!(w, "✓ {verb} item {}", r.item.id),
        }
    })
}
