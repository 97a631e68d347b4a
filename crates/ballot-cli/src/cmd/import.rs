use std::path::PathBuf;

use anyhow::{Context as _, Result};
use ballot_core::{Item, ItemId};
use clap::Args;
use serde::Serialize;
use serde_json::Value;

use super::AppContext;
use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON array of items or ids, or one id per line (`#` starts a comment).
    #[arg(long)]
    pub file: PathBuf,
}

#[derive(Debug, Serialize)]
struct ImportReport {
    file: String,
    read: usize,
    added: usize,
    catalog_size: usize,
}

/// Execute `ballot import`: bulk-load catalog items in one transaction.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the database
/// write fails. A parse error imports nothing.
pub fn run_import(args: &ImportArgs, ctx: &AppContext) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let items = parse_items(&content)
        .with_context(|| format!("Failed to parse {}", args.file.display()))?;

    let service = ctx.open_service()?;
    let added = service.add_items(&items)?;
    tracing::info!(file = %args.file.display(), read = items.len(), added, "imported items");

    let report = ImportReport {
        file: args.file.display().to_string(),
        read: items.len(),
        added,
        catalog_size: service.catalog().len(),
    };
    render(ctx.output, &report, |r, w| {
        writeln!(w, "✓ Imported {}", r.file)?;
        pretty_kv(w, "Read", r.read.to_string())?;
        pretty_kv(w, "New", r.added.to_string())?;
        pretty_kv(w, "Catalog", r.catalog_size.to_string())
    })
}

/// Parse an import file.
///
/// A document starting with `[` is a JSON array whose elements are item
/// objects (`{"image_id": 1, "name": ..}`) or bare ids. Anything else is
/// read as newline-delimited ids.
fn parse_items(content: &str) -> Result<Vec<Item>> {
    if content.trim_start().starts_with('[') {
        let values: Vec<Value> = serde_json::from_str(content).context("Invalid JSON array")?;
        return values
            .into_iter()
            .enumerate()
            .map(|(idx, value)| {
                let item = if value.is_object() {
                    serde_json::from_value::<Item>(value)
                } else {
                    serde_json::from_value::<ItemId>(value).map(Item::new)
                };
                item.with_context(|| format!("Invalid entry at index {idx}"))
            })
            .collect();
    }

    content
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.split('#').next().unwrap_or_default().trim()))
        .filter(|(_, line)| !line.is_empty())
        .map(|(line_no, line)| {
            line.parse::<ItemId>()
                .map(Item::new)
                .with_context(|| format!("Invalid id on line {line_no}"))
        })
        .collect()
}
