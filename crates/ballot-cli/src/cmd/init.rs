use anyhow::{Context as _, Result};
use ballot_core::config::render_config;
use ballot_core::db::migrations::LATEST_SCHEMA_VERSION;
use clap::Args;
use serde::Serialize;

use super::AppContext;
use crate::output::{pretty_kv, render};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct InitReport {
    config: String,
    database: String,
    schema_version: u32,
    items: usize,
}

/// Execute `ballot init`: write the config template and create the database.
///
/// An existing database is opened and migrated in place; its votes are kept.
///
/// # Errors
///
/// Returns an error if the config file exists and `--force` is not set, or
/// if writing the config or opening the database fails.
pub fn run_init(args: &InitArgs, ctx: &AppContext) -> Result<()> {
    if ctx.config_path.exists() && !args.force {
        anyhow::bail!(
            "{} already exists. Use `ballot init --force` to overwrite it.",
            ctx.config_path.display()
        );
    }

    let template = render_config(&ctx.config)?;
    std::fs::write(&ctx.config_path, template)
        .with_context(|| format!("Failed to write config: {}", ctx.config_path.display()))?;

    let service = ctx.open_service()?;
    tracing::info!(
        config = %ctx.config_path.display(),
        database = %ctx.database().display(),
        "initialized ballot"
    );

    let report = InitReport {
        config: ctx.config_path.display().to_string(),
        database: ctx.database().display().to_string(),
        schema_version: LATEST_SCHEMA_VERSION,
        items: service.catalog().len(),
    };
    render(ctx.output, &report, |r, w| {
        writeln!(w, "✓ Initialized ballot.")?;
        writeln!(w)?;
        pretty_kv(w, "Config", &r.config)?;
        pretty_kv(w, "Database", &r.database)?;
        pretty_kv(w, "Items", r.items.to_string())?;
        writeln!(w)?;
        writeln!(w, "Next steps:")?;
        writeln!(w, "  ballot add 1 --name \"First image\"")?;
        writeln!(w, "  ballot serve")
    })
}
