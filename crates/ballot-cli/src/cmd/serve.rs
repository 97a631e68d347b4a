use std::sync::Arc;

use anyhow::{Context as _, Result};
use ballot_core::{MemoryVoteStore, VoteService, VoteStore};
use ballot_server::AppState;
use clap::Args;

use super::AppContext;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (overrides `[server] bind`).
    #[arg(long, env = "BALLOT_BIND")]
    pub bind: Option<String>,

    /// Keep votes in memory only. The catalog is seeded from the database
    /// when it exists; nothing is written back.
    #[arg(long)]
    pub ephemeral: bool,
}

/// Run `ballot serve` until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the store cannot be opened, the address cannot be
/// bound, or the server fails.
pub fn run_serve(args: &ServeArgs, ctx: &AppContext) -> Result<()> {
    let mut server_config = ctx.config.server.clone();
    if let Some(bind) = &args.bind {
        server_config.bind.clone_from(bind);
    }

    let service = if args.ephemeral {
        ephemeral_service(ctx)?
    } else {
        ctx.open_service()?
    };
    let state =
        AppState::new(service).with_leaderboard_size(ctx.config.results.leaderboard_size);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(ballot_server::serve(state, &server_config))
}

fn ephemeral_service(ctx: &AppContext) -> Result<VoteService> {
    let items = if ctx.database().exists() {
        ctx.open_store()?.load_items()?
    } else {
        Vec::new()
    };
    tracing::warn!(items = items.len(), "serving with an in-memory store; votes are not persisted");
    VoteService::new(Arc::new(MemoryVoteStore::new(items))).context("Failed to load the catalog")
}
