pub mod add;
pub mod completions;
pub mod import;
pub mod init;
pub mod list;
pub mod log;
pub mod rebuild;
pub mod results;
pub mod serve;
pub mod vote;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use ballot_core::config::BallotConfig;
use ballot_core::{SqliteVoteStore, VoteService};

use crate::output::OutputMode;

/// Resolved settings shared by every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: BallotConfig,
    pub config_path: PathBuf,
    pub output: OutputMode,
}

impl AppContext {
    #[must_use]
    pub fn database(&self) -> &Path {
        &self.config.store.database
    }

    /// Open (creating and migrating if needed) the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or migrated.
    pub fn open_store(&self) -> Result<SqliteVoteStore> {
        SqliteVoteStore::open(self.database(), self.config.store.busy_timeout())
            .with_context(|| format!("Failed to open {}", self.database().display()))
    }

    pub fn open_service(&self) -> Result<VoteService> {
        let store = self.open_store()?;
        VoteService::new(Arc::new(store)).context("Failed to load the catalog")
    }
}
