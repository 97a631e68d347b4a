//! ballot-core library.
//!
//! Catalog, random selection, vote ledger, and results for the ballot
//! vote-tally service.
//!
//! # Conventions
//!
//! - **Errors**: library operations return [`BallotResult`]; config and
//!   bootstrap helpers return `anyhow::Result`.
//! - **Logging**: `tracing` macros with structured fields.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod model;
pub mod results;
pub mod selector;
pub mod service;

pub use catalog::{Catalog, CatalogHandle};
pub use error::{BallotError, BallotResult, ErrorCode};
pub use ledger::{MemoryVoteStore, SqliteVoteStore, VoteStore};
pub use model::{Item, ItemId, VoteEvent, VoteReceipt};
pub use results::{ResultsSnapshot, TallyEntry};
pub use service::VoteService;
