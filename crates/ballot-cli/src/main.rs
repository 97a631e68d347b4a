#![forbid(unsafe_code)]

mod cmd;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use ballot_core::config::{CONFIG_FILE_NAME, load_config};
use clap::{CommandFactory, Parser, Subcommand};
use cmd::AppContext;
use output::{CliError, OutputMode, render_error};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ballot: pairwise image voting service",
    long_about = None
)]
struct Cli {
    /// Enable debug logging when `BALLOT_LOG` is not set.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Database file (overrides `[store] database`).
    #[arg(long, global = true, env = "BALLOT_DB")]
    db: Option<PathBuf>,

    /// Config file to read.
    #[arg(long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    const fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }

    /// Merge flags over the config file.
    fn context(&self) -> Result<AppContext> {
        let mut config = load_config(&self.config)?;
        if let Some(db) = &self.db {
            config.store.database.clone_from(db);
        }
        Ok(AppContext {
            config,
            config_path: self.config.clone(),
            output: self.output_mode(),
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Create the database and config file",
        after_help = "EXAMPLES:\n    # Initialize in the current directory\n    ballot init\n\n    # Use a database elsewhere\n    ballot --db /var/lib/ballot/ballot.db init"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Add or update one catalog item",
        after_help = "EXAMPLES:\n    # Add an item\n    ballot add 375 --name \"Harbor at dusk\" --image-url https://img.test/375x500.375.jpg"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Import catalog items from a file",
        after_help = "EXAMPLES:\n    # One id per line\n    ballot import --file ids.txt\n\n    # JSON array of items\n    ballot import --file items.json"
    )]
    Import(cmd::import::ImportArgs),

    #[command(next_help_heading = "Catalog", about = "List catalog items")]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Votes",
        about = "Record one vote",
        after_help = "EXAMPLES:\n    ballot vote 375"
    )]
    Vote(cmd::vote::VoteArgs),

    #[command(
        next_help_heading = "Votes",
        about = "Show vote totals",
        after_help = "EXAMPLES:\n    # Every item in id order\n    ballot results\n\n    # Hall of fame\n    ballot results --top 10 --json"
    )]
    Results(cmd::results::ResultsArgs),

    #[command(next_help_heading = "Votes", about = "Show recent vote events")]
    Log(cmd::log::LogArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Recompute vote counters from the event log"
    )]
    Rebuild(cmd::rebuild::RebuildArgs),

    #[command(
        next_help_heading = "Service",
        about = "Run the HTTP service",
        after_help = "EXAMPLES:\n    # Listen on the configured address\n    ballot serve\n\n    # Throwaway instance\n    ballot serve --bind 127.0.0.1:8080 --ephemeral"
    )]
    Serve(cmd::serve::ServeArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    ballot completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("BALLOT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "ballot=debug,info"
        } else {
            "ballot=info,warn"
        })
    });

    let format = env::var("BALLOT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let ctx = cli.context()?;

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &ctx),
        Commands::Add(ref args) => cmd::add::run_add(args, &ctx),
        Commands::Import(ref args) => cmd::import::run_import(args, &ctx),
        Commands::List(ref args) => cmd::list::run_list(args, &ctx),
        Commands::Vote(ref args) => cmd::vote::run_vote(args, &ctx),
        Commands::Results(ref args) => cmd::results::run_results(args, &ctx),
        Commands::Log(ref args) => cmd::log::run_log(args, &ctx),
        Commands::Rebuild(ref args) => cmd::rebuild::run_rebuild(args, &ctx),
        Commands::Serve(ref args) => cmd::serve::run_serve(args, &ctx),
        Commands::Completions(ref args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = cli.output_mode();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            if let Err(render_err) = render_error(output, &CliError::from(&err)) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}
