use anyhow::Result;
use clap::Args;
use clap_complete::{Shell, generate};

/// Arguments for `ballot completions`.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Print the `ballot` completion script for `shell`.
///
/// # Errors
///
/// Returns an error if stdout cannot be written.
pub fn run_completions(shell: Shell, command: &mut clap::Command) -> Result<()> {
    let mut out = std::io::stdout();
    generate(shell, command, "ballot", &mut out);
    Ok(())
}
