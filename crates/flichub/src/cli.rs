//! Clap derive structures for the `flichub` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// flichub -- inspect and watch a Flic hub from the command line
#[derive(Debug, Parser)]
#[command(
    name = "flichub",
    version,
    about = "Inspect and watch a Flic hub from the command line",
    long_about = "Connects to the server script running on a Flic hub, loads its\n\
        button roster and network state, and streams button activity.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Hub profile to use
    #[arg(long, short = 'H', env = "FLICHUB_HUB", global = true)]
    pub hub: Option<String>,

    /// Hub address (overrides profile)
    #[arg(long, env = "FLICHUB_HOST", global = true)]
    pub host: Option<String>,

    /// Hub server port (overrides profile)
    #[arg(long, env = "FLICHUB_PORT", global = true)]
    pub port: Option<u16>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FLICHUB_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Seconds to wait for the hub to become ready (overrides profile)
    #[arg(long, env = "FLICHUB_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the hub's buttons and network state once
    #[command(alias = "snap", alias = "s")]
    Snapshot(SnapshotArgs),

    /// Stream button activity until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Check that the hub reports the configured address
    Probe,

    /// Inspect CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SnapshotArgs {
    /// Only show buttons, skip network details
    #[arg(long)]
    pub buttons_only: bool,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Only show events for this serial number (repeatable)
    #[arg(long, short = 's')]
    pub serial: Vec<String>,

    /// Show click events only
    #[arg(long)]
    pub clicks_only: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the loaded configuration
    Show,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }
}
