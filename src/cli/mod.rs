//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `netprobe ping <host> [port]` - Check TCP reachability
//! - `netprobe homeports <host>` - Scan common ports
//! - `netprobe whois <domain>` - Look up registration data
//! - `netprobe bot` - Serve chat commands from the console

mod bot;
mod probe;

pub use bot::BotCommand;
pub use probe::{HomeportsCommand, PingCommand, WhoisCommand};

use crate::config::Settings;
use crate::logging::Verbosity;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// netprobe - network diagnostics for chat bots.
///
/// Runs the same reachability checks, port scans and WHOIS lookups that the chat
/// bot offers, either once from the shell or as a console bot reading commands
/// from stdin.
#[derive(Parser, Debug)]
#[command(name = "netprobe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat-bot network diagnostics", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether a host accepts TCP connections
    #[command(alias = "p")]
    Ping(PingCommand),

    /// Scan a host for common open ports
    #[command(alias = "scan")]
    Homeports(HomeportsCommand),

    /// Look up WHOIS registration data
    #[command(alias = "w")]
    Whois(WhoisCommand),

    /// Run the chat bot on the console
    Bot(BotCommand),
}

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub verbosity: Verbosity,
    pub json: bool,
}

impl OutputMode {
    /// True when human-oriented progress lines should be printed.
    pub fn chatty(&self) -> bool {
        !self.json && self.verbosity != Verbosity::Quiet
    }
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.verbose, self.quiet)
    }

    /// Load settings and run the selected subcommand.
    pub async fn run(self) -> anyhow::Result<()> {
        let settings = match &self.config {
            Some(path) => Settings::load(Some(path.as_path()))
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => Settings::load(None).context("failed to load settings")?,
        };
        let mode = OutputMode {
            verbosity: self.verbosity(),
            json: self.json,
        };

        match self.command {
            Commands::Ping(cmd) => cmd.execute(&settings, mode).await,
            Commands::Homeports(cmd) => cmd.execute(&settings, mode).await,
            Commands::Whois(cmd) => cmd.execute(&settings, mode).await,
            Commands::Bot(cmd) => cmd.execute(settings, mode).await,
        }
    }
}
