//! Bot subcommand implementation.
//!
//! Handles `netprobe bot`: serves chat commands typed on stdin and prints replies
//! on stdout until end of input.

use super::OutputMode;
use crate::bot::{self, CommandRegistry, ConsoleSink};
use crate::config::Settings;
use crate::output;
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

/// Run the chat bot on the console.
#[derive(Parser)]
pub struct BotCommand {
    /// Command prefix, overriding the configured one
    #[arg(long)]
    pub prefix: Option<String>,

    /// Channel name attached to console messages
    #[arg(long, default_value = "console")]
    pub channel: String,

    /// Chat platform token. Accepted for deployment compatibility; the console is
    /// the only transport, so the value is never used.
    #[arg(long, env = "DISCORD_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

impl std::fmt::Debug for BotCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotCommand")
            .field("prefix", &self.prefix)
            .field("channel", &self.channel)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl BotCommand {
    pub async fn execute(&self, mut settings: Settings, mode: OutputMode) -> anyhow::Result<()> {
        if let Some(prefix) = &self.prefix {
            settings.command_prefix = prefix.clone();
        }

        match self.token.as_deref() {
            Some(token) if !token.is_empty() => {
                info!("DISCORD_TOKEN accepted; serving on the console transport")
            }
            _ => warn!("DISCORD_TOKEN is not set; serving on the console transport"),
        }

        let registry = CommandRegistry::from_settings(&settings).context("invalid bot settings")?;

        if mode.chatty() {
            output::print_info(&format!(
                "Listening for commands on stdin (try {}help, Ctrl-D to quit)",
                registry.prefix()
            ));
        }
        info!(prefix = registry.prefix(), channel = %self.channel, "bot started");

        let inbound = bot::spawn_line_reader(
            BufReader::new(tokio::io::stdin()),
            self.channel.as_str(),
            whoami(),
        );
        let mut sink = ConsoleSink::new();
        bot::run_event_loop(inbound, &mut sink, Arc::new(registry))
            .await
            .context("console transport failed")?;

        if mode.chatty() {
            output::print_success("All commands answered, exiting");
        }
        Ok(())
    }
}

/// Author name for console messages.
fn whoami() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "console".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_redacted() {
        let cmd = BotCommand {
            prefix: None,
            channel: "console".into(),
            token: Some("super-secret".into()),
        };
        let debug = format!("{:?}", cmd);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_token_flag_is_accepted() {
        let cmd = BotCommand::try_parse_from(["bot", "--token", "abc", "--prefix", "?"]).unwrap();
        assert_eq!(cmd.token.as_deref(), Some("abc"));
        assert_eq!(cmd.prefix.as_deref(), Some("?"));
        assert_eq!(cmd.channel, "console");
    }
}
