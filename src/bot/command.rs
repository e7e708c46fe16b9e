//! Chat command parsing.

use crate::error::CommandError;
use crate::types::{Port, Target};
use std::fmt;

/// Help table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub summary: &'static str,
}

/// Every command the bot understands, in help order.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "ping",
        usage: "ping <host> [port]",
        summary: "check whether a host accepts TCP connections",
    },
    CommandSpec {
        name: "homeports",
        usage: "homeports <host>",
        summary: "scan a host for common open ports",
    },
    CommandSpec {
        name: "whois",
        usage: "whois <domain>",
        summary: "look up domain registration details",
    },
    CommandSpec {
        name: "help",
        usage: "help",
        summary: "show this message",
    },
];

/// A validated chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ping { target: Target, port: Option<Port> },
    HomePorts { target: Target },
    Whois { domain: String },
    Help,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ping { .. } => "ping",
            Self::HomePorts { .. } => "homeports",
            Self::Whois { .. } => "whois",
            Self::Help => "help",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping { target, port: None } => write!(f, "ping {}", target),
            Self::Ping {
                target,
                port: Some(port),
            } => write!(f, "ping {} {}", target, port),
            Self::HomePorts { target } => write!(f, "homeports {}", target),
            Self::Whois { domain } => write!(f, "whois {}", domain),
            Self::Help => write!(f, "help"),
        }
    }
}

/// Parse a chat message.
///
/// Returns `None` for messages that are not addressed to the bot (no prefix, or the
/// prefix alone), and `Some(Err(_))` for malformed commands that deserve a reply.
pub fn parse(prefix: &str, message: &str) -> Option<Result<Command, CommandError>> {
    let body = message.trim().strip_prefix(prefix)?;
    let mut words = body.split_whitespace();
    let name = words.next()?.to_ascii_lowercase();
    let args: Vec<&str> = words.collect();

    Some(parse_args(&name, &args))
}

fn parse_args(name: &str, args: &[&str]) -> Result<Command, CommandError> {
    match name {
        "ping" => {
            let (target, port) = match args {
                [] => return Err(missing("ping", "host")),
                [host] => (*host, None),
                [host, port] => (*host, Some(port.parse::<Port>()?)),
                _ => return Err(CommandError::TooManyArguments("ping")),
            };
            Ok(Command::Ping {
                target: Target::parse(target)?,
                port,
            })
        }
        "homeports" => match args {
            [] => Err(missing("homeports", "host")),
            [host] => Ok(Command::HomePorts {
                target: Target::parse(host)?,
            }),
            _ => Err(CommandError::TooManyArguments("homeports")),
        },
        "whois" => match args {
            [] => Err(missing("whois", "domain")),
            [domain] => Ok(Command::Whois {
                domain: Target::parse(domain)?.host(),
            }),
            _ => Err(CommandError::TooManyArguments("whois")),
        },
        "help" => Ok(Command::Help),
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

fn missing(command: &'static str, argument: &'static str) -> CommandError {
    CommandError::MissingArgument { command, argument }
}
