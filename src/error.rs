//! Error types for netprobe.
//!
//! Uses `thiserror` for ergonomic error definitions. None of these escape the
//! probing subsystem as failures of a command: probes and WHOIS lookups turn them
//! into result values before handing anything to the formatter.

use crate::types::{PortError, TargetError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single TCP connect attempt did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("connection timed out")]
    Timeout,

    #[error("connection refused")]
    ConnectionRefused,

    #[error("host unreachable")]
    HostUnreachable,

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("address resolution failed: {0}")]
    Resolution(String),

    #[error("connection failed: {0}")]
    ConnectionFailed(String),
}

impl ProbeError {
    /// Classify an I/O error returned by a connect attempt.
    pub fn from_connect_error(err: &io::Error) -> Self {
        if err.kind() == io::ErrorKind::ConnectionRefused {
            return Self::ConnectionRefused;
        }
        if err.kind() == io::ErrorKind::TimedOut {
            return Self::Timeout;
        }

        let message = err.to_string();
        let lower = message.to_lowercase();
        if lower.contains("refused") {
            Self::ConnectionRefused
        } else if lower.contains("unreachable") {
            if lower.contains("host") {
                Self::HostUnreachable
            } else {
                Self::NetworkUnreachable(message)
            }
        } else if lower.contains("lookup address")
            || lower.contains("name or service not known")
            || lower.contains("nodename nor servname")
            || lower.contains("no such host")
        {
            Self::Resolution(message)
        } else {
            Self::ConnectionFailed(message)
        }
    }
}

/// Hostname lookup failures. Callers treat these as "zero candidates".
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("failed to resolve '{host}': {reason}")]
    Lookup { host: String, reason: String },

    #[error("no addresses found for '{0}'")]
    NoAddresses(String),
}

/// Failures on either hop of a WHOIS lookup.
#[derive(Error, Debug)]
pub enum WhoisError {
    #[error("could not resolve WHOIS server {server}: {source}")]
    Resolve {
        server: String,
        #[source]
        source: io::Error,
    },

    #[error("could not connect to WHOIS server {server}: {source}")]
    Connect {
        server: String,
        #[source]
        source: io::Error,
    },

    #[error("WHOIS server {server} timed out")]
    Timeout { server: String },

    #[error("I/O error talking to WHOIS server {server}: {source}")]
    Io {
        server: String,
        #[source]
        source: io::Error,
    },

    #[error("WHOIS worker failed: {0}")]
    Worker(String),
}

impl WhoisError {
    /// Short, stable name of the failure class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolve { .. } => "resolve",
            Self::Connect { .. } => "connect",
            Self::Timeout { .. } => "timeout",
            Self::Io { .. } => "io",
            Self::Worker(_) => "worker",
        }
    }

    /// Wrap a read/write error, folding socket timeouts into [`WhoisError::Timeout`].
    pub(crate) fn io(server: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::Timeout {
                server: server.to_string(),
            },
            _ => Self::Io {
                server: server.to_string(),
                source,
            },
        }
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine the configuration directory")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors produced while parsing a chat command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("missing argument <{argument}> for '{command}'")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("too many arguments for '{0}'")]
    TooManyArguments(&'static str),

    #[error(transparent)]
    InvalidPort(#[from] PortError),

    #[error(transparent)]
    InvalidTarget(#[from] TargetError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_refused() {
        let err = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(ProbeError::from_connect_error(&err), ProbeError::ConnectionRefused);
    }

    #[test]
    fn test_classify_unreachable() {
        let err = io::Error::new(io::ErrorKind::Other, "No route to host (host unreachable)");
        assert_eq!(ProbeError::from_connect_error(&err), ProbeError::HostUnreachable);

        let err = io::Error::new(io::ErrorKind::Other, "Network is unreachable");
        assert!(matches!(
            ProbeError::from_connect_error(&err),
            ProbeError::NetworkUnreachable(_)
        ));
    }

    #[test]
    fn test_classify_lookup_failure() {
        let err = io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: Name or service not known",
        );
        assert!(matches!(
            ProbeError::from_connect_error(&err),
            ProbeError::Resolution(_)
        ));
    }

    #[test]
    fn test_whois_error_kind() {
        let err = WhoisError::io("whois.iana.org", io::Error::from(io::ErrorKind::WouldBlock));
        assert_eq!(err.kind(), "timeout");

        let err = WhoisError::io("whois.iana.org", io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.kind(), "io");
    }
}
