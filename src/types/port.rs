//! Port types with validation and parsing.
//!
//! `Port` guarantees a connectable port number (1-65535). `PortSpec` parses
//! user-supplied lists such as `"22,80,8000-8010"` while keeping the order the
//! ports were written in, since scan output follows input order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Create a new Port from a u16, returning None for port 0.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port == 0 {
            None
        } else {
            Some(Self(port))
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Validate a list of raw port numbers, keeping their order.
    pub fn list(raw: &[u16]) -> Result<Vec<Port>, PortError> {
        raw.iter().map(|&p| Port::try_from(p)).collect()
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

impl FromStr for Port {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let raw: u16 = s
            .parse()
            .map_err(|_| PortError::InvalidFormat(s.to_string()))?;
        Port::try_from(raw)
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(u16),
    #[error("invalid port number: {0}")]
    InvalidFormat(String),
    #[error("invalid port range: start ({0}) > end ({1})")]
    InvalidRange(u16, u16),
    #[error("empty port specification")]
    Empty,
}

/// An ordered, duplicate-free list of ports parsed from a specification string.
///
/// Supports:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "8000-8010"
/// - Mixed: "22,80,443,8000-9000"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortSpec {
    ports: Vec<Port>,
}

impl PortSpec {
    /// All ports in first-seen order.
    pub fn to_ports(&self) -> Vec<Port> {
        self.ports.clone()
    }

    /// Number of unique ports.
    pub fn count(&self) -> usize {
        self.ports.len()
    }

    fn push_unique(&mut self, seen: &mut HashSet<Port>, port: Port) {
        if seen.insert(port) {
            self.ports.push(port);
        }
    }
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PortError::Empty);
        }

        let mut spec = Self::default();
        let mut seen = HashSet::new();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((start, end)) => {
                    let start: Port = start.parse()?;
                    let end: Port = end.parse()?;
                    if start > end {
                        return Err(PortError::InvalidRange(start.as_u16(), end.as_u16()));
                    }
                    for raw in start.as_u16()..=end.as_u16() {
                        spec.push_unique(&mut seen, Port(raw));
                    }
                }
                None => spec.push_unique(&mut seen, part.parse()?),
            }
        }

        if spec.ports.is_empty() {
            return Err(PortError::Empty);
        }

        Ok(spec)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ports.iter().map(|p| p.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}
