//! Target classification for user-supplied hosts.
//!
//! A target is either a literal IPv4/IPv6 address, which is probed as-is and never
//! resolved, or a hostname that may expand into several candidate addresses.

use serde::Serialize;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Error type for target parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid host or address: '{0}'")]
    InvalidFormat(String),
}

/// A validated probe target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Target {
    /// A literal IP address.
    Ip(IpAddr),
    /// A hostname to be resolved.
    Hostname(String),
}

impl Target {
    /// Parse a target from a string.
    ///
    /// IPv6 literals may be wrapped in brackets (`[::1]`), as users tend to paste them.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        let unbracketed = s
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(s);

        if let Ok(ip) = unbracketed.parse::<IpAddr>() {
            return Ok(Self::Ip(ip));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.trim_end_matches('.').to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// True when the target is a literal IP address.
    pub fn is_literal(&self) -> bool {
        matches!(self, Self::Ip(_))
    }

    /// The string handed to connect and lookup calls.
    pub fn host(&self) -> String {
        match self {
            Self::Ip(ip) => ip.to_string(),
            Self::Hostname(name) => name.clone(),
        }
    }
}

impl FromStr for Target {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// True when `s` parses as a literal IPv4 or IPv6 address.
pub fn is_ip_literal(s: &str) -> bool {
    s.trim().parse::<IpAddr>().is_ok()
}

/// Check if a string is a syntactically valid hostname (a trailing root dot is allowed).
fn is_valid_hostname(s: &str) -> bool {
    let s = s.strip_suffix('.').unwrap_or(s);
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.starts_with(|c: char| c.is_ascii_alphanumeric())
            && label.ends_with(|c: char| c.is_ascii_alphanumeric())
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4() {
        let target = Target::parse("192.168.1.1").unwrap();
        assert!(matches!(target, Target::Ip(IpAddr::V4(_))));
        assert!(target.is_literal());
    }

    #[test]
    fn test_parse_ipv6() {
        assert!(matches!(Target::parse("::1").unwrap(), Target::Ip(IpAddr::V6(_))));
        assert!(matches!(Target::parse("[::1]").unwrap(), Target::Ip(IpAddr::V6(_))));
    }

    #[test]
    fn test_parse_hostname() {
        let target = Target::parse("example.com.").unwrap();
        assert_eq!(target, Target::Hostname("example.com".to_string()));
        assert!(!target.is_literal());
        assert_eq!(target.host(), "example.com");
    }

    #[test]
    fn test_invalid_targets() {
        assert!(Target::parse("").is_err());
        assert!(Target::parse("-invalid.com").is_err());
        assert!(Target::parse("bad host").is_err());
        assert!(Target::parse("a..b").is_err());
        assert!(Target::parse("http://example.com").is_err());
    }

    #[test]
    fn test_is_ip_literal() {
        assert!(is_ip_literal("127.0.0.1"));
        assert!(is_ip_literal("2001:db8::1"));
        assert!(!is_ip_literal("localhost"));
        assert!(!is_ip_literal("10.0.0"));
    }
}
