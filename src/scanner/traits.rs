//! Probe trait abstraction.
//!
//! Defines the probe result model and the [`Prober`] interface shared by the scan
//! coordinator and the reachability checker, so both can be driven by mocks in tests.

use crate::error::ProbeError;
use crate::types::Port;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

/// Outcome class of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    /// The connection was established.
    Open,
    /// The peer actively refused the connection.
    Closed,
    /// No answer within the timeout, or the host/network was unreachable.
    Filtered,
    /// Anything else, including an unresolvable host.
    Failed,
}

impl From<&ProbeError> for ProbeStatus {
    fn from(err: &ProbeError) -> Self {
        match err {
            ProbeError::ConnectionRefused => Self::Closed,
            ProbeError::Timeout
            | ProbeError::HostUnreachable
            | ProbeError::NetworkUnreachable(_) => Self::Filtered,
            ProbeError::Resolution(_) | ProbeError::ConnectionFailed(_) => Self::Failed,
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Filtered => write!(f, "filtered"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Result of probing one (address, port) pair.
///
/// Fields are private so that a latency can only exist on an open result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    address: String,
    port: Port,
    status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer: Option<SocketAddr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ProbeResult {
    /// A successful connect.
    pub fn open(
        address: impl Into<String>,
        port: Port,
        latency: Duration,
        peer: Option<SocketAddr>,
    ) -> Self {
        Self {
            address: address.into(),
            port,
            status: ProbeStatus::Open,
            latency_ms: Some(latency.as_secs_f64() * 1000.0),
            peer,
            error: None,
        }
    }

    /// A failed connect.
    pub fn failed(address: impl Into<String>, port: Port, error: &ProbeError) -> Self {
        Self {
            address: address.into(),
            port,
            status: ProbeStatus::from(error),
            latency_ms: None,
            peer: None,
            error: Some(error.to_string()),
        }
    }

    /// The address (or hostname) the probe connected to.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn status(&self) -> ProbeStatus {
        self.status
    }

    /// Connect latency in milliseconds; `Some` only for open results.
    pub fn latency_ms(&self) -> Option<f64> {
        self.latency_ms
    }

    /// The socket address the connection was actually made to.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.status == ProbeStatus::Open
    }
}

/// Trait for single-connection reachability probes.
///
/// Implementations must never fail: every error is encoded in the returned
/// [`ProbeResult`].
#[async_trait]
pub trait Prober: Send + Sync {
    /// Attempt one connection to `host:port` within `timeout`.
    ///
    /// `host` may be a literal address or a hostname; hostnames are resolved as part
    /// of the attempt and count against the same timeout.
    async fn probe(&self, host: &str, port: Port, timeout: Duration) -> ProbeResult;
}
