//! Two-hop WHOIS client.
//!
//! The IANA root server is asked first; its `whois:` referral line names the
//! registry that holds the full record, which is then queried with the same line.
//! Both hops are plain TCP on port 43: send the query and CRLF, read until the
//! server closes.
//!
//! Socket work is blocking and runs on tokio's blocking pool, so a slow registry
//! never stalls the caller's event loop. [`WhoisClient::lookup`] never fails; errors
//! come back as [`WhoisOutcome::Failed`].

use crate::error::WhoisError;
use serde::Serialize;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Standard WHOIS port.
pub const WHOIS_PORT: u16 = 43;

/// Root server that hands out referrals.
pub const ROOT_SERVER: &str = "whois.iana.org";

/// Server queried when the root response carries no referral.
pub const FALLBACK_SERVER: &str = "whois.arin.net";

/// Default timeout for connecting, writing and each read.
pub const DEFAULT_WHOIS_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on a single server response.
const MAX_RESPONSE_BYTES: u64 = 1024 * 1024;

/// One blocking request/response exchange with a WHOIS server.
pub trait WhoisTransport: Send + Sync {
    /// Send `query` to `server` and return every byte received until close.
    fn query(&self, server: &str, query: &str, timeout: Duration) -> Result<Vec<u8>, WhoisError>;
}

/// TCP transport used in production.
#[derive(Debug, Clone, Copy)]
pub struct TcpTransport {
    port: u16,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self { port: WHOIS_PORT }
    }

    /// Talk to servers on a non-standard port.
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }

    fn connect(&self, server: &str, timeout: Duration) -> Result<TcpStream, WhoisError> {
        let addrs: Vec<_> = (server, self.port)
            .to_socket_addrs()
            .map_err(|source| WhoisError::Resolve {
                server: server.to_string(),
                source,
            })?
            .collect();

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(server, %addr, error = %e, "WHOIS connect attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(match last_error {
            Some(e) if e.kind() == std::io::ErrorKind::TimedOut => WhoisError::Timeout {
                server: server.to_string(),
            },
            Some(source) => WhoisError::Connect {
                server: server.to_string(),
                source,
            },
            None => WhoisError::Resolve {
                server: server.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses"),
            },
        })
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisTransport for TcpTransport {
    fn query(&self, server: &str, query: &str, timeout: Duration) -> Result<Vec<u8>, WhoisError> {
        let mut stream = self.connect(server, timeout)?;
        let io_err = |e: std::io::Error| WhoisError::io(server, e);

        stream.set_read_timeout(Some(timeout)).map_err(io_err)?;
        stream.set_write_timeout(Some(timeout)).map_err(io_err)?;
        stream
            .write_all(format!("{}\r\n", query).as_bytes())
            .map_err(io_err)?;

        let mut response = Vec::new();
        stream
            .take(MAX_RESPONSE_BYTES)
            .read_to_end(&mut response)
            .map_err(io_err)?;
        Ok(response)
    }
}

/// A WHOIS answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WhoisRecord {
    pub domain: String,
    /// The server that produced `text`.
    pub server: String,
    pub text: String,
}

/// Result of a lookup; failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WhoisOutcome {
    Found(WhoisRecord),
    Failed {
        domain: String,
        kind: &'static str,
        message: String,
    },
}

impl WhoisOutcome {
    fn failed(domain: &str, err: &WhoisError) -> Self {
        Self::Failed {
            domain: domain.to_string(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            Self::Found(record) => &record.domain,
            Self::Failed { domain, .. } => domain,
        }
    }

    /// Text to show the user: the record, or a description of the failure.
    pub fn text(&self) -> String {
        match self {
            Self::Found(record) => record.text.clone(),
            Self::Failed { kind, message, .. } => {
                format!("WHOIS lookup failed ({}): {}", kind, message)
            }
        }
    }
}

/// Client for the IANA referral chain.
#[derive(Clone)]
pub struct WhoisClient {
    transport: Arc<dyn WhoisTransport>,
    root_server: String,
    fallback_server: String,
    timeout: Duration,
}

impl WhoisClient {
    /// Client using TCP, the IANA root and the default fallback.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(TcpTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn WhoisTransport>) -> Self {
        Self {
            transport,
            root_server: ROOT_SERVER.to_string(),
            fallback_server: FALLBACK_SERVER.to_string(),
            timeout: DEFAULT_WHOIS_TIMEOUT,
        }
    }

    pub fn with_root_server(mut self, server: impl Into<String>) -> Self {
        self.root_server = server.into();
        self
    }

    pub fn with_fallback_server(mut self, server: impl Into<String>) -> Self {
        self.fallback_server = server.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Look up `domain` on the blocking pool.
    pub async fn lookup(&self, domain: &str) -> WhoisOutcome {
        let domain = domain.trim().to_string();
        let client = self.clone();
        let query = domain.clone();

        match tokio::task::spawn_blocking(move || client.lookup_blocking(&query)).await {
            Ok(Ok(record)) => WhoisOutcome::Found(record),
            Ok(Err(e)) => {
                warn!(domain = %domain, kind = e.kind(), error = %e, "WHOIS lookup failed");
                WhoisOutcome::failed(&domain, &e)
            }
            Err(join_err) => {
                let e = WhoisError::Worker(join_err.to_string());
                warn!(domain = %domain, error = %e, "WHOIS worker did not complete");
                WhoisOutcome::failed(&domain, &e)
            }
        }
    }

    /// Both hops, blocking the current thread.
    pub fn lookup_blocking(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        let root = self.transport.query(&self.root_server, domain, self.timeout)?;
        let root_text = String::from_utf8_lossy(&root);

        let server = match find_referral(&root_text) {
            Some(server) => server.to_string(),
            None => {
                debug!(domain, fallback = %self.fallback_server, "no referral, using fallback");
                self.fallback_server.clone()
            }
        };

        debug!(domain, %server, "querying authoritative WHOIS server");
        let answer = self.transport.query(&server, domain, self.timeout)?;

        Ok(WhoisRecord {
            domain: domain.to_string(),
            server,
            text: String::from_utf8_lossy(&answer).into_owned(),
        })
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the server named by the first `whois:` line, matched case-insensitively.
pub fn find_referral(text: &str) -> Option<&str> {
    const KEY: &str = "whois:";

    text.lines().find_map(|line| {
        let line = line.trim_start();
        let head = line.get(..KEY.len())?;
        if !head.eq_ignore_ascii_case(KEY) {
            return None;
        }
        let server = line[KEY.len()..].trim();
        (!server.is_empty()).then_some(server)
    })
}
