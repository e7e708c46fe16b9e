//! TCP connect probe.
//!
//! Completes a full TCP handshake through the operating system's socket API and
//! closes the connection straight away. No application data is exchanged.

use crate::error::ProbeError;
use crate::scanner::traits::{ProbeResult, Prober};
use crate::types::Port;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// TCP connect prober.
///
/// Does not require elevated privileges. Hostnames are resolved by tokio on its
/// blocking pool as part of the connect, once per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProber;

impl TcpProber {
    pub fn new() -> Self {
        Self
    }

    /// Attempt to connect to `host:port`.
    async fn attempt_connect(
        host: &str,
        port: u16,
        limit: Duration,
    ) -> Result<TcpStream, ProbeError> {
        match timeout(limit, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(e)) => Err(ProbeError::from_connect_error(&e)),
            Err(_) => Err(ProbeError::Timeout),
        }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, host: &str, port: Port, limit: Duration) -> ProbeResult {
        let start = Instant::now();

        match Self::attempt_connect(host, port.as_u16(), limit).await {
            Ok(stream) => {
                let latency = start.elapsed();
                let peer = stream.peer_addr().ok();
                drop(stream);

                debug!(host, %port, latency_ms = latency.as_secs_f64() * 1000.0, "probe open");
                ProbeResult::open(host, port, latency, peer)
            }
            Err(e) => {
                debug!(host, %port, error = %e, "probe failed");
                ProbeResult::failed(host, port, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ProbeStatus;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_probe_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let result = TcpProber::new()
            .probe("127.0.0.1", port, Duration::from_secs(2))
            .await;

        assert!(result.is_open());
        assert!(result.latency_ms().unwrap() >= 0.0);
        assert_eq!(result.peer(), Some(listener.local_addr().unwrap()));
    }

    #[tokio::test]
    async fn test_probe_closed_port() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        drop(listener);

        let limit = Duration::from_millis(500);
        let start = Instant::now();
        let result = TcpProber::new().probe("127.0.0.1", port, limit).await;

        assert!(!result.is_open());
        assert!(result.latency_ms().is_none());
        assert!(matches!(
            result.status(),
            ProbeStatus::Closed | ProbeStatus::Filtered
        ));
        assert!(start.elapsed() < limit + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_probe_hostname() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let result = TcpProber::new()
            .probe("localhost", port, Duration::from_secs(2))
            .await;

        // localhost may resolve to ::1 first; either way the call must not fail loudly.
        if result.is_open() {
            assert!(result.peer().unwrap().ip().is_loopback());
        } else {
            assert!(result.error().is_some());
        }
    }

    #[tokio::test]
    async fn test_probe_unresolvable_host() {
        let result = TcpProber::new()
            .probe("name.invalid", Port::new(80).unwrap(), Duration::from_secs(3))
            .await;

        assert!(!result.is_open());
        assert!(result.latency_ms().is_none());
        assert!(result.error().is_some());
    }
}
