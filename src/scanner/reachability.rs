//! Single-target reachability checks.
//!
//! The literal target is tried first on each candidate port, letting the connect call
//! do its own resolution. Only when that fails for a hostname are the resolved
//! addresses tried one by one, which catches names whose first address is dead but a
//! secondary one answers. Everything is serial and stops at the first success.

use crate::resolver::{self, AddressLookup};
use crate::scanner::traits::Prober;
use crate::types::{is_ip_literal, Port};
use serde::Serialize;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Ports tried by `ping` when the user names none.
pub const DEFAULT_PING_PORTS: &[u16] = &[80, 443, 53, 22];

/// Default per-probe timeout for reachability checks.
pub const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Final verdict of a reachability check.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReachabilityOutcome {
    /// A connection succeeded.
    Reached {
        target: String,
        /// The address that answered: the literal target or a resolved candidate.
        address: String,
        port: Port,
        latency_ms: f64,
    },
    /// Nothing answered on any port.
    Unreached {
        target: String,
        attempted_ports: Vec<Port>,
        /// Resolved addresses that were retried, empty for literal IPs.
        candidates: Vec<IpAddr>,
    },
}

impl ReachabilityOutcome {
    pub fn is_reached(&self) -> bool {
        matches!(self, Self::Reached { .. })
    }
}

/// Orchestrates probes and lookups for `ping`.
#[derive(Clone)]
pub struct ReachabilityChecker {
    prober: Arc<dyn Prober>,
    lookup: Arc<dyn AddressLookup>,
    default_ports: Vec<Port>,
    timeout: Duration,
}

impl ReachabilityChecker {
    /// Create a checker with the default port list and timeout.
    pub fn new(prober: Arc<dyn Prober>, lookup: Arc<dyn AddressLookup>) -> Self {
        Self {
            prober,
            lookup,
            default_ports: DEFAULT_PING_PORTS
                .iter()
                .filter_map(|&p| Port::new(p))
                .collect(),
            timeout: DEFAULT_PING_TIMEOUT,
        }
    }

    /// Replace the ports tried when no explicit port is given.
    pub fn with_default_ports(mut self, ports: Vec<Port>) -> Self {
        self.default_ports = ports;
        self
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Check whether `target` accepts TCP connections.
    pub async fn check(&self, target: &str, explicit_port: Option<Port>) -> ReachabilityOutcome {
        let target = target.trim();
        let ports = match explicit_port {
            Some(port) => vec![port],
            None => self.default_ports.clone(),
        };

        if let Some(outcome) = self.try_ports(target, target, &ports).await {
            return outcome;
        }

        let mut candidates = Vec::new();
        if !is_ip_literal(target) {
            candidates = resolver::resolve(self.lookup.as_ref(), target).await;
            for candidate in &candidates {
                let address = candidate.to_string();
                if let Some(outcome) = self.try_ports(target, &address, &ports).await {
                    return outcome;
                }
            }
        }

        debug!(host = target, ports = ?ports, candidates = candidates.len(), "target unreachable");
        ReachabilityOutcome::Unreached {
            target: target.to_string(),
            attempted_ports: ports,
            candidates,
        }
    }

    /// Probe `address` on each port in order, returning on the first success.
    async fn try_ports(
        &self,
        target: &str,
        address: &str,
        ports: &[Port],
    ) -> Option<ReachabilityOutcome> {
        for &port in ports {
            let result = self.prober.probe(address, port, self.timeout).await;
            if let Some(latency_ms) = result.latency_ms() {
                debug!(host = target, address, %port, latency_ms, "target reachable");
                return Some(ReachabilityOutcome::Reached {
                    target: target.to_string(),
                    address: address.to_string(),
                    port,
                    latency_ms,
                });
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::resolver::tests::StaticLookup;
    use crate::resolver::SystemLookup;
    use crate::scanner::tests::MockProber;
    use crate::scanner::{ProbeResult, TcpProber};
    use tokio::net::TcpListener;

    fn ports(raw: &[u16]) -> Vec<Port> {
        Port::list(raw).unwrap()
    }

    fn checker(prober: Arc<MockProber>, lookup: Arc<StaticLookup>) -> ReachabilityChecker {
        ReachabilityChecker::new(prober, lookup)
    }

    #[tokio::test]
    async fn test_short_circuits_on_first_open_port() {
        let prober = Arc::new(MockProber::new(&[443, 22]));
        let lookup = Arc::new(StaticLookup::new(Some(vec!["10.0.0.9".parse().unwrap()])));

        let outcome = checker(prober.clone(), lookup.clone())
            .check("example.com", None)
            .await;

        assert!(matches!(
            outcome,
            ReachabilityOutcome::Reached { ref address, port, .. }
                if address == "example.com" && port.as_u16() == 443
        ));
        let calls: Vec<u16> = prober.calls().into_iter().map(|(_, p)| p).collect();
        assert_eq!(calls, vec![80, 443]);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_explicit_port_only() {
        let prober = Arc::new(MockProber::new(&[]));
        let lookup = Arc::new(StaticLookup::new(None));

        let outcome = checker(prober.clone(), lookup)
            .check("10.1.2.3", Port::new(8443))
            .await;

        assert_eq!(
            outcome,
            ReachabilityOutcome::Unreached {
                target: "10.1.2.3".to_string(),
                attempted_ports: ports(&[8443]),
                candidates: vec![],
            }
        );
        assert_eq!(prober.calls(), vec![("10.1.2.3".to_string(), 8443)]);
    }

    #[tokio::test]
    async fn test_literal_ip_is_never_resolved() {
        let prober = Arc::new(MockProber::new(&[]));
        let lookup = Arc::new(StaticLookup::new(Some(vec!["10.0.0.9".parse().unwrap()])));

        let outcome = checker(prober.clone(), lookup.clone())
            .check("192.0.2.1", None)
            .await;

        assert!(!outcome.is_reached());
        assert_eq!(prober.calls().len(), DEFAULT_PING_PORTS.len());
        assert_eq!(lookup.calls(), 0);
    }

    /// Prober that only answers on one resolved address.
    struct OnlyAddress {
        inner: MockProber,
        address: &'static str,
    }

    #[async_trait::async_trait]
    impl Prober for OnlyAddress {
        async fn probe(&self, host: &str, port: Port, timeout: Duration) -> ProbeResult {
            let result = self.inner.probe(host, port, timeout).await;
            if host == self.address {
                result
            } else {
                ProbeResult::failed(host, port, &ProbeError::Timeout)
            }
        }
    }

    #[tokio::test]
    async fn test_falls_back_to_resolved_candidates() {
        let prober = Arc::new(OnlyAddress {
            inner: MockProber::new(&[53]),
            address: "198.51.100.7",
        });
        let lookup = Arc::new(StaticLookup::new(Some(vec![
            "198.51.100.6".parse().unwrap(),
            "198.51.100.7".parse().unwrap(),
            "198.51.100.6".parse().unwrap(),
        ])));

        let outcome = ReachabilityChecker::new(prober.clone(), lookup.clone())
            .check("flaky.example", None)
            .await;

        assert!(matches!(
            outcome,
            ReachabilityOutcome::Reached { ref address, port, .. }
                if address == "198.51.100.7" && port.as_u16() == 53
        ));
        assert_eq!(lookup.calls(), 1);

        let calls = prober.inner.calls();
        // 4 literal attempts, 4 on the first candidate, then 80 and 443 fail and 53 wins.
        assert_eq!(calls.len(), 4 + 4 + 3);
        assert!(calls[..4].iter().all(|(h, _)| h == "flaky.example"));
        assert!(calls[4..8].iter().all(|(h, _)| h == "198.51.100.6"));
        assert_eq!(calls.last().unwrap(), &("198.51.100.7".to_string(), 53));
    }

    #[tokio::test]
    async fn test_unreached_reports_candidates() {
        let prober = Arc::new(MockProber::new(&[]));
        let lookup = Arc::new(StaticLookup::new(Some(vec!["203.0.113.5".parse().unwrap()])));

        let outcome = checker(prober, lookup).check("dead.example", Port::new(25)).await;

        assert_eq!(
            outcome,
            ReachabilityOutcome::Unreached {
                target: "dead.example".to_string(),
                attempted_ports: ports(&[25]),
                candidates: vec!["203.0.113.5".parse().unwrap()],
            }
        );
    }

    #[tokio::test]
    async fn test_reaches_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();

        let outcome = ReachabilityChecker::new(Arc::new(TcpProber::new()), Arc::new(SystemLookup))
            .check("127.0.0.1", Some(port))
            .await;

        match outcome {
            ReachabilityOutcome::Reached {
                address,
                port: reached,
                latency_ms,
                ..
            } => {
                assert_eq!(address, "127.0.0.1");
                assert_eq!(reached, port);
                assert!(latency_ms >= 0.0);
            }
            other => panic!("expected reached, got {:?}", other),
        }
    }

    /// Prober on which every connect attempt times out.
    struct SilentNetwork {
        calls: std::sync::Mutex<Vec<u16>>,
    }

    #[async_trait::async_trait]
    impl Prober for SilentNetwork {
        async fn probe(&self, host: &str, port: Port, _timeout: Duration) -> ProbeResult {
            self.calls.lock().unwrap().push(port.as_u16());
            ProbeResult::failed(host, port, &ProbeError::Timeout)
        }
    }

    #[tokio::test]
    async fn test_silent_address_is_unreached_on_default_ports() {
        let prober = Arc::new(SilentNetwork {
            calls: std::sync::Mutex::new(Vec::new()),
        });
        let lookup = Arc::new(StaticLookup::new(None));

        let outcome = ReachabilityChecker::new(prober.clone(), lookup.clone())
            .check("10.255.255.1", None)
            .await;

        assert_eq!(
            outcome,
            ReachabilityOutcome::Unreached {
                target: "10.255.255.1".to_string(),
                attempted_ports: ports(&[80, 443, 53, 22]),
                candidates: vec![],
            }
        );
        assert_eq!(*prober.calls.lock().unwrap(), vec![80, 443, 53, 22]);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    #[ignore = "needs a network that silently drops traffic to 10.255.255.1"]
    async fn test_unroutable_address_is_unreached() {
        let outcome = ReachabilityChecker::new(Arc::new(TcpProber::new()), Arc::new(SystemLookup))
            .with_timeout(Duration::from_millis(200))
            .check("10.255.255.1", None)
            .await;

        assert_eq!(
            outcome,
            ReachabilityOutcome::Unreached {
                target: "10.255.255.1".to_string(),
                attempted_ports: ports(&[80, 443, 53, 22]),
                candidates: vec![],
            }
        );
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = ReachabilityOutcome::Reached {
            target: "example.com".into(),
            address: "example.com".into(),
            port: Port::new(443).unwrap(),
            latency_ms: 12.5,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "reached");
        assert_eq!(json["port"], 443);
    }
}
