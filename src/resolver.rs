//! Hostname to candidate-address resolution.
//!
//! Lookups go through the [`AddressLookup`] trait: [`SystemLookup`] asks the
//! operating system resolver (hosts file, search domains, and so on), while
//! [`DnsLookup`] talks DNS directly through `trust-dns-resolver`. Either way,
//! [`resolve`] returns a duplicate-free list in discovery order and never fails.

use crate::error::ResolveError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use trust_dns_resolver::config::{LookupIpStrategy, ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Something that can turn a hostname into addresses.
#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// Look up all IPv4 and IPv6 addresses for `host`.
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError>;
}

/// Which [`AddressLookup`] implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// The operating system resolver.
    #[default]
    System,
    /// Direct DNS queries.
    Dns,
}

impl ResolverKind {
    /// Build the lookup implementation for this kind.
    pub fn build(self) -> Arc<dyn AddressLookup> {
        match self {
            Self::System => Arc::new(SystemLookup),
            Self::Dns => Arc::new(DnsLookup::new()),
        }
    }
}

/// Lookup via the operating system (`getaddrinfo` on the blocking pool).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

#[async_trait]
impl AddressLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let addrs = tokio::net::lookup_host((host, 0u16))
            .await
            .map_err(|e| ResolveError::Lookup {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Lookup via DNS, asking for both A and AAAA records.
pub struct DnsLookup {
    resolver: TokioAsyncResolver,
}

impl DnsLookup {
    /// Create a resolver using the default upstream configuration.
    pub fn new() -> Self {
        let mut opts = ResolverOpts::default();
        opts.ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }
}

impl Default for DnsLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AddressLookup for DnsLookup {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>, ResolveError> {
        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| ResolveError::Lookup {
                host: host.to_string(),
                reason: e.to_string(),
            })?;

        let ips: Vec<IpAddr> = response.iter().collect();
        if ips.is_empty() {
            return Err(ResolveError::NoAddresses(host.to_string()));
        }
        Ok(ips)
    }
}

/// Expand a target into candidate addresses.
///
/// A literal IP is returned as the only candidate without touching `lookup`.
/// Resolution failures yield an empty list.
pub async fn resolve(lookup: &dyn AddressLookup, target: &str) -> Vec<IpAddr> {
    let target = target.trim();
    if let Ok(ip) = target.parse::<IpAddr>() {
        return vec![ip];
    }

    match lookup.lookup(target).await {
        Ok(ips) => {
            let mut seen = HashSet::new();
            let candidates: Vec<IpAddr> = ips.into_iter().filter(|ip| seen.insert(*ip)).collect();
            tracing::debug!(host = target, count = candidates.len(), "resolved candidates");
            candidates
        }
        Err(e) => {
            tracing::debug!(host = target, error = %e, "resolution failed, no candidates");
            Vec::new()
        }
    }
}
