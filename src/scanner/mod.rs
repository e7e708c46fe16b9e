//! Scanner module - probes, port scans and reachability checks.
//!
//! [`scan_ports`] fans TCP probes out over a port list with bounded concurrency,
//! while [`ReachabilityChecker`] probes serially and stops at the first success.

pub mod reachability;
pub mod tcp;
pub mod traits;

use crate::types::Port;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use indicatif::ProgressBar;
use serde::Serialize;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::debug;

pub use reachability::{ReachabilityChecker, ReachabilityOutcome};
pub use tcp::TcpProber;
pub use traits::{ProbeResult, ProbeStatus, Prober};

/// Ports probed by `homeports` unless configured otherwise: file transfer, remote
/// shells, mail, DNS, DHCP, web, Windows networking, SNMP, databases, RDP, VNC and
/// a couple of game servers.
pub const DEFAULT_SCAN_PORTS: &[u16] = &[
    20, 21, 22, 23, 25, 53, 67, 68, 80, 110, 123, 135, 137, 138, 139, 143, 161, 162, 443, 445,
    993, 995, 3306, 3389, 5432, 5900, 8080, 25565, 27015,
];

/// Default per-probe timeout for scans.
pub const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_millis(500);

/// Default number of simultaneous probes in a scan.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 8;

/// Parameters of a single scan.
#[derive(Clone)]
pub struct ScanJob {
    /// Ports to probe, in output order.
    pub ports: Vec<Port>,
    /// Maximum number of probes in flight.
    pub concurrency: usize,
    /// Per-probe timeout.
    pub timeout: Duration,
    /// Optional progress reporting for terminal use.
    pub progress: Option<ProgressBar>,
}

impl ScanJob {
    /// Create a job with the default concurrency and timeout.
    pub fn new(ports: Vec<Port>) -> Self {
        Self {
            ports,
            concurrency: DEFAULT_SCAN_CONCURRENCY,
            timeout: DEFAULT_SCAN_TIMEOUT,
            progress: None,
        }
    }

    /// Set the concurrency limit (at least 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-probe timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report progress on the given bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }
}

/// Complete results of scanning one host.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub host: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// One entry per requested port, in request order.
    pub results: Vec<ProbeResult>,
}

impl ScanReport {
    /// Number of open ports.
    pub fn open_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_open()).count()
    }

    /// Iterate over open results only.
    pub fn open(&self) -> impl Iterator<Item = &ProbeResult> {
        self.results.iter().filter(|r| r.is_open())
    }
}

/// Probe every port of `job` against `host`.
///
/// At most `job.concurrency` probes are outstanding at any time; waiting probes are
/// admitted in port-list order as permits free up. The returned vector has exactly
/// one result per port, in the order of `job.ports`.
pub async fn scan_ports<P>(prober: &P, host: &str, job: &ScanJob) -> Vec<ProbeResult>
where
    P: Prober + ?Sized,
{
    let semaphore = Semaphore::new(job.concurrency.max(1));

    let probes = job.ports.iter().map(|&port| {
        let semaphore = &semaphore;
        let progress = job.progress.as_ref();

        async move {
            // The semaphore is never closed, so acquire cannot fail.
            let _permit = semaphore.acquire().await.ok();

            let result = prober.probe(host, port, job.timeout).await;

            if let Some(pb) = progress {
                pb.inc(1);
                if result.is_open() {
                    pb.set_message(format!("open: {}", port));
                }
            }

            result
        }
    });

    join_all(probes).await
}

/// Run [`scan_ports`] and wrap the results in a timestamped [`ScanReport`].
pub async fn run_scan<P>(prober: &P, host: &str, job: &ScanJob) -> ScanReport
where
    P: Prober + ?Sized,
{
    let started_at = Utc::now();
    let start = Instant::now();

    let results = scan_ports(prober, host, job).await;

    if let Some(pb) = &job.progress {
        pb.finish_with_message("scan complete");
    }

    let report = ScanReport {
        host: host.to_string(),
        started_at,
        completed_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
        results,
    };
    debug!(
        host,
        ports = job.ports.len(),
        open = report.open_count(),
        duration_ms = report.duration_ms,
        "scan finished"
    );
    report
}
