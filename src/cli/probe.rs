//! One-shot probing subcommands.
//!
//! Handles `netprobe ping`, `netprobe homeports` and `netprobe whois`. Command-line
//! flags override the loaded settings.

use super::OutputMode;
use crate::config::Settings;
use crate::logging::Verbosity;
use crate::output;
use crate::scanner::{run_scan, ReachabilityChecker, ScanJob, TcpProber};
use crate::types::{Port, PortSpec, Target};
use crate::whois::{WhoisClient, WhoisOutcome};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Check whether a host accepts TCP connections.
#[derive(Parser, Debug)]
pub struct PingCommand {
    /// Host to check (IP address or hostname)
    #[arg(value_name = "HOST")]
    pub host: Target,

    /// Only try this port instead of the configured list
    #[arg(value_name = "PORT")]
    pub port: Option<Port>,

    /// Per-attempt timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,
}

impl PingCommand {
    pub async fn execute(&self, settings: &Settings, mode: OutputMode) -> anyhow::Result<()> {
        let timeout = self
            .timeout
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.ping_timeout());

        let lookup = settings.resolver.build();
        let checker = ReachabilityChecker::new(Arc::new(TcpProber::new()), lookup)
            .with_default_ports(settings.ping_ports()?)
            .with_timeout(timeout);

        if mode.chatty() {
            output::print_info(&format!("Pinging {}...", self.host));
        }

        let outcome = checker.check(&self.host.host(), self.port).await;

        if mode.json {
            output::print_json(&outcome)?;
        } else {
            output::print_reachability(&outcome)?;
        }
        Ok(())
    }
}

/// Scan a host for common open ports.
#[derive(Parser, Debug)]
pub struct HomeportsCommand {
    /// Host to scan (IP address or hostname)
    #[arg(value_name = "HOST")]
    pub host: Target,

    /// Ports to scan instead of the configured list (e.g. "22,80,8000-8010")
    #[arg(short, long)]
    pub ports: Option<PortSpec>,

    /// Maximum number of simultaneous connection attempts
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Per-port timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Show closed and filtered ports in output
    #[arg(long)]
    pub show_closed: bool,
}

impl HomeportsCommand {
    pub async fn execute(&self, settings: &Settings, mode: OutputMode) -> anyhow::Result<()> {
        let job = self.scan_job(settings, mode)?;

        if mode.chatty() {
            output::print_info(&format!(
                "Scanning {} ports on {}...",
                job.ports.len(),
                self.host
            ));
        }

        let report = run_scan(&TcpProber::new(), &self.host.host(), &job).await;

        if mode.json {
            output::print_json(&report)?;
        } else {
            output::print_scan(&report, self.show_closed)?;
        }
        Ok(())
    }

    /// Scan parameters from the flags, falling back to `settings`.
    fn scan_job(&self, settings: &Settings, mode: OutputMode) -> anyhow::Result<ScanJob> {
        let ports = match &self.ports {
            Some(spec) => spec.to_ports(),
            None => settings.scan_ports()?,
        };
        if ports.is_empty() {
            anyhow::bail!("no ports to scan");
        }

        let len = ports.len();
        let mut job = ScanJob::new(ports)
            .with_concurrency(self.concurrency.unwrap_or(settings.scan_concurrency))
            .with_timeout(
                self.timeout
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| settings.scan_timeout()),
            );

        if mode.verbosity == Verbosity::Verbose && !mode.json {
            job = job.with_progress(progress_bar(len));
        }
        Ok(job)
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("=>-"));
    }
    pb
}

/// Look up WHOIS registration data.
#[derive(Parser, Debug)]
pub struct WhoisCommand {
    /// Domain (or address) to look up
    #[arg(value_name = "DOMAIN")]
    pub domain: Target,

    /// Per-server timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,
}

impl WhoisCommand {
    pub async fn execute(&self, settings: &Settings, mode: OutputMode) -> anyhow::Result<()> {
        let client = WhoisClient::new()
            .with_root_server(settings.whois_root_server.as_str())
            .with_fallback_server(settings.whois_fallback_server.as_str())
            .with_timeout(
                self.timeout
                    .map(Duration::from_millis)
                    .unwrap_or_else(|| settings.whois_timeout()),
            );

        if mode.chatty() {
            output::print_info(&format!("Looking up WHOIS for {}...", self.domain));
        }

        let outcome = client.lookup(&self.domain.host()).await;

        if mode.json {
            output::print_json(&outcome)?;
        }
        match &outcome {
            WhoisOutcome::Failed { .. } => anyhow::bail!("{}", outcome.text()),
            WhoisOutcome::Found(_) if !mode.json => output::print_whois(&outcome)?,
            WhoisOutcome::Found(_) => {}
        }
        Ok(())
    }
}
