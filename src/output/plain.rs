//! Plain text output formatting.
//!
//! Produces human-readable terminal output with colors.

use crate::scanner::{ProbeStatus, ReachabilityOutcome, ScanReport};
use crate::services::service_name;
use crate::whois::WhoisOutcome;
use console::{style, Style};
use std::io::{self, Write};

const RULE: &str = "───────────────────────────────────────────────────────────────";

/// Print the verdict of a reachability check.
pub fn print_reachability(outcome: &ReachabilityOutcome) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match outcome {
        ReachabilityOutcome::Reached {
            target,
            address,
            port,
            latency_ms,
        } => {
            writeln!(
                out,
                "{} {} is reachable on port {} ({})",
                style("✓").green().bold(),
                style(target).white().bold(),
                style(port).green().bold(),
                service_name(port.as_u16())
            )?;
            if address != target {
                writeln!(out, "  {} {}", style("Address:").bold(), address)?;
            }
            writeln!(out, "  {} {:.1} ms", style("Latency:").bold(), latency_ms)?;
        }
        ReachabilityOutcome::Unreached {
            target,
            attempted_ports,
            candidates,
        } => {
            let ports: Vec<String> = attempted_ports.iter().map(|p| p.to_string()).collect();
            writeln!(
                out,
                "{} {} is not reachable",
                style("✗").red().bold(),
                style(target).white().bold()
            )?;
            writeln!(out, "  {} {}", style("Ports tried:").bold(), ports.join(", "))?;
            if !candidates.is_empty() {
                let addrs: Vec<String> = candidates.iter().map(|a| a.to_string()).collect();
                writeln!(out, "  {} {}", style("Addresses tried:").bold(), addrs.join(", "))?;
            }
        }
    }

    Ok(())
}

/// Print a port scan report. Closed and filtered ports are hidden unless `show_closed`.
pub fn print_scan(report: &ScanReport, show_closed: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out)?;
    writeln!(out, "  {} {}", style("Target:").bold(), report.host)?;
    writeln!(
        out,
        "  {} {} ports scanned in {:.2}s, {} open",
        style("Statistics:").bold(),
        report.results.len(),
        report.duration_ms as f64 / 1000.0,
        style(report.open_count()).green().bold()
    )?;
    writeln!(out)?;

    let shown: Vec<_> = report
        .results
        .iter()
        .filter(|r| show_closed || r.is_open())
        .collect();

    if shown.is_empty() {
        writeln!(out, "  {}", style("No open ports found.").dim())?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(
        out,
        "  {:>6}  {:^10}  {:<15}  {}",
        style("PORT").bold(),
        style("STATE").bold(),
        style("SERVICE").bold(),
        style("LATENCY").bold()
    )?;
    writeln!(out, "  {}", style(RULE).dim())?;

    for result in shown {
        let status_style = match result.status() {
            ProbeStatus::Open => Style::new().green().bold(),
            ProbeStatus::Closed => Style::new().red(),
            ProbeStatus::Filtered => Style::new().yellow(),
            ProbeStatus::Failed => Style::new().dim(),
        };
        let latency = result
            .latency_ms()
            .map(|ms| format!("{:.1} ms", ms))
            .unwrap_or_default();

        writeln!(
            out,
            "  {:>6}  {:^10}  {:<15}  {}",
            result.port(),
            status_style.apply_to(result.status().to_string()),
            service_name(result.port().as_u16()),
            style(latency).dim()
        )?;
    }

    writeln!(out, "  {}", style(RULE).dim())?;
    writeln!(out)?;
    Ok(())
}

/// Print a WHOIS record or the reason the lookup failed.
pub fn print_whois(outcome: &WhoisOutcome) -> io::Result<()> {
    match outcome {
        WhoisOutcome::Found(record) => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            writeln!(
                out,
                "{} {} {}",
                style("WHOIS").cyan().bold(),
                style(&record.domain).white().bold(),
                style(format!("(from {})", record.server)).dim()
            )?;
            writeln!(out, "{}", style(RULE).dim())?;
            writeln!(out, "{}", record.text.trim_end())?;
        }
        WhoisOutcome::Failed { .. } => print_error(&outcome.text()),
    }
    Ok(())
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
