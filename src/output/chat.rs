//! Chat message rendering.
//!
//! Every reply is split into messages no longer than the transport limit, counted in
//! characters. Tabular bodies go into fenced code blocks, and the fences count
//! against the limit too.

use crate::bot::CommandSpec;
use crate::error::CommandError;
use crate::scanner::{ProbeStatus, ReachabilityOutcome, ScanReport};
use crate::services::service_name;
use crate::types::Port;
use crate::whois::WhoisOutcome;
use std::fmt::Write;

const FENCE_OPEN: &str = "```\n";
const FENCE_CLOSE: &str = "\n```";

/// Renders command results as chat messages.
#[derive(Debug, Clone, Copy)]
pub struct ChatFormatter {
    limit: usize,
}

impl ChatFormatter {
    /// `limit` is the maximum number of characters per message.
    pub fn new(limit: usize) -> Self {
        let min = FENCE_OPEN.len() + FENCE_CLOSE.len() + 1;
        Self {
            limit: limit.max(min),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn reachability(&self, outcome: &ReachabilityOutcome) -> Vec<String> {
        let text = match outcome {
            ReachabilityOutcome::Reached {
                target,
                address,
                port,
                latency_ms,
            } => {
                let via = if address == target {
                    String::new()
                } else {
                    format!(" via {}", address)
                };
                format!(
                    "{} is reachable on port {} ({}){} in {:.1} ms!",
                    target,
                    port,
                    service_name(port.as_u16()),
                    via,
                    latency_ms
                )
            }
            ReachabilityOutcome::Unreached {
                target,
                attempted_ports,
                candidates,
            } => {
                let mut text = format!(
                    "{} is not reachable on {} {}.",
                    target,
                    if attempted_ports.len() == 1 { "port" } else { "ports" },
                    join_ports(attempted_ports)
                );
                if !candidates.is_empty() {
                    let _ = write!(
                        text,
                        " Also tried {} resolved address{}.",
                        candidates.len(),
                        if candidates.len() == 1 { "" } else { "es" }
                    );
                }
                text
            }
        };
        self.plain(&text)
    }

    pub fn scan(&self, report: &ScanReport) -> Vec<String> {
        let mut messages = self.plain(&format!(
            "Port scan results for {} ({} open of {}, {:.1}s):",
            report.host,
            report.open_count(),
            report.results.len(),
            report.duration_ms as f64 / 1000.0
        ));

        let mut body = String::new();
        for result in &report.results {
            let port = result.port().as_u16();
            let status = match result.status() {
                ProbeStatus::Open => "OPEN".to_string(),
                other => other.to_string(),
            };
            let _ = writeln!(body, "{:>5}  {:<14} {}", port, service_name(port), status);
        }
        messages.extend(self.fenced(&body));
        messages
    }

    pub fn whois(&self, outcome: &WhoisOutcome) -> Vec<String> {
        match outcome {
            WhoisOutcome::Found(record) => {
                let mut messages =
                    self.plain(&format!("WHOIS for {} (from {}):", record.domain, record.server));
                if record.text.trim().is_empty() {
                    messages.extend(self.plain("(the server returned an empty response)"));
                } else {
                    messages.extend(self.fenced(record.text.trim_end()));
                }
                messages
            }
            WhoisOutcome::Failed { .. } => self.plain(&outcome.text()),
        }
    }

    pub fn help(&self, prefix: &str, commands: &[CommandSpec]) -> Vec<String> {
        let mut text = String::from("Available commands:\n");
        for command in commands {
            let _ = writeln!(text, "{}{} - {}", prefix, command.usage, command.summary);
        }
        self.plain(&text)
    }

    pub fn command_error(&self, prefix: &str, err: &CommandError) -> Vec<String> {
        self.plain(&format!("{}. Try {}help.", capitalize(&err.to_string()), prefix))
    }

    /// Split into messages, dropping trailing newlines and empty pieces.
    pub fn plain(&self, text: &str) -> Vec<String> {
        chunk_message(text, self.limit)
            .into_iter()
            .map(|chunk| chunk.trim_end_matches('\n').to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    /// Split into fenced code blocks, each within the limit including the fences.
    pub fn fenced(&self, text: &str) -> Vec<String> {
        let room = self.limit - FENCE_OPEN.len() - FENCE_CLOSE.len();
        chunk_message(text, room)
            .into_iter()
            .map(|chunk| chunk.trim_end_matches('\n').to_string())
            .filter(|chunk| !chunk.is_empty())
            .map(|chunk| format!("{}{}{}", FENCE_OPEN, chunk, FENCE_CLOSE))
            .collect()
    }
}

impl Default for ChatFormatter {
    fn default() -> Self {
        Self::new(2000)
    }
}

/// Split `text` into pieces of at most `limit` characters.
///
/// Breaks fall on line ends where possible; a single line longer than `limit` is cut
/// at character boundaries. Concatenating the pieces yields `text` again.
pub fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();

        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len > limit {
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                let piece: String = piece.iter().collect();
                if piece.chars().count() == limit {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
        } else {
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn join_ports(ports: &[Port]) -> String {
    ports
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
