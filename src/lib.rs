//! # netprobe - network diagnostics for chat bots
//!
//! netprobe answers three chat commands for the members of a group chat:
//!
//! - **`ping <host> [port]`**: is the host accepting TCP connections? The literal
//!   target is tried on a short port list first, then each resolved address.
//! - **`homeports <host>`**: which common ports are open? Probes run concurrently
//!   under a fixed limit and come back in port-list order.
//! - **`whois <domain>`**: registration data, following the IANA referral to the
//!   authoritative server.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use netprobe::scanner::{ReachabilityChecker, TcpProber};
//! use netprobe::resolver::SystemLookup;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let checker = ReachabilityChecker::new(Arc::new(TcpProber::new()), Arc::new(SystemLookup));
//!     let outcome = checker.check("example.com", None).await;
//!     println!("reached: {}", outcome.is_reached());
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Validated ports, targets and request IDs
//! - [`resolver`] - Hostname to candidate address lookup
//! - [`scanner`] - TCP probes, port scans and reachability checks
//! - [`whois`] - Two-hop WHOIS client
//! - [`output`] - Chat, terminal and JSON rendering
//! - [`bot`] - Command parsing, dispatch and the chat event loop
//! - [`config`] - Settings file handling
//! - [`cli`] - Command-line front end
//! - [`error`] - Error types

pub mod bot;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod resolver;
pub mod scanner;
pub mod services;
pub mod types;
pub mod whois;

// Re-export commonly used types
pub use error::{CommandError, ConfigError, ProbeError, ResolveError, WhoisError};
pub use scanner::{ProbeResult, ProbeStatus, Prober, ReachabilityOutcome, ScanReport};
pub use types::{Port, PortSpec, RequestId, Target};
pub use whois::{WhoisClient, WhoisOutcome, WhoisRecord};
