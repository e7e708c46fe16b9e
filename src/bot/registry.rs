//! Command dispatch.
//!
//! The registry owns everything a command needs, built once from [`Settings`] and
//! shared read-only between command tasks.

use super::command::{self, Command, COMMANDS};
use crate::config::Settings;
use crate::error::{CommandError, ConfigResult};
use crate::output::ChatFormatter;
use crate::resolver::AddressLookup;
use crate::scanner::{run_scan, Prober, ReachabilityChecker, ScanJob, TcpProber};
use crate::types::RequestId;
use crate::whois::{TcpTransport, WhoisClient, WhoisTransport};
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

pub struct CommandRegistry {
    prefix: String,
    checker: ReachabilityChecker,
    prober: Arc<dyn Prober>,
    scan: ScanJob,
    whois: WhoisClient,
    formatter: ChatFormatter,
}

impl CommandRegistry {
    /// Registry backed by real sockets.
    pub fn from_settings(settings: &Settings) -> ConfigResult<Self> {
        Self::with_components(
            settings,
            Arc::new(TcpProber::new()),
            settings.resolver.build(),
            Arc::new(TcpTransport::new()),
        )
    }

    /// Registry with explicit probe, lookup and WHOIS transport implementations.
    pub fn with_components(
        settings: &Settings,
        prober: Arc<dyn Prober>,
        lookup: Arc<dyn AddressLookup>,
        transport: Arc<dyn WhoisTransport>,
    ) -> ConfigResult<Self> {
        settings.validate()?;

        let checker = ReachabilityChecker::new(Arc::clone(&prober), lookup)
            .with_default_ports(settings.ping_ports()?)
            .with_timeout(settings.ping_timeout());

        let scan = ScanJob::new(settings.scan_ports()?)
            .with_concurrency(settings.scan_concurrency)
            .with_timeout(settings.scan_timeout());

        let whois = WhoisClient::with_transport(transport)
            .with_root_server(settings.whois_root_server.as_str())
            .with_fallback_server(settings.whois_fallback_server.as_str())
            .with_timeout(settings.whois_timeout());

        Ok(Self {
            prefix: settings.command_prefix.clone(),
            checker,
            prober,
            scan,
            whois,
            formatter: ChatFormatter::new(settings.message_limit),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn parse(&self, message: &str) -> Option<Result<Command, CommandError>> {
        command::parse(&self.prefix, message)
    }

    /// Immediate reply sent before a slow command starts.
    pub fn acknowledge(&self, command: &Command) -> Option<String> {
        match command {
            Command::Ping { target, .. } => Some(format!("Pinging {}...", target)),
            Command::HomePorts { target } => {
                Some(format!("Scanning common ports on {}...", target))
            }
            Command::Whois { domain } => Some(format!("Looking up WHOIS for {}...", domain)),
            Command::Help => None,
        }
    }

    /// Reply for a malformed command.
    pub fn reject(&self, err: &CommandError) -> Vec<String> {
        self.formatter.command_error(&self.prefix, err)
    }

    /// Run a command to completion and render its reply messages.
    ///
    /// Never fails: network problems are part of the rendered result.
    pub async fn execute(&self, command: &Command) -> Vec<String> {
        let id = RequestId::new();
        let span = info_span!("command", id = %id.short(), name = command.name());
        self.run(command).instrument(span).await
    }

    async fn run(&self, command: &Command) -> Vec<String> {
        info!(%command, "running command");
        match command {
            Command::Ping { target, port } => {
                let outcome = self.checker.check(&target.host(), *port).await;
                info!(reached = outcome.is_reached(), "ping finished");
                self.formatter.reachability(&outcome)
            }
            Command::HomePorts { target } => {
                let report = run_scan(self.prober.as_ref(), &target.host(), &self.scan).await;
                info!(open = report.open_count(), "scan finished");
                self.formatter.scan(&report)
            }
            Command::Whois { domain } => {
                let outcome = self.whois.lookup(domain).await;
                self.formatter.whois(&outcome)
            }
            Command::Help => self.formatter.help(&self.prefix, COMMANDS),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::WhoisError;
    use crate::resolver::tests::StaticLookup;
    use crate::scanner::tests::MockProber;
    use std::time::Duration;

    /// WHOIS transport with one canned answer per server.
    pub(crate) struct CannedWhois;

    impl WhoisTransport for CannedWhois {
        fn query(&self, server: &str, query: &str, _: Duration) -> Result<Vec<u8>, WhoisError> {
            match server {
                "whois.iana.org" => Ok(b"refer: x\nwhois: whois.example-registry.net\n".to_vec()),
                "whois.example-registry.net" => {
                    Ok(format!("Domain Name: {}\n", query.to_uppercase()).into_bytes())
                }
                _ => Err(WhoisError::Timeout {
                    server: server.to_string(),
                }),
            }
        }
    }

    pub(crate) fn registry(open: &[u16]) -> CommandRegistry {
        registry_with_whois(open, Arc::new(CannedWhois))
    }

    pub(crate) fn registry_with_whois(
        open: &[u16],
        transport: Arc<dyn WhoisTransport>,
    ) -> CommandRegistry {
        CommandRegistry::with_components(
            &Settings::default(),
            Arc::new(MockProber::new(open)),
            Arc::new(StaticLookup::new(None)),
            transport,
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let mut settings = Settings::default();
        settings.scan_ports = vec![0];
        let result = CommandRegistry::with_components(
            &settings,
            Arc::new(MockProber::new(&[])),
            Arc::new(StaticLookup::new(None)),
            Arc::new(CannedWhois),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_acknowledgements() {
        let registry = registry(&[]);
        let ack = |msg: &str| registry.acknowledge(&registry.parse(msg).unwrap().unwrap());

        assert_eq!(ack("!ping example.com"), Some("Pinging example.com...".into()));
        assert_eq!(
            ack("!homeports 10.0.0.1"),
            Some("Scanning common ports on 10.0.0.1...".into())
        );
        assert_eq!(
            ack("!whois example.com"),
            Some("Looking up WHOIS for example.com...".into())
        );
        assert_eq!(ack("!help"), None);
    }

    #[tokio::test]
    async fn test_execute_ping() {
        let registry = registry(&[443]);
        let command = registry.parse("!ping example.com").unwrap().unwrap();
        let replies = registry.execute(&command).await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("example.com is reachable on port 443"));
    }

    #[tokio::test]
    async fn test_execute_homeports() {
        let registry = registry(&[22, 80]);
        let command = registry.parse("!homeports 192.168.1.1").unwrap().unwrap();
        let replies = registry.execute(&command).await;
        assert!(replies[0].contains("2 open of 29"));
        assert!(replies[1].contains("   22  ssh            OPEN"));
        assert!(replies[1].contains("   21  ftp            closed"));
    }

    #[tokio::test]
    async fn test_execute_whois() {
        let registry = registry(&[]);
        let command = registry.parse("!whois example.com").unwrap().unwrap();
        let replies = registry.execute(&command).await;
        assert_eq!(
            replies[0],
            "WHOIS for example.com (from whois.example-registry.net):"
        );
        assert!(replies[1].contains("EXAMPLE.COM"));
    }

    #[tokio::test]
    async fn test_execute_help() {
        let registry = registry(&[]);
        let replies = registry.execute(&Command::Help).await;
        assert!(replies[0].starts_with("Available commands:"));
        assert!(replies[0].contains("!homeports <host>"));
    }

    #[test]
    fn test_reject_message() {
        let registry = registry(&[]);
        let err = registry.parse("!ping").unwrap().unwrap_err();
        assert_eq!(
            registry.reject(&err),
            vec!["Missing argument <host> for 'ping'. Try !help."]
        );
    }
}
