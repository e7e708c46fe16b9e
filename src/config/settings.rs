//! Bot settings and paths.
//!
//! Settings are read from a JSON file: an explicit `--config` path, or
//! `settings.json` in the platform configuration directory. Missing files mean
//! defaults; nothing is ever written back.

use crate::error::{ConfigError, ConfigResult};
use crate::resolver::ResolverKind;
use crate::scanner::reachability::{DEFAULT_PING_PORTS, DEFAULT_PING_TIMEOUT};
use crate::scanner::{DEFAULT_SCAN_CONCURRENCY, DEFAULT_SCAN_PORTS, DEFAULT_SCAN_TIMEOUT};
use crate::types::Port;
use crate::whois::{DEFAULT_WHOIS_TIMEOUT, FALLBACK_SERVER, ROOT_SERVER};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest message size the chat formatter can work with.
const MIN_MESSAGE_LIMIT: usize = 64;

/// Application directory paths, computed on demand.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/netprobe)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Locate the platform directories.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "netprobe", "netprobe")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Runtime settings for commands and the chat front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Prefix that marks a chat message as a command.
    pub command_prefix: String,
    /// Ports tried by `ping` when none is given.
    pub ping_ports: Vec<u16>,
    /// Per-probe timeout for `ping`, in milliseconds.
    pub ping_timeout_ms: u64,
    /// Ports probed by `homeports`.
    pub scan_ports: Vec<u16>,
    /// Per-probe timeout for `homeports`, in milliseconds.
    pub scan_timeout_ms: u64,
    /// Maximum simultaneous probes during `homeports`.
    pub scan_concurrency: usize,
    pub whois_root_server: String,
    pub whois_fallback_server: String,
    pub whois_timeout_ms: u64,
    /// Maximum characters per chat message.
    pub message_limit: usize,
    /// Address lookup strategy for reachability fallbacks.
    pub resolver: ResolverKind,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            command_prefix: "!".to_string(),
            ping_ports: DEFAULT_PING_PORTS.to_vec(),
            ping_timeout_ms: DEFAULT_PING_TIMEOUT.as_millis() as u64,
            scan_ports: DEFAULT_SCAN_PORTS.to_vec(),
            scan_timeout_ms: DEFAULT_SCAN_TIMEOUT.as_millis() as u64,
            scan_concurrency: DEFAULT_SCAN_CONCURRENCY,
            whois_root_server: ROOT_SERVER.to_string(),
            whois_fallback_server: FALLBACK_SERVER.to_string(),
            whois_timeout_ms: DEFAULT_WHOIS_TIMEOUT.as_millis() as u64,
            message_limit: 2000,
            resolver: ResolverKind::System,
        }
    }
}

impl Settings {
    /// Load from `path` if given, else from the default location, else defaults.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let file = Paths::discover()?.settings_file();
                if file.exists() {
                    Self::load_from(&file)
                } else {
                    tracing::debug!(path = %file.display(), "no settings file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load and validate settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the commands cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.command_prefix.trim().is_empty() {
            return Err(ConfigError::Invalid("command_prefix must not be empty".into()));
        }
        self.ping_ports()?;
        self.scan_ports()?;
        for (name, value) in [
            ("ping_timeout_ms", self.ping_timeout_ms),
            ("scan_timeout_ms", self.scan_timeout_ms),
            ("whois_timeout_ms", self.whois_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be positive", name)));
            }
        }
        if self.scan_concurrency == 0 {
            return Err(ConfigError::Invalid("scan_concurrency must be positive".into()));
        }
        if self.whois_root_server.trim().is_empty() || self.whois_fallback_server.trim().is_empty() {
            return Err(ConfigError::Invalid("WHOIS servers must not be empty".into()));
        }
        if self.message_limit < MIN_MESSAGE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "message_limit must be at least {}",
                MIN_MESSAGE_LIMIT
            )));
        }
        Ok(())
    }

    pub fn ping_ports(&self) -> ConfigResult<Vec<Port>> {
        port_list("ping_ports", &self.ping_ports)
    }

    pub fn scan_ports(&self) -> ConfigResult<Vec<Port>> {
        port_list("scan_ports", &self.scan_ports)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn scan_timeout(&self) -> Duration {
        Duration::from_millis(self.scan_timeout_ms)
    }

    pub fn whois_timeout(&self) -> Duration {
        Duration::from_millis(self.whois_timeout_ms)
    }
}

fn port_list(name: &str, raw: &[u16]) -> ConfigResult<Vec<Port>> {
    if raw.is_empty() {
        return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
    }
    Port::list(raw).map_err(|e| ConfigError::Invalid(format!("{}: {}", name, e)))
}
