//! TOML configuration file for the server.
//!
//! Every field is optional; missing fields take the same defaults as
//! [`ServerConfig::default`].  Example:
//!
//! ```toml
//! log_level = "debug"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! ping_interval_secs = 30
//! ping_timeout_secs = 10
//! close_timeout_secs = 10
//!
//! [input]
//! move_duration_ms = 100
//! drag_duration_ms = 300
//!
//! [presence]
//! enabled = true
//! service_type = "_zenflow-ws._tcp.local."
//! instance_name = "Zenflow-PC"
//! version = "1.0"
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::domain::config::{PresenceConfig, ServerConfig, DEFAULT_PORT, PROTOCOL_VERSION};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `server.host` is not an IP address.
    #[error("invalid bind host '{0}': expected an IPv4 or IPv6 address")]
    InvalidHost(String),

    /// A field holds a value the server cannot run with.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level layout of the configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub input: InputSection,

    #[serde(default)]
    pub presence: PresenceSection,
}

/// Listener and keep-alive settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSection {
    /// IP address to bind to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,

    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,

    #[serde(default = "default_close_timeout_secs")]
    pub close_timeout_secs: u64,
}

/// Injection animation hints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InputSection {
    #[serde(default = "default_move_duration_ms")]
    pub move_duration_ms: u64,

    #[serde(default = "default_drag_duration_ms")]
    pub drag_duration_ms: u64,
}

/// mDNS advertisement settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceSection {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_service_type")]
    pub service_type: String,

    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    #[serde(default = "default_version")]
    pub version: String,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_ping_timeout_secs() -> u64 {
    10
}

fn default_close_timeout_secs() -> u64 {
    10
}

fn default_move_duration_ms() -> u64 {
    100
}

fn default_drag_duration_ms() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

fn default_service_type() -> String {
    PresenceConfig::default().service_type
}

fn default_instance_name() -> String {
    PresenceConfig::default().instance_name
}

fn default_version() -> String {
    PROTOCOL_VERSION.to_string()
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            server: ServerSection::default(),
            input: InputSection::default(),
            presence: PresenceSection::default(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ping_interval_secs: default_ping_interval_secs(),
            ping_timeout_secs: default_ping_timeout_secs(),
            close_timeout_secs: default_close_timeout_secs(),
        }
    }
}

impl Default for InputSection {
    fn default() -> Self {
        Self {
            move_duration_ms: default_move_duration_ms(),
            drag_duration_ms: default_drag_duration_ms(),
        }
    }
}

impl Default for PresenceSection {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            service_type: default_service_type(),
            instance_name: default_instance_name(),
            version: default_version(),
        }
    }
}

impl FileConfig {
    /// Resolves the file values into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidHost`] if `server.host` is not an IP
    /// address, and [`ConfigError::InvalidValue`] if a keep-alive or close
    /// timing is zero.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        Ok(ServerConfig {
            bind_addr: SocketAddr::new(host, self.server.port),
            ping_interval: nonzero_secs("server.ping_interval_secs", self.server.ping_interval_secs)?,
            ping_timeout: nonzero_secs("server.ping_timeout_secs", self.server.ping_timeout_secs)?,
            close_timeout: nonzero_secs("server.close_timeout_secs", self.server.close_timeout_secs)?,
            move_duration: Duration::from_millis(self.input.move_duration_ms),
            drag_duration: Duration::from_millis(self.input.drag_duration_ms),
            presence: PresenceConfig {
                enabled: self.presence.enabled,
                service_type: self.presence.service_type.clone(),
                instance_name: self.presence.instance_name.clone(),
                version: self.presence.version.clone(),
            },
            ..ServerConfig::default()
        })
    }
}

fn nonzero_secs(field: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be at least 1 second".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Loads a [`FileConfig`] from `path`, returning the defaults if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_config(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("config file {} not found; using defaults", path.display());
            Ok(FileConfig::default())
        }
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Parses configuration from TOML text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the TOML is malformed.
pub fn parse_config(content: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_server_defaults() {
        // Arrange / Act
        let cfg = parse_config("").unwrap().to_server_config().unwrap();

        // Assert
        assert_eq!(cfg, ServerConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_fields() {
        let file = parse_config(
            r#"
            [server]
            port = 9000

            [presence]
            enabled = false
            "#,
        )
        .unwrap();

        let cfg = file.to_server_config().unwrap();
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.ping_interval, Duration::from_secs(30));
        assert!(!cfg.presence.enabled);
        assert_eq!(cfg.presence.instance_name, "Zenflow-PC");
        assert_eq!(file.log_level, "info");
    }

    #[test]
    fn test_timings_are_converted_to_durations() {
        let file = parse_config(
            r#"
            [server]
            ping_interval_secs = 5
            ping_timeout_secs = 2

            [input]
            drag_duration_ms = 0
            "#,
        )
        .unwrap();

        let cfg = file.to_server_config().unwrap();
        assert_eq!(cfg.ping_interval, Duration::from_secs(5));
        assert_eq!(cfg.ping_timeout, Duration::from_secs(2));
        assert_eq!(cfg.drag_duration, Duration::ZERO);
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let file = parse_config("[server]\nhost = \"my-pc\"\n").unwrap();
        assert!(matches!(
            file.to_server_config(),
            Err(ConfigError::InvalidHost(h)) if h == "my-pc"
        ));
    }

    #[test]
    fn test_zero_ping_interval_is_rejected() {
        // Arrange
        let file = parse_config("[server]\nping_interval_secs = 0\n").unwrap();

        // Act
        let result = file.to_server_config();

        // Assert
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "server.ping_interval_secs", .. })
        ));
    }

    #[test]
    fn test_zero_ping_and_close_timeouts_are_rejected() {
        for (toml, field) in [
            ("[server]\nping_timeout_secs = 0\n", "server.ping_timeout_secs"),
            ("[server]\nclose_timeout_secs = 0\n", "server.close_timeout_secs"),
        ] {
            let result = parse_config(toml).unwrap().to_server_config();
            assert!(
                matches!(result, Err(ConfigError::InvalidValue { field: f, .. }) if f == field),
                "{field} = 0 must be rejected"
            );
        }
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(
            parse_config("[server\nport = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join("zenflow-no-such-config-8c1f.toml");
        assert_eq!(load_config(&path).unwrap(), FileConfig::default());
    }
}
