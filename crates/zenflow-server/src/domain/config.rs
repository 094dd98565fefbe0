//! Server configuration.
//!
//! [`ServerConfig`] is the fully resolved configuration the server runs
//! with.  It is assembled in `main.rs` from three layers, highest priority
//! first: command-line arguments, `ZENFLOW_*` environment variables, and
//! the optional TOML file (see `infrastructure::storage::config`).  Values
//! absent from all three fall back to [`ServerConfig::default`].

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default WebSocket port the mobile app expects.
pub const DEFAULT_PORT: u16 = 8080;

/// Name reported in test-ping answers.
pub const SERVER_NAME: &str = "Zenflow PC Server";

/// Protocol version reported in test-ping answers and presence properties.
pub const PROTOCOL_VERSION: &str = "1.0";

/// Runtime configuration for the Zenflow server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: SocketAddr,

    /// Interval between transport-level WebSocket pings sent to each client.
    pub ping_interval: Duration,

    /// How long a client may take to answer a transport ping before its
    /// session is closed.
    pub ping_timeout: Duration,

    /// Upper bound on how long shutdown waits for sessions to finish their
    /// closing handshake.
    pub close_timeout: Duration,

    /// Animation hint passed to the injector for absolute pointer moves.
    pub move_duration: Duration,

    /// Animation hint passed to the injector for drags.
    pub drag_duration: Duration,

    /// Server name reported in test-ping answers.
    pub server_name: String,

    /// Protocol version reported in test-ping answers.
    pub version: String,

    /// Network presence (mDNS) settings.
    pub presence: PresenceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            ping_interval: Duration::from_secs(30),
            ping_timeout: Duration::from_secs(10),
            close_timeout: Duration::from_secs(10),
            move_duration: Duration::from_millis(100),
            drag_duration: Duration::from_millis(300),
            server_name: SERVER_NAME.to_string(),
            version: PROTOCOL_VERSION.to_string(),
            presence: PresenceConfig::default(),
        }
    }
}

/// Settings for advertising the server on the local network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceConfig {
    /// When `false` the server never registers a presence record.
    pub enabled: bool,

    /// DNS-SD service type, including the trailing `local.` domain.
    pub service_type: String,

    /// Instance name shown to clients browsing for the service.
    pub instance_name: String,

    /// Value of the `version` TXT property.
    pub version: String,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            service_type: "_zenflow-ws._tcp.local.".to_string(),
            instance_name: "Zenflow-PC".to_string(),
            version: PROTOCOL_VERSION.to_string(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
