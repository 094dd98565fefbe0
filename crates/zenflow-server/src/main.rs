//! Zenflow Remote PC server: entry point.
//!
//! Accepts WebSocket connections from the Zenflow mobile app, turns the JSON
//! commands it sends into mouse and keyboard input on this machine, and
//! advertises itself over mDNS so the app can find it on the LAN.
//!
//! # Usage
//!
//! ```text
//! zenflow-server [PORT] [HOST] [OPTIONS]
//!
//! Arguments:
//!   [PORT]  WebSocket port [default: 8080]
//!   [HOST]  Bind address   [default: 0.0.0.0]
//!
//! Options:
//!   --config <PATH>          Optional TOML config file
//!   --ping-interval <SECS>   Transport ping interval [default: 30]
//!   --ping-timeout <SECS>    Transport pong timeout [default: 10]
//!   --instance-name <NAME>   Advertised service name [default: Zenflow-PC]
//!   --no-discovery           Do not advertise over mDNS
//!   --dry-run                Log input instead of injecting it
//! ```
//!
//! # Environment variable overrides
//!
//! | Variable                 | Flag               |
//! |--------------------------|--------------------|
//! | `ZENFLOW_PORT`           | `[PORT]`           |
//! | `ZENFLOW_HOST`           | `[HOST]`           |
//! | `ZENFLOW_CONFIG`         | `--config`         |
//! | `ZENFLOW_PING_INTERVAL`  | `--ping-interval`  |
//! | `ZENFLOW_PING_TIMEOUT`   | `--ping-timeout`   |
//! | `ZENFLOW_INSTANCE_NAME`  | `--instance-name`  |
//! | `ZENFLOW_NO_DISCOVERY`   | `--no-discovery`   |
//! | `ZENFLOW_DRY_RUN`        | `--dry-run`        |
//!
//! Command-line values win over environment variables, which win over the
//! config file.  `RUST_LOG` overrides the file's `log_level`.
//!
//! # Architecture overview
//!
//! ```text
//! Zenflow mobile app  (JSON over WebSocket)
//!       ↕
//! zenflow-server  ← this process
//!   domain/          ServerConfig, session states
//!   application/     Dispatcher, InputInjector and PresenceAdvertiser ports
//!   infrastructure/
//!     ws_server/     Listener, accept loop, shutdown
//!     session/       Per-client read → dispatch → respond loop
//!     presence/      mDNS advertisement
//!     input_injection/
//!     storage/       TOML config file
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use zenflow_server::application::{InjectorError, InputInjector};
use zenflow_server::domain::ServerConfig;
use zenflow_server::infrastructure::input_injection::{open_host_injector, DryRunInjector};
use zenflow_server::infrastructure::presence::PresenceService;
use zenflow_server::infrastructure::storage::{load_config, FileConfig};
use zenflow_server::infrastructure::Server;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Zenflow Remote PC server.
#[derive(Debug, Parser)]
#[command(
    name = "zenflow-server",
    about = "WebSocket remote-input server for the Zenflow mobile app",
    version
)]
struct Cli {
    /// TCP port for the WebSocket listener.
    #[arg(env = "ZENFLOW_PORT")]
    port: Option<u16>,

    /// IP address to bind to.  `0.0.0.0` accepts connections on every
    /// interface; `127.0.0.1` only from this machine.
    #[arg(env = "ZENFLOW_HOST")]
    host: Option<String>,

    /// Path to a TOML configuration file.
    #[arg(long, env = "ZENFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Seconds between transport-level pings to each client.
    #[arg(long, env = "ZENFLOW_PING_INTERVAL", value_parser = clap::value_parser!(u64).range(1..))]
    ping_interval: Option<u64>,

    /// Seconds a client may take to answer a ping before it is dropped.
    #[arg(long, env = "ZENFLOW_PING_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    ping_timeout: Option<u64>,

    /// Service instance name advertised over mDNS.
    #[arg(long, env = "ZENFLOW_INSTANCE_NAME")]
    instance_name: Option<String>,

    /// Do not advertise the server over mDNS.
    #[arg(long, env = "ZENFLOW_NO_DISCOVERY")]
    no_discovery: bool,

    /// Log every input event instead of injecting it into the desktop.
    #[arg(long, env = "ZENFLOW_DRY_RUN")]
    dry_run: bool,
}

impl Cli {
    /// Layers the command-line values over the file configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the host is not a valid IP address.
    fn into_server_config(self, file: &FileConfig) -> anyhow::Result<ServerConfig> {
        let mut config = file
            .to_server_config()
            .context("invalid configuration file")?;

        let host = match self.host {
            Some(host) => host
                .parse::<IpAddr>()
                .with_context(|| format!("invalid bind host: '{host}'"))?,
            None => config.bind_addr.ip(),
        };
        let port = self.port.unwrap_or(config.bind_addr.port());
        config.bind_addr = SocketAddr::new(host, port);

        if let Some(secs) = self.ping_interval {
            config.ping_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.ping_timeout {
            config.ping_timeout = Duration::from_secs(secs);
        }
        if let Some(name) = self.instance_name {
            config.presence.instance_name = name;
        }
        if self.no_discovery {
            config.presence.enabled = false;
        }
        Ok(config)
    }
}

/// Opens the host input backend, or the logging injector for `--dry-run`.
///
/// A build without a backend for this platform falls back to the logging
/// injector with a warning; a backend that exists but cannot start is fatal.
fn build_injector(dry_run: bool) -> anyhow::Result<Arc<dyn InputInjector>> {
    if dry_run {
        info!("dry run: input events are logged, not injected");
        return Ok(Arc::new(DryRunInjector::new()));
    }
    match open_host_injector() {
        Ok(injector) => Ok(injector),
        Err(InjectorError::Unsupported(reason)) => {
            warn!("{reason}; input events will only be logged");
            Ok(Arc::new(DryRunInjector::new()))
        }
        Err(e) => Err(e).context(
            "cannot reach the host input system (use --dry-run to serve without injecting)",
        ),
    }
}

/// Builds the presence service the configuration asks for.
fn build_presence(config: &ServerConfig) -> PresenceService {
    if !config.presence.enabled {
        info!("network presence disabled");
        return PresenceService::disabled(config.presence.clone());
    }
    mdns_presence(config)
}

#[cfg(feature = "mdns")]
fn mdns_presence(config: &ServerConfig) -> PresenceService {
    use zenflow_server::infrastructure::presence::MdnsAdvertiser;
    PresenceService::new(Box::new(MdnsAdvertiser::new()), config.presence.clone())
}

#[cfg(not(feature = "mdns"))]
fn mdns_presence(config: &ServerConfig) -> PresenceService {
    info!("built without the `mdns` feature; network presence unavailable");
    PresenceService::disabled(config.presence.clone())
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Program entry point.
///
/// 1. Parse the command line and load the optional config file.
/// 2. Initialise `tracing`; `RUST_LOG` wins over the file's `log_level`.
/// 3. Open the input backend and build the server with the presence service.
/// 4. Spawn a Ctrl+C handler that requests a graceful shutdown.
/// 5. Serve until shutdown completes.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => FileConfig::default(),
    };

    // ── Logging setup ─────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&file_config.log_level)),
        )
        .init();

    let dry_run = cli.dry_run;
    let config = cli.into_server_config(&file_config)?;
    info!(
        bind = %config.bind_addr,
        ping_interval_secs = config.ping_interval.as_secs(),
        ping_timeout_secs = config.ping_timeout.as_secs(),
        "starting Zenflow server v{}",
        env!("CARGO_PKG_VERSION")
    );

    let bind_addr = config.bind_addr;
    let injector = build_injector(dry_run)?;
    let presence = build_presence(&config);
    let server = Arc::new(Server::new(config, injector, presence));

    // ── Ctrl+C handler ────────────────────────────────────────────────────────
    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                signal_server.shutdown().await;
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    server.listen(bind_addr).await.context("server failed")?;
    Ok(())
}
