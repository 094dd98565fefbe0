//! Network presence: announce the server so the mobile app can find it.
//!
//! [`PresenceService`] owns the lifecycle around a [`PresenceAdvertiser`]:
//!
//! 1. `start(port)` resolves the host's LAN address, builds the record and
//!    registers it exactly once.
//! 2. `stop()` unregisters the record *before* releasing the responder, so
//!    clients see the service withdrawn rather than timing out.
//!
//! Both calls may block (the mDNS backend waits up to a second for its
//! goodbye packets), so async callers run them on the blocking pool.
//!
//! Presence failures are never fatal; the server keeps serving clients that
//! connect by address.
//!
//! # Sub-modules
//!
//! - **`mdns`** – mDNS/DNS-SD advertiser backed by `mdns-sd` (feature `mdns`).
//! - **`mock`** – In-memory advertiser for tests.

#[cfg(feature = "mdns")]
pub mod mdns;
pub mod mock;

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr, UdpSocket};

use tracing::{debug, info, warn};

use crate::application::presence::{
    AdvertisementHandle, PresenceAdvertiser, PresenceError, PresenceRecord,
};
use crate::domain::config::PresenceConfig;

#[cfg(feature = "mdns")]
pub use mdns::MdnsAdvertiser;
pub use mock::RecordingAdvertiser;

/// `service` TXT property value.
pub const SERVICE_PROPERTY: &str = "zenflow-remote";

/// `protocol` TXT property value.
pub const PROTOCOL_PROPERTY: &str = "websocket";

/// `path` TXT property value.
pub const PATH_PROPERTY: &str = "/";

/// Prefix of the advertised `.local.` host name.
const HOST_PREFIX: &str = "zenflow-pc";

/// Public address used only to pick the outbound interface; no packet is sent.
const ROUTE_PROBE_ADDR: (Ipv4Addr, u16) = (Ipv4Addr::new(8, 8, 8, 8), 80);

/// Snapshot of the presence lifecycle, for logs and status queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceStatus {
    pub running: bool,
    pub service_type: String,
    pub service_name: Option<String>,
    pub address: Option<IpAddr>,
    pub port: Option<u16>,
}

struct ActiveAdvertisement {
    handle: AdvertisementHandle,
    record: PresenceRecord,
}

/// Registers and withdraws the server's presence record.
pub struct PresenceService {
    advertiser: Option<Box<dyn PresenceAdvertiser>>,
    config: PresenceConfig,
    active: Option<ActiveAdvertisement>,
}

impl PresenceService {
    /// Creates a service that advertises through `advertiser`.
    pub fn new(advertiser: Box<dyn PresenceAdvertiser>, config: PresenceConfig) -> Self {
        Self {
            advertiser: Some(advertiser),
            config,
            active: None,
        }
    }

    /// Creates a service that never advertises; `start` and `stop` are no-ops.
    pub fn disabled(config: PresenceConfig) -> Self {
        Self {
            advertiser: None,
            config,
            active: None,
        }
    }

    /// Registers the presence record for a listener on `port`.
    ///
    /// Calling `start` while already running logs and returns `Ok` without a
    /// second registration.
    ///
    /// # Errors
    ///
    /// Returns the advertiser's [`PresenceError`] if registration fails.  The
    /// advertiser is shut down before returning so nothing leaks.
    pub fn start(&mut self, port: u16) -> Result<(), PresenceError> {
        if let Some(active) = &self.active {
            info!(
                "presence already advertised as {}; ignoring start",
                active.record.full_name()
            );
            return Ok(());
        }
        let Some(advertiser) = self.advertiser.as_mut() else {
            debug!("presence disabled; not advertising");
            return Ok(());
        };

        let record = build_record(&self.config, resolve_local_ip(), port);
        match advertiser.register(&record) {
            Ok(handle) => {
                info!(
                    "advertising {} at {}:{}",
                    record.full_name(),
                    record.address,
                    record.port
                );
                self.active = Some(ActiveAdvertisement { handle, record });
                Ok(())
            }
            Err(e) => {
                if let Err(shutdown_err) = advertiser.shutdown() {
                    debug!("presence cleanup after failed start: {shutdown_err}");
                }
                Err(e)
            }
        }
    }

    /// Withdraws the record and releases the responder.  No-op when not
    /// running.  Errors are logged, not returned.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        if let Some(advertiser) = self.advertiser.as_mut() {
            if let Err(e) = advertiser.unregister(&active.handle) {
                warn!("failed to withdraw {}: {e}", active.record.full_name());
            }
            if let Err(e) = advertiser.shutdown() {
                warn!("failed to release presence responder: {e}");
            }
        }
        info!("stopped advertising {}", active.record.full_name());
    }

    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Current lifecycle snapshot.
    pub fn status(&self) -> PresenceStatus {
        let record = self.active.as_ref().map(|a| &a.record);
        PresenceStatus {
            running: record.is_some(),
            service_type: self.config.service_type.clone(),
            service_name: record.map(PresenceRecord::full_name),
            address: record.map(|r| r.address),
            port: record.map(|r| r.port),
        }
    }
}

impl Drop for PresenceService {
    fn drop(&mut self) {
        if self.active.is_none() {
            return;
        }
        // Withdrawal can wait on the responder; keep it off async workers.
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let mut detached = Self {
                    advertiser: self.advertiser.take(),
                    config: self.config.clone(),
                    active: self.active.take(),
                };
                runtime.spawn_blocking(move || detached.stop());
            }
            Err(_) => self.stop(),
        }
    }
}

/// Builds the presence record for `address:port` from `config`.
pub fn build_record(config: &PresenceConfig, address: IpAddr, port: u16) -> PresenceRecord {
    let host_label = address.to_string().replace(['.', ':'], "-");
    let properties = BTreeMap::from([
        ("version".to_string(), config.version.clone()),
        ("service".to_string(), SERVICE_PROPERTY.to_string()),
        ("protocol".to_string(), PROTOCOL_PROPERTY.to_string()),
        ("path".to_string(), PATH_PROPERTY.to_string()),
    ]);
    PresenceRecord {
        service_type: config.service_type.clone(),
        instance_name: config.instance_name.clone(),
        host_name: format!("{HOST_PREFIX}-{host_label}.local."),
        address,
        port,
        properties,
    }
}

/// Returns the address of the interface the host would use to reach the
/// internet, falling back to `127.0.0.1` when there is no route.
pub fn resolve_local_ip() -> IpAddr {
    match probe_outbound_ip() {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            debug!("could not determine LAN address ({e}); using loopback");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

fn probe_outbound_ip() -> std::io::Result<IpAddr> {
    // Connecting a UDP socket only selects a route; nothing goes on the wire.
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.connect(ROUTE_PROBE_ADDR)?;
    Ok(socket.local_addr()?.ip())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
