//! The network-presence port.
//!
//! A [`PresenceAdvertiser`] publishes a [`PresenceRecord`] on the local
//! network (mDNS/DNS-SD in production) so the mobile app can find the server
//! without the user typing an IP address.  The lifecycle around it (resolve
//! the local address, register once, unregister before release) lives in
//! `infrastructure::presence::PresenceService`.

use std::collections::BTreeMap;
use std::net::IpAddr;

use thiserror::Error;

/// Error type for presence operations.
///
/// Presence is never fatal for the server: callers log these and keep
/// serving.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PresenceError {
    /// The responder could not be created or has already been released.
    #[error("presence backend unavailable: {0}")]
    Backend(String),

    /// The record was rejected or could not be announced.
    #[error("failed to register presence record: {0}")]
    Register(String),

    /// The record could not be withdrawn.
    #[error("failed to unregister presence record: {0}")]
    Unregister(String),
}

/// Everything a client needs to locate and connect to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceRecord {
    /// DNS-SD service type, e.g. `_zenflow-ws._tcp.local.`.
    pub service_type: String,
    /// Human-readable instance name, e.g. `Zenflow-PC`.
    pub instance_name: String,
    /// Host name the record points at, ending in `.local.`.
    pub host_name: String,
    /// Address clients should connect to.
    pub address: IpAddr,
    /// Port the WebSocket listener is bound to.
    pub port: u16,
    /// TXT properties (`version`, `service`, `protocol`, `path`).
    pub properties: BTreeMap<String, String>,
}

impl PresenceRecord {
    /// Fully qualified service instance name, e.g.
    /// `Zenflow-PC._zenflow-ws._tcp.local.`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.instance_name, self.service_type)
    }
}

/// Opaque token returned by [`PresenceAdvertiser::register`] and required to
/// withdraw the same record later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisementHandle {
    full_name: String,
}

impl AdvertisementHandle {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
        }
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

/// Publishes and withdraws presence records.
pub trait PresenceAdvertiser: Send {
    /// Announces `record` on the network.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError`] if the responder cannot be started or the
    /// record is rejected.
    fn register(&mut self, record: &PresenceRecord) -> Result<AdvertisementHandle, PresenceError>;

    /// Withdraws a record previously returned by [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Unregister`] if the withdrawal fails.
    fn unregister(&mut self, handle: &AdvertisementHandle) -> Result<(), PresenceError>;

    /// Releases the responder.  Must be safe to call when nothing is
    /// registered, including after a failed [`register`](Self::register).
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Backend`] if the responder fails to stop.
    fn shutdown(&mut self) -> Result<(), PresenceError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_full_name_joins_instance_and_type() {
        let record = PresenceRecord {
            service_type: "_zenflow-ws._tcp.local.".to_string(),
            instance_name: "Zenflow-PC".to_string(),
            host_name: "zenflow-pc-10-0-0-5.local.".to_string(),
            address: IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
            port: 8080,
            properties: BTreeMap::new(),
        };
        assert_eq!(record.full_name(), "Zenflow-PC._zenflow-ws._tcp.local.");
    }
}
