//! mDNS/DNS-SD advertiser backed by the `mdns-sd` crate.
//!
//! The responder daemon is created on first registration and released by
//! [`PresenceAdvertiser::shutdown`], so a stopped service can be started
//! again.

use std::collections::HashMap;
use std::time::Duration;

use mdns_sd::{ServiceDaemon, ServiceInfo};
use tracing::debug;

use crate::application::presence::{
    AdvertisementHandle, PresenceAdvertiser, PresenceError, PresenceRecord,
};

/// How long `unregister` waits for the goodbye packets to go out.
const UNREGISTER_WAIT: Duration = Duration::from_secs(1);

/// Advertises presence records over multicast DNS.
#[derive(Default)]
pub struct MdnsAdvertiser {
    daemon: Option<ServiceDaemon>,
}

impl MdnsAdvertiser {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PresenceAdvertiser for MdnsAdvertiser {
    fn register(&mut self, record: &PresenceRecord) -> Result<AdvertisementHandle, PresenceError> {
        if self.daemon.is_none() {
            let daemon = ServiceDaemon::new().map_err(|e| PresenceError::Backend(e.to_string()))?;
            self.daemon = Some(daemon);
        }
        let daemon = self
            .daemon
            .as_ref()
            .ok_or_else(|| PresenceError::Backend("mDNS daemon unavailable".to_string()))?;

        let properties: HashMap<String, String> = record
            .properties
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let address = record.address.to_string();
        let info = ServiceInfo::new(
            &record.service_type,
            &record.instance_name,
            &record.host_name,
            address.as_str(),
            record.port,
            properties,
        )
        .map_err(|e| PresenceError::Register(e.to_string()))?;

        let full_name = info.get_fullname().to_string();
        daemon
            .register(info)
            .map_err(|e| PresenceError::Register(e.to_string()))?;
        debug!("mDNS record registered: {full_name}");
        Ok(AdvertisementHandle::new(full_name))
    }

    fn unregister(&mut self, handle: &AdvertisementHandle) -> Result<(), PresenceError> {
        let Some(daemon) = self.daemon.as_ref() else {
            return Ok(());
        };
        let status = daemon
            .unregister(handle.full_name())
            .map_err(|e| PresenceError::Unregister(e.to_string()))?;
        match status.recv_timeout(UNREGISTER_WAIT) {
            Ok(s) => debug!("mDNS unregister {}: {s:?}", handle.full_name()),
            Err(e) => debug!("mDNS unregister {} not confirmed: {e}", handle.full_name()),
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), PresenceError> {
        let Some(daemon) = self.daemon.take() else {
            return Ok(());
        };
        daemon
            .shutdown()
            .map(|_| ())
            .map_err(|e| PresenceError::Backend(e.to_string()))
    }
}
