//! In-memory presence advertiser for tests.
//!
//! Clones share one call log, so a test can hand a boxed clone to
//! [`PresenceService`](super::PresenceService) and keep another clone to
//! inspect what happened.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::application::presence::{
    AdvertisementHandle, PresenceAdvertiser, PresenceError, PresenceRecord,
};

/// One recorded advertiser call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvertiserCall {
    Register(PresenceRecord),
    Unregister(String),
    Shutdown,
}

#[derive(Debug, Default)]
struct Log {
    calls: Vec<AdvertiserCall>,
    registered: Vec<PresenceRecord>,
}

/// Records register/unregister/shutdown calls without touching the network.
#[derive(Debug, Clone, Default)]
pub struct RecordingAdvertiser {
    log: Arc<Mutex<Log>>,
    fail_register: bool,
}

impl RecordingAdvertiser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an advertiser whose `register` always fails.
    pub fn failing() -> Self {
        Self {
            fail_register: true,
            ..Self::default()
        }
    }

    /// Every call made so far, oldest first.
    pub fn calls(&self) -> Vec<AdvertiserCall> {
        self.lock().calls.clone()
    }

    /// Records that are currently registered.
    pub fn registered(&self) -> Vec<PresenceRecord> {
        self.lock().registered.clone()
    }

    pub fn register_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, AdvertiserCall::Register(_)))
            .count()
    }

    fn lock(&self) -> MutexGuard<'_, Log> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PresenceAdvertiser for RecordingAdvertiser {
    fn register(&mut self, record: &PresenceRecord) -> Result<AdvertisementHandle, PresenceError> {
        let mut log = self.lock();
        log.calls.push(AdvertiserCall::Register(record.clone()));
        if self.fail_register {
            return Err(PresenceError::Register("mock failure".to_string()));
        }
        log.registered.push(record.clone());
        Ok(AdvertisementHandle::new(record.full_name()))
    }

    fn unregister(&mut self, handle: &AdvertisementHandle) -> Result<(), PresenceError> {
        let mut log = self.lock();
        log.calls
            .push(AdvertiserCall::Unregister(handle.full_name().to_string()));
        log.registered.retain(|r| r.full_name() != handle.full_name());
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), PresenceError> {
        self.lock().calls.push(AdvertiserCall::Shutdown);
        Ok(())
    }
}
