//! Input injector implementations.
//!
//! - **`native`**     – [`NativeInjector`]: animation, clicks, drags and
//!   combinations on top of a platform [`InputBackend`].
//! - **`xtest`**      – Linux X11 backend (feature `xtest`).
//! - **`send_input`** – Windows backend.
//! - **`keys`**       – Client key names resolved to [`HostKey`]s.
//! - **`dry_run`**    – Logs every injection through `tracing` without
//!   touching the desktop (`--dry-run`, headless hosts).
//! - **`mock`**       – Records every call in memory for tests.
//!
//! The platform backend is selected at compile time via `#[cfg(...)]`.

pub mod dry_run;
pub mod keys;
pub mod mock;
pub mod native;

#[cfg(target_os = "windows")]
pub mod send_input;

#[cfg(all(target_os = "linux", feature = "xtest"))]
pub mod xtest;

use std::sync::Arc;

use crate::application::injector::{InjectorError, InputInjector};

pub use dry_run::DryRunInjector;
pub use keys::{HostKey, NamedKey};
pub use mock::{InjectedEvent, RecordingInjector};
pub use native::{InputBackend, NativeInjector};

/// Opens the input backend for this platform.
///
/// # Errors
///
/// Returns [`InjectorError::Platform`] if the host input system cannot be
/// reached (e.g. no X display).
#[cfg(all(target_os = "linux", feature = "xtest"))]
pub fn open_host_injector() -> Result<Arc<dyn InputInjector>, InjectorError> {
    let backend = xtest::XTestBackend::open()?;
    Ok(Arc::new(NativeInjector::new(backend)))
}

/// Opens the input backend for this platform.
///
/// # Errors
///
/// Never fails on Windows; the signature matches the other platforms.
#[cfg(target_os = "windows")]
pub fn open_host_injector() -> Result<Arc<dyn InputInjector>, InjectorError> {
    Ok(Arc::new(NativeInjector::new(send_input::SendInputBackend::new())))
}

/// Opens the input backend for this platform.
///
/// # Errors
///
/// Always returns [`InjectorError::Unsupported`]: this build has no backend
/// for the host platform.
#[cfg(not(any(target_os = "windows", all(target_os = "linux", feature = "xtest"))))]
pub fn open_host_injector() -> Result<Arc<dyn InputInjector>, InjectorError> {
    Err(InjectorError::Unsupported(
        "no input backend in this build (on Linux, enable the `xtest` feature)".to_string(),
    ))
}
