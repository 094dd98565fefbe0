//! Application layer for the Zenflow server.
//!
//! Use cases in this layer decide *what* happens for each command but never
//! touch the OS or the network themselves.  They talk to the outside world
//! through traits that the infrastructure layer implements:
//!
//! - **`injector`**   – The [`InputInjector`] port through which validated
//!   mouse and keyboard commands reach the host's input system.
//! - **`dispatcher`** – Routes a decoded command to a handler and always
//!   produces exactly one response.
//! - **`presence`**   – The [`PresenceAdvertiser`] port used to announce the
//!   server on the local network.

pub mod dispatcher;
pub mod injector;
pub mod presence;

pub use dispatcher::Dispatcher;
pub use injector::{InjectorError, InputInjector};
pub use presence::{AdvertisementHandle, PresenceAdvertiser, PresenceError, PresenceRecord};
