//! Infrastructure layer for the Zenflow server.
//!
//! Contains the adapters that touch the outside world: the WebSocket
//! listener and per-client sessions, mDNS presence, host input injection,
//! and the configuration file.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `zenflow_core`, but MUST NOT be imported by the `application` or `domain`
//! layers.

pub mod input_injection;
pub mod presence;
pub mod registry;
pub mod session;
pub mod storage;
pub mod ws_server;

pub use registry::SessionRegistry;
pub use ws_server::{Server, ServerError};
