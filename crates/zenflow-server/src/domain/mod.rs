//! Domain layer for the Zenflow server.
//!
//! Pure types with no I/O: the server configuration and the lifecycle
//! states a client session moves through.  Everything here can be built
//! and inspected in a unit test without a runtime or a socket.

pub mod config;
pub mod session;

pub use config::{PresenceConfig, ServerConfig};
pub use session::{SessionId, SessionState};
