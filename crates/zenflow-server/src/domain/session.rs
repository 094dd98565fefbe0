//! Session identity and lifecycle states.
//!
//! ```text
//! Connecting ──► Active ──► Closing ──► Closed
//!      │                       ▲
//!      └───────────────────────┘   (handshake failure)
//! ```
//!
//! Every path to `Closed` goes through `Closing`; that is where the session
//! leaves the registry and the socket is released.

use std::fmt;
use std::net::SocketAddr;

/// Identifies a session by the remote peer address.
///
/// A live TCP connection has a unique `(ip, port)` pair, so the peer address
/// is enough to tell concurrent sessions apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(SocketAddr);

impl SessionId {
    pub fn new(peer: SocketAddr) -> Self {
        Self(peer)
    }

    pub fn peer(&self) -> SocketAddr {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<SocketAddr> for SessionId {
    fn from(peer: SocketAddr) -> Self {
        Self(peer)
    }
}

/// Lifecycle state of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// TCP accepted, WebSocket handshake not yet complete.
    Connecting,
    /// Handshake complete; frames are being read and answered.
    Active,
    /// Peer closed, transport failed, keepalive expired or shutdown requested.
    Closing,
    /// Socket released and session removed from the registry.
    Closed,
}

impl SessionState {
    /// Returns `true` if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Active)
                | (Self::Connecting, Self::Closing)
                | (Self::Active, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Closed
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(name)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
