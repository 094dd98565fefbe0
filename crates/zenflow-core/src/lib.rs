//! # zenflow-core
//!
//! Shared protocol library for Zenflow Remote: the typed command model, the
//! response model, and the JSON frame codec spoken between the mobile client
//! and the PC-side server.
//!
//! This crate has no dependencies on sockets, async runtimes, or OS input
//! APIs.  Everything here is pure data transformation, which keeps it easy to
//! test and to reuse from a client implementation.
//!
//! # Module overview
//!
//! - **`protocol`** – How messages travel over the wire.  One WebSocket text
//!   frame carries exactly one JSON document.  Inbound documents decode into a
//!   [`Command`]; outbound [`Response`]s encode back into JSON.
//!
//! - **`input`** – Typed, validated views of mouse and keyboard commands.  A
//!   [`Command`] is deliberately tolerant (unknown categories are preserved),
//!   while [`MouseCommand`] and [`KeyboardCommand`] are strict: they reject
//!   unknown actions and invalid buttons with a [`ValidationError`].

pub mod input;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `zenflow_core::Command` instead of `zenflow_core::protocol::command::Command`.
pub use input::{
    KeyAction, KeyboardCommand, MouseButton, MouseCommand, ScrollDirection, ValidationError,
};
pub use protocol::codec::{
    decode_command, decode_command_bytes, decode_response, encode_command, encode_response,
    DecodeError, EncodeError,
};
pub use protocol::command::{Category, Command};
pub use protocol::response::{Response, ResponseKind, Status};
