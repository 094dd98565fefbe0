//! The input-injection port.
//!
//! Synthesizes host input events on behalf of the [`Dispatcher`].  Each
//! supported desktop backend provides an implementation in the
//! infrastructure layer; a dry-run injector that only logs stands in on
//! hosts without one.
//!
//! Calls are synchronous and may block for the duration of an animation
//! (moves and drags).  The session layer therefore runs dispatch on Tokio's
//! blocking pool so a slow injection never stalls the async runtime.
//!
//! [`Dispatcher`]: crate::application::Dispatcher

use std::time::Duration;

use thiserror::Error;
use zenflow_core::{KeyAction, MouseButton};

/// Error type for input injection operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InjectorError {
    /// The host input system rejected or failed the operation.
    #[error("platform error: {0}")]
    Platform(String),

    /// The backend cannot perform this kind of operation at all.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Host input injection.
///
/// Coordinates are absolute screen pixels; relative operations take signed
/// pixel deltas.  Key names and combinations are passed through verbatim
/// from the client (e.g. `"enter"`, `"ctrl+c"`, `"media_play_pause"`).
#[cfg_attr(test, mockall::automock)]
pub trait InputInjector: Send + Sync {
    /// Moves the pointer to `(x, y)`, animating over `duration`.
    fn move_to(&self, x: i32, y: i32, duration: Duration) -> Result<(), InjectorError>;

    /// Moves the pointer by `(dx, dy)` from its current position.
    fn move_relative(&self, dx: i32, dy: i32) -> Result<(), InjectorError>;

    /// Clicks `button` once at `(x, y)`.
    fn click(&self, x: i32, y: i32, button: MouseButton) -> Result<(), InjectorError>;

    /// Scrolls the wheel by `amount` notches at `(x, y)`; positive is up.
    fn scroll(&self, amount: i32, x: i32, y: i32) -> Result<(), InjectorError>;

    /// Drags with the left button held by `(dx, dy)`, animating over `duration`.
    fn drag_relative(&self, dx: i32, dy: i32, duration: Duration) -> Result<(), InjectorError>;

    /// Presses or releases a single named key.
    fn key_action(&self, key: &str, action: KeyAction) -> Result<(), InjectorError>;

    /// Types `text` as a sequence of key strokes.
    fn type_text(&self, text: &str) -> Result<(), InjectorError>;

    /// Sends a key combination or named media key.
    fn key_combo(&self, combination: &str) -> Result<(), InjectorError>;
}
